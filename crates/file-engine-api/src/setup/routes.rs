//! Route configuration and setup

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use file_engine_core::constants::MAX_FILE_SIZE;
use file_engine_core::Config;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::api_doc::ApiDoc;
use crate::constants::{API_V1_PREFIX, API_V2_PREFIX, OPENAPI_PATH};
use crate::handlers;
use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the largest file
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

/// Build the full application router
pub fn setup_routes(state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(&state.config)?;

    // Server-level concurrency limit to protect against resource exhaustion under extreme load
    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10_000)
        .max(1);

    let body_limit =
        usize::try_from(MAX_FILE_SIZE + MULTIPART_OVERHEAD).unwrap_or(usize::MAX);

    let app = Router::new()
        .merge(health_routes())
        .nest(API_V1_PREFIX, v1_routes())
        .nest(API_V2_PREFIX, v2_routes())
        .route(OPENAPI_PATH, get(|| async { Json(ApiDoc::openapi()) }))
        .merge(utoipa_rapidoc::RapiDoc::new(OPENAPI_PATH).path("/docs"))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/live", get(handlers::health::liveness_check))
        .route("/ready", get(handlers::health::readiness_check))
}

/// Streaming transfers through the service
fn v1_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/files",
            post(handlers::upload::upload_file)
                // Multipart extraction is capped at 2 MB by default
                .layer(DefaultBodyLimit::disable())
                .get(handlers::meta::list_files),
        )
        .route(
            "/files/{id}",
            get(handlers::download::download_file).delete(handlers::delete::delete_file),
        )
        .route("/files/{id}/meta", get(handlers::meta::get_file_meta))
}

/// Presigned URL issuance
fn v2_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/files", post(handlers::upload_url::generate_upload_url))
        .route("/files/{id}", get(handlers::download_url::generate_download_url))
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];

    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
