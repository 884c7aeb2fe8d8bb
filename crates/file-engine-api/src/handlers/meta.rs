use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use file_engine_core::{FileListPage, FileRecord};
use serde::Deserialize;
use utoipa::IntoParams;

use super::parse_file_id;
use crate::error::{with_timeout, ErrorResponse, HttpAppError};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/file-engine/files/{id}/meta",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File metadata", body = FileRecord),
        (status = 400, description = "Malformed file ID", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "get_file_meta"))]
pub async fn get_file_meta(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = parse_file_id(&id)?;
    let file = with_timeout("meta", state.timeouts().metadata, state.transfer.get_meta(id)).await?;
    Ok(Json(file))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    /// Container to list. Defaults to the configured one.
    #[serde(default)]
    pub bucket_id: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

#[utoipa::path(
    get,
    path = "/api/v1/file-engine/files",
    tag = "files",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of files, newest first", body = FileListPage),
        (status = 500, description = "Metadata store failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "list_files"))]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let page = with_timeout(
        "list",
        state.timeouts().metadata,
        state
            .transfer
            .get_list(query.bucket_id.as_deref(), query.page, query.page_size),
    )
    .await?;

    Ok(Json(page))
}
