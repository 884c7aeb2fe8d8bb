use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use file_engine_core::AppError;
use futures::StreamExt;

use super::parse_file_id;
use crate::error::{with_timeout, ErrorResponse, HttpAppError};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/file-engine/files/{id}",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 400, description = "Malformed file ID", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 502, description = "Object store failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "download_file"))]
pub async fn download_file(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = parse_file_id(&id)?;

    let download = with_timeout(
        "download",
        state.timeouts().download,
        state.transfer.download(id),
    )
    .await?;

    tracing::debug!(
        file_id = %id,
        key = %download.file.object_key,
        "Proxying file from storage"
    );

    let body_stream = download
        .stream
        .map(|result| result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e))));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, download.file.content_type.as_str())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", download.file.name),
        )
        .body(Body::from_stream(body_stream))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            AppError::Internal(e.to_string())
        })?;

    Ok(response)
}
