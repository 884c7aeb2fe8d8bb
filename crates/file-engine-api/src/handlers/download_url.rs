use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use file_engine_core::DownloadUrl;

use super::parse_file_id;
use crate::error::{with_timeout, ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Presigned GET URL for an existing file
#[utoipa::path(
    get,
    path = "/api/v2/file-engine/files/{id}",
    tag = "presigned",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "Presigned download URL", body = DownloadUrl),
        (status = 400, description = "Malformed file ID", body = ErrorResponse),
        (status = 403, description = "Download not permitted", body = ErrorResponse),
        (status = 404, description = "File or object not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "generate_download_url"))]
pub async fn generate_download_url(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = parse_file_id(&id)?;

    let download_url = with_timeout(
        "download_url",
        state.timeouts().presign,
        state.transfer.generate_download_url(id),
    )
    .await?;

    Ok(Json(download_url))
}
