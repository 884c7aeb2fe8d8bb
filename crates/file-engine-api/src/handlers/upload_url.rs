use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use file_engine_core::{UploadUrl, UploadUrlRequest};
use validator::Validate;

use crate::error::{with_timeout, ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

/// Reserve a file and return a presigned PUT URL for it
#[utoipa::path(
    post,
    path = "/api/v2/file-engine/files",
    tag = "presigned",
    request_body = UploadUrlRequest,
    responses(
        (status = 200, description = "Presigned upload URL", body = UploadUrl),
        (status = 400, description = "Invalid file name or size", body = ErrorResponse),
        (status = 409, description = "A file with this name already exists", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 502, description = "Object store failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(operation = "generate_upload_url", file_name = %request.filename, size = request.size)
)]
pub async fn generate_upload_url(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<UploadUrlRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;

    let upload_url = with_timeout(
        "upload_url",
        state.timeouts().presign,
        state.transfer.generate_upload_url(
            &request.filename,
            &request.content_type,
            request.size,
        ),
    )
    .await?;

    Ok(Json(upload_url))
}
