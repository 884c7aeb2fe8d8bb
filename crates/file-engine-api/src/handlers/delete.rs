use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use super::parse_file_id;
use crate::error::{with_timeout, ErrorResponse, HttpAppError};
use crate::state::AppState;

#[utoipa::path(
    delete,
    path = "/api/v1/file-engine/files/{id}",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 204, description = "File deleted"),
        (status = 400, description = "Malformed file ID", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 502, description = "Object store failure, metadata kept", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "delete_file"))]
pub async fn delete_file(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = parse_file_id(&id)?;
    with_timeout("delete", state.timeouts().delete, state.transfer.delete(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
