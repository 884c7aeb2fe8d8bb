use std::io;
use std::sync::Arc;

use axum::{
    extract::{multipart::Field, Multipart, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use file_engine_core::{AppError, FileRecord};
use file_engine_services::ByteReader;
use futures::SinkExt;
use serde::Deserialize;
use tokio_util::io::StreamReader;
use utoipa::IntoParams;

use crate::error::{with_timeout, ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Chunks buffered between the multipart body and the object store writer
const CHANNEL_DEPTH: usize = 8;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct UploadQuery {
    /// Declared size in bytes. Without it the upload is capped while streaming.
    pub size: Option<u64>,
}

#[utoipa::path(
    post,
    path = "/api/v1/file-engine/files",
    tag = "files",
    params(UploadQuery),
    request_body(content_type = "multipart/form-data", description = "Multipart form with a `file` field"),
    responses(
        (status = 201, description = "File uploaded", body = FileRecord),
        (status = 400, description = "Invalid file name or request", body = ErrorResponse),
        (status = 409, description = "A file with this name already exists", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 502, description = "Object store failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_file", declared_size = ?query.size))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let record = stream_field(&state, field, query.size).await?;
        return Ok((StatusCode::CREATED, Json(record)));
    }

    Err(AppError::InvalidInput(
        "No file provided; send a multipart field named 'file'".to_string(),
    )
    .into())
}

/// Feed one multipart field into the transfer service without buffering it.
async fn stream_field(
    state: &AppState,
    mut field: Field<'_>,
    size: Option<u64>,
) -> Result<FileRecord, AppError> {
    let name = field
        .file_name()
        .map(str::to_string)
        .ok_or_else(|| AppError::InvalidInput("The file field has no file name".to_string()))?;
    let content_type = field.content_type().map(str::to_string).unwrap_or_default();

    let (mut tx, rx) = futures::channel::mpsc::channel::<Result<Bytes, io::Error>>(CHANNEL_DEPTH);
    let reader: ByteReader = Box::pin(StreamReader::new(rx));

    let pump = async move {
        loop {
            match field.chunk().await {
                Ok(Some(chunk)) => {
                    // Receiver gone: the upload already finished or failed
                    if tx.send(Ok(chunk)).await.is_err() {
                        return Ok(());
                    }
                }
                Ok(None) => return Ok(()),
                Err(e) => {
                    let _ = tx.send(Err(io::Error::other(e.to_string()))).await;
                    return Err(AppError::InvalidInput(format!(
                        "Failed to read file data: {}",
                        e
                    )));
                }
            }
        }
    };

    let upload = with_timeout(
        "upload",
        state.timeouts().upload,
        state.transfer.upload(reader, &name, size, &content_type),
    );

    let (pumped, uploaded): (Result<(), AppError>, Result<FileRecord, AppError>) =
        tokio::join!(pump, upload);

    // A broken request body explains the upload failure better than the reader error does
    pumped?;
    uploaded
}
