//! OpenAPI documentation, served at `/api/openapi.json` and rendered by RapiDoc at `/docs`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use file_engine_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "File Engine API",
        version = "0.1.0",
        description = "File transfer gateway. v1 streams bytes through the service; v2 issues presigned URLs for direct object store access."
    ),
    paths(
        handlers::upload::upload_file,
        handlers::meta::list_files,
        handlers::download::download_file,
        handlers::meta::get_file_meta,
        handlers::delete::delete_file,
        handlers::upload_url::generate_upload_url,
        handlers::download_url::generate_download_url,
        handlers::health::health_check,
    ),
    components(schemas(
        models::FileRecord,
        models::FileStatus,
        models::FileListPage,
        models::UploadUrlRequest,
        models::UploadUrl,
        models::DownloadUrl,
        handlers::health::HealthCheckResponse,
        error::ErrorResponse,
    )),
    tags(
        (name = "files", description = "Streaming upload, download and metadata"),
        (name = "presigned", description = "Presigned URLs for direct object store transfers"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_both_api_versions() {
        let spec = ApiDoc::openapi();
        let paths = &spec.paths.paths;
        assert!(paths.contains_key("/api/v1/file-engine/files"));
        assert!(paths.contains_key("/api/v1/file-engine/files/{id}/meta"));
        assert!(paths.contains_key("/api/v2/file-engine/files/{id}"));
    }
}
