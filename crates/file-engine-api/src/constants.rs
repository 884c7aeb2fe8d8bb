//! Route prefixes
//!
//! v1 moves bytes through the service. v2 hands out presigned URLs so clients talk to
//! the object store directly.

pub const API_V1_PREFIX: &str = "/api/v1/file-engine";
pub const API_V2_PREFIX: &str = "/api/v2/file-engine";

/// Served OpenAPI document
pub const OPENAPI_PATH: &str = "/api/openapi.json";
