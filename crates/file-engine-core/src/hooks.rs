//! Hooks that let deployments plug policy into the transfer flow
//!
//! The core ships only permissive defaults. A deployment that needs authorization
//! implements [`PermissionHook`] and hands it to the transfer service at construction.

use crate::error::AppError;
use async_trait::async_trait;
use uuid::Uuid;

/// Authorization check run before a download URL is minted.
///
/// Return `AppError::PermissionDenied` to refuse.
#[async_trait]
pub trait PermissionHook: Send + Sync {
    async fn check_download(&self, file_id: Uuid) -> Result<(), AppError>;
}

/// No-op implementation used when no authorization layer is configured
pub struct AllowAllPermissions;

#[async_trait]
impl PermissionHook for AllowAllPermissions {
    async fn check_download(&self, _file_id: Uuid) -> Result<(), AppError> {
        Ok(())
    }
}
