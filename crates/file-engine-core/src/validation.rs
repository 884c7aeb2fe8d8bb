//! Filename, size and extension checks applied before any byte reaches storage.
//!
//! All checks are pure. Callers that need every check run them through
//! [`validate_upload`] so the first failing check decides the reported error.

use crate::constants::{
    file_extension, ALLOWED_EXTENSIONS, FORBIDDEN_FILENAME_CHARS, MAX_CONTENT_TYPE_LENGTH,
    MAX_FILENAME_LENGTH, MAX_FILE_SIZE,
};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File name {0} is invalid")]
    InvalidFilename(String),

    #[error("File size {size} exceeds maximum allowed size {max}")]
    SizeExceeded { size: u64, max: u64 },

    #[error("File extension {extension} is not allowed")]
    ExtensionNotAllowed { extension: String },

    #[error("Content type is invalid or longer than {max} bytes")]
    InvalidContentType { max: usize },
}

pub fn validate_filename(name: &str) -> Result<(), ValidationError> {
    if name.is_empty()
        || name.len() > MAX_FILENAME_LENGTH
        || name.contains(&FORBIDDEN_FILENAME_CHARS[..])
        || name.chars().any(char::is_control)
    {
        return Err(ValidationError::InvalidFilename(name.to_string()));
    }
    Ok(())
}

pub fn validate_size(size: u64) -> Result<(), ValidationError> {
    if size > MAX_FILE_SIZE {
        return Err(ValidationError::SizeExceeded {
            size,
            max: MAX_FILE_SIZE,
        });
    }
    Ok(())
}

/// An empty content type is accepted and later replaced by the default.
pub fn validate_content_type(content_type: &str) -> Result<(), ValidationError> {
    let trimmed = content_type.trim();
    if trimmed.len() > MAX_CONTENT_TYPE_LENGTH || trimmed.chars().any(char::is_control) {
        return Err(ValidationError::InvalidContentType {
            max: MAX_CONTENT_TYPE_LENGTH,
        });
    }
    Ok(())
}

/// Check the lower-cased extension (with its leading dot) against the allow-list.
pub fn validate_extension(filename: &str) -> Result<(), ValidationError> {
    let extension = file_extension(filename).to_lowercase();
    if ALLOWED_EXTENSIONS
        .iter()
        .any(|(allowed, _)| *allowed == extension)
    {
        Ok(())
    } else {
        Err(ValidationError::ExtensionNotAllowed { extension })
    }
}

/// Full check for direct uploads: filename, then size, then extension.
pub fn validate_upload(name: &str, size: u64) -> Result<(), ValidationError> {
    validate_filename(name)?;
    validate_size(size)?;
    validate_extension(name)
}

/// Check for presigned upload requests. The extension check is opt-in on this path.
pub fn validate_upload_request(
    name: &str,
    size: u64,
    check_extension: bool,
) -> Result<(), ValidationError> {
    validate_filename(name)?;
    validate_size(size)?;
    if check_extension {
        validate_extension(name)?;
    }
    Ok(())
}
