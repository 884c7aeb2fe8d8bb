//! Shared container and key validation for storage backends.
//!
//! Container names follow the S3 bucket naming rules so the same name works on every
//! backend: 3-63 characters of lowercase letters, digits, `-` and `.`, starting and ending
//! with a letter or digit.

use crate::traits::{StorageError, StorageResult};

pub fn validate_container(container: &str) -> StorageResult<()> {
    let len = container.len();
    if !(3..=63).contains(&len) {
        return Err(StorageError::InvalidKey(format!(
            "Container name must be 3-63 characters: {}",
            container
        )));
    }

    let valid_chars = container
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.');
    let valid_edges = container
        .chars()
        .next()
        .zip(container.chars().last())
        .map(|(first, last)| first.is_ascii_alphanumeric() && last.is_ascii_alphanumeric())
        .unwrap_or(false);

    if !valid_chars || !valid_edges || container.contains("..") {
        return Err(StorageError::InvalidKey(format!(
            "Invalid container name: {}",
            container
        )));
    }

    Ok(())
}

/// Reject keys that could escape the container.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }

    if key.starts_with('/')
        || key.contains('\\')
        || key.contains('\0')
        || key.split('/').any(|segment| segment == ".." || segment == ".")
    {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }

    Ok(())
}

pub fn validate(container: &str, key: &str) -> StorageResult<()> {
    validate_container(container)?;
    validate_key(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_names() {
        assert!(validate_container("file-engine").is_ok());
        assert!(validate_container("logs.2024").is_ok());
        assert!(validate_container("ab").is_err());
        assert!(validate_container("Uppercase").is_err());
        assert!(validate_container("-leading").is_err());
        assert!(validate_container("trailing.").is_err());
        assert!(validate_container("a..b").is_err());
        assert!(validate_container(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_keys() {
        assert!(validate_key("report.pdf").is_ok());
        assert!(validate_key("nested/dir/report.pdf").is_ok());
        assert!(validate_key("file..name.txt").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("a/../../b").is_err());
        assert!(validate_key("a\\b").is_err());
    }
}
