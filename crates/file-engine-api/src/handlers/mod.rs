pub mod delete;
pub mod download;
pub mod download_url;
pub mod health;
pub mod meta;
pub mod upload;
pub mod upload_url;

use file_engine_core::AppError;
use uuid::Uuid;

/// Parse a path id so a malformed one renders as a JSON 400 like every other error.
pub(crate) fn parse_file_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidInput(format!("Invalid file id: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_file_id(&id.to_string()).unwrap(), id);
        assert!(matches!(
            parse_file_id("not-a-uuid"),
            Err(AppError::InvalidInput(_))
        ));
    }
}
