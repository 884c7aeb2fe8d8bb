//! Collision-free object keys for presigned uploads.

use crate::constants::file_extension;
use chrono::Utc;
use rand::distr::Alphanumeric;
use rand::Rng;

const TOKEN_LENGTH: usize = 8;

/// Build `{stem}_{YYYYMMDDHHMMSS}_{token}{ext}` from an original filename.
///
/// The extension keeps its original case. The token is random, so two calls in the
/// same second still produce different keys.
pub fn generate_unique_object_name(original: &str) -> String {
    let extension = file_extension(original);
    let stem = &original[..original.len() - extension.len()];
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let token: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect();

    format!("{}_{}_{}{}", stem, timestamp, token, extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_object_name_shape() {
        let name = generate_unique_object_name("report.final.PDF");
        assert!(name.starts_with("report.final_"));
        assert!(name.ends_with(".PDF"));

        let middle = &name["report.final_".len()..name.len() - ".PDF".len()];
        let (timestamp, token) = middle.split_once('_').unwrap();
        assert_eq!(timestamp.len(), 14);
        assert!(timestamp.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_object_name_without_extension() {
        let name = generate_unique_object_name("LICENSE");
        assert!(name.starts_with("LICENSE_"));
        assert_eq!(name.len(), "LICENSE_".len() + 14 + 1 + TOKEN_LENGTH);
    }

    #[test]
    fn test_object_names_are_unique() {
        let names: HashSet<String> = (0..10_000)
            .map(|_| generate_unique_object_name("same.txt"))
            .collect();
        assert_eq!(names.len(), 10_000);
    }
}
