//! Presigned URL API integration tests.
//!
//! Run with: `cargo test -p file-engine-api --test presigned_test`

mod helpers;

use axum::http::StatusCode;
use file_engine_core::FileStatus;
use file_engine_services::test_helpers::MockFileRepository;
use helpers::{setup_test_app, v2_path, CONTAINER};
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
async fn test_upload_url_reserves_pending_record() {
    let app = setup_test_app();

    let response = app
        .client()
        .post(&v2_path("/files"))
        .json(&json!({
            "filename": "photo.jpg",
            "content_type": "image/jpeg",
            "size": 1024
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["expires_in"], 900);

    let url = body["url"].as_str().unwrap();
    let prefix = format!("https://mock-storage.local/{}/photo_", CONTAINER);
    assert!(url.starts_with(&prefix), "{}", url);
    assert!(url.contains(".jpg?X-Amz-Expires=900"), "{}", url);
    // Only the path separator is decoded; the signature keeps its encoding
    assert!(url.ends_with("&X-Amz-Signature=sig%2Fpart"), "{}", url);

    let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();
    let record = app.metadata.get(id).expect("record created");
    assert_eq!(record.status, FileStatus::Pending);
    assert_eq!(record.name, "photo.jpg");
    assert_eq!(record.size, 1024);
    assert_ne!(record.object_key, "photo.jpg");
    assert_eq!(app.storage.upload_calls(), 0);
}

#[tokio::test]
async fn test_upload_url_rejects_bad_requests() {
    let app = setup_test_app();
    let client = app.client();

    let empty_name = client
        .post(&v2_path("/files"))
        .json(&json!({ "filename": "", "size": 10 }))
        .await;
    assert_eq!(empty_name.status_code(), StatusCode::BAD_REQUEST);

    let wrong_type = client
        .post(&v2_path("/files"))
        .json(&json!({ "filename": "a.txt", "size": "big" }))
        .await;
    assert_eq!(wrong_type.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = wrong_type.json();
    assert_eq!(body["code"], "INVALID_INPUT");

    let too_large = client
        .post(&v2_path("/files"))
        .json(&json!({ "filename": "a.iso", "size": 6_000_000_000u64 }))
        .await;
    assert_eq!(too_large.status_code(), StatusCode::PAYLOAD_TOO_LARGE);

    let control_char = client
        .post(&v2_path("/files"))
        .json(&json!({ "filename": "two\nlines.txt", "size": 10 }))
        .await;
    assert_eq!(control_char.status_code(), StatusCode::BAD_REQUEST);

    let long_type = client
        .post(&v2_path("/files"))
        .json(&json!({ "filename": "a.txt", "content_type": "x".repeat(300), "size": 10 }))
        .await;
    assert_eq!(long_type.status_code(), StatusCode::BAD_REQUEST);

    assert_eq!(app.metadata.record_count(), 0);
}

#[tokio::test]
async fn test_upload_url_skips_extension_check_by_default() {
    let app = setup_test_app();

    let response = app
        .client()
        .post(&v2_path("/files"))
        .json(&json!({ "filename": "image.iso", "size": 10 }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_upload_url_conflicts_on_existing_name() {
    let app = setup_test_app();
    app.metadata
        .insert(MockFileRepository::record("taken.txt", CONTAINER));

    let response = app
        .client()
        .post(&v2_path("/files"))
        .json(&json!({ "filename": "taken.txt", "size": 10 }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_download_url_for_existing_file() {
    let app = setup_test_app();
    let uploaded: Value = app.upload("report.txt", b"hello").await.json();
    let id = uploaded["id"].as_str().unwrap();

    let response = app
        .client()
        .get(&v2_path(&format!("/files/{}", id)))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(
        body["url"],
        format!(
            "https://mock-storage.local/{}/report.txt?X-Amz-Expires=3600",
            CONTAINER
        )
    );
    assert_eq!(body["expires_in"], 3600);
    assert_eq!(body["direct_download"], true);
    assert_eq!(body["file_info"]["id"], uploaded["id"]);
}

#[tokio::test]
async fn test_download_url_requires_object() {
    let app = setup_test_app();
    let record = MockFileRepository::record("missing.txt", CONTAINER);
    app.metadata.insert(record.clone());

    let response = app
        .client()
        .get(&v2_path(&format!("/files/{}", record.id)))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let malformed = app.client().get(&v2_path("/files/xyz")).await;
    assert_eq!(malformed.status_code(), StatusCode::BAD_REQUEST);
}
