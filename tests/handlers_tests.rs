mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use std::sync::Arc;
use tower::util::ServiceExt;

use drive_webapi::config::Config;
use drive_webapi::models::{FileStatus, UploadResponse};
use drive_webapi::server::build_router;
use drive_webapi::state::AppState;

use common::{content_type, multipart_body};

fn app(files_dir: &std::path::Path) -> Router {
    let config = Config {
        files_dir: files_dir.to_path_buf(),
        file_owner: "marcoskloss".to_string(),
        ..Config::default()
    };
    build_router(Arc::new(AppState::from_config(&config)), &config)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn assert_cors(response: &axum::response::Response) {
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_unmapped_method_chooses_default_route() {
    let temp_dir = tempfile::tempdir().unwrap();

    let response = app(temp_dir.path())
        .oneshot(Request::builder().method(Method::PUT).uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"hello world");
}

#[tokio::test]
async fn test_options_returns_no_content() {
    let temp_dir = tempfile::tempdir().unwrap();

    for uri in ["/", "/anything/else"] {
        let response = app(temp_dir.path())
            .oneshot(Request::builder().method(Method::OPTIONS).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_cors(&response);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }
}

#[tokio::test]
async fn test_get_lists_downloaded_files() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(temp_dir.path().join("file.txt"), vec![0u8; 644_950]).unwrap();
    std::fs::create_dir(temp_dir.path().join("nested")).unwrap();

    let response = app(temp_dir.path())
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let files: Vec<FileStatus> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].size, "645 kB");
    assert_eq!(files[0].owner, "marcoskloss");
    assert_eq!(files[0].file, "file.txt");
    assert!(files[0].last_modified.ends_with('Z'));
    assert!(chrono::DateTime::parse_from_rfc3339(&files[0].last_modified).is_ok());
}

#[tokio::test]
async fn test_get_on_unreadable_directory_is_a_server_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let missing = temp_dir.path().join("does-not-exist");

    let response = app(&missing)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(&response);
    assert_eq!(body_json(response).await["error"], "listing_error");
}

#[tokio::test]
async fn test_post_uploads_and_acknowledges() {
    let temp_dir = tempfile::tempdir().unwrap();
    let body = multipart_body(&[("file.txt", &b"some file bytes o/"[..])]);

    let response = app(temp_dir.path())
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/?sessionId=10")
                .header(header::CONTENT_TYPE, content_type())
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(
        std::str::from_utf8(&bytes).unwrap(),
        r#"{"result":"Files uploaded with success!"}"#
    );
    let parsed: UploadResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(parsed.result, "Files uploaded with success!");
    assert_eq!(
        std::fs::read(temp_dir.path().join("file.txt")).unwrap(),
        b"some file bytes o/"
    );
}

#[tokio::test]
async fn test_post_without_session_id_is_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();
    let body = multipart_body(&[("file.txt", &b"data"[..])]);

    let response = app(temp_dir.path())
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/")
                .header(header::CONTENT_TYPE, content_type())
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_cors(&response);
    assert_eq!(body_json(response).await["error"], "missing_session_id");
    assert!(!temp_dir.path().join("file.txt").exists());
}

#[tokio::test]
async fn test_post_with_malformed_multipart_is_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();

    let response = app(temp_dir.path())
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/?sessionId=10")
                .header(header::CONTENT_TYPE, "multipart/form-data")
                .body(Body::from("garbage"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_cors(&response);
    assert_eq!(body_json(response).await["error"], "decode_error");
}

#[tokio::test]
async fn test_uploaded_name_is_listed_verbatim() {
    let temp_dir = tempfile::tempdir().unwrap();
    let router = app(temp_dir.path());
    let body = multipart_body(&[("photo (1).jpg", &b"jpeg bytes"[..]), ("../escape.txt", &b"nope"[..])]);

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/?sessionId=10")
                .header(header::CONTENT_TYPE, content_type())
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // traversal is cut down to the last component inside the directory
    assert!(temp_dir.path().join("escape.txt").exists());

    let response = router
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let mut names: Vec<String> = serde_json::from_slice::<Vec<FileStatus>>(&bytes)
        .unwrap()
        .into_iter()
        .map(|f| f.file)
        .collect();
    names.sort();
    assert_eq!(names, ["escape.txt", "photo (1).jpg"]);
}
