use drive_webapi::middleware::allow_any_origin;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use tower::util::ServiceExt;

#[tokio::test]
async fn test_allow_any_origin_on_success_and_error() {
    let app = Router::new()
        .route("/", get(|| async { "hello" }))
        .route("/boom", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }))
        .layer(from_fn(allow_any_origin));

    for uri in ["/", "/boom", "/missing"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*",
            "missing header on {uri}"
        );
    }
}
