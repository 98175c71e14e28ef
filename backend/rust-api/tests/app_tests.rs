use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use base64::{engine::general_purpose, Engine as _};
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_pages_return_200() {
    let mut app = common::create_test_app();

    for path in ["/", "/puzzle", "/flashcard"] {
        let response = app.get(path).await;
        assert_eq!(response.status, StatusCode::OK, "{} should return 200", path);
        assert!(response
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/html")));
    }
}

#[tokio::test]
async fn test_responses_carry_trace_id_and_csp() {
    let mut app = common::create_test_app();
    let response = app.get("/").await;

    assert!(response.headers.get("x-trace-id").is_some());
    assert!(response
        .headers
        .get(header::CONTENT_SECURITY_POLICY)
        .is_some());
}

#[tokio::test]
async fn test_incoming_trace_id_is_echoed() {
    let app = common::create_test_app();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/")
                .header("x-trace-id", "trace-abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-trace-id").unwrap(),
        "trace-abc-123"
    );
}

#[tokio::test]
async fn test_health_reports_memory_store() {
    let mut app = common::create_test_app();
    let response = app.get("/health").await;

    assert_eq!(response.status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["dependencies"]["session_store"]["backend"], "memory");
}

#[tokio::test]
async fn test_metrics_requires_basic_auth() {
    let app = common::create_test_app();

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let expected = std::env::var("METRICS_AUTH").unwrap_or_else(|_| "admin:changeme".to_string());
    let credentials = general_purpose::STANDARD.encode(expected);
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .header(header::AUTHORIZATION, format!("Basic {}", credentials))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_tampered_cookie_gets_a_fresh_session() {
    let mut app = common::create_test_app();
    app.submit("/flashcard", "next=1").await;
    assert_eq!(app.session().await.flashcards.unwrap().index, 1);

    // Forge a cookie the server never signed.
    app.cookie = Some("quiz_session=not-a-signed-value".to_string());
    let response = app.get("/flashcard").await;
    assert!(response.body.contains("Card 1 of"));
    assert_eq!(app.session().await.flashcards.unwrap().index, 0);
}

#[tokio::test]
async fn test_visitors_do_not_share_progress() {
    let mut first = common::create_test_app();
    let mut second = first.new_visitor();

    first.submit("/flashcard", "next=1").await;
    first.submit("/flashcard", "next=1").await;

    let response = second.get("/flashcard").await;
    assert!(response.body.contains("Card 1 of"));
    assert_eq!(first.session().await.flashcards.unwrap().index, 2);
    assert_eq!(first.store.len().await, 2);
}
