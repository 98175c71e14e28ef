use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::json;
use std::sync::Arc;

use crate::metrics;
use crate::services::AppState;

use templates::{render, MenuTemplate};

/// GET / - Landing menu
pub async fn index() -> Result<impl IntoResponse, (StatusCode, String)> {
    render(&MenuTemplate {})
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let backend = state.store.backend();

    let (store_health, healthy) = match tokio::time::timeout(
        std::time::Duration::from_millis(500),
        state.store.ping(),
    )
    .await
    {
        Ok(Ok(())) => (
            json!({ "status": "healthy", "backend": backend }),
            true,
        ),
        Ok(Err(e)) => (
            json!({
                "status": "unhealthy",
                "backend": backend,
                "error": format!("Session store error: {}", e),
            }),
            false,
        ),
        Err(_) => (
            json!({
                "status": "unhealthy",
                "backend": backend,
                "error": "Session store timeout after 500ms",
            }),
            false,
        ),
    };

    let (status_code, status) = if healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status_code,
        Json(json!({
            "status": status,
            "service": "quizdeck-api",
            "version": env!("CARGO_PKG_VERSION"),
            "dependencies": { "session_store": store_health }
        })),
    )
}

pub async fn metrics_handler() -> impl IntoResponse {
    match metrics::render_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {}", e),
        ),
    }
}

/// Metrics authentication middleware - protects /metrics endpoint with HTTP Basic Auth
pub async fn metrics_auth_middleware(
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let encoded = auth_header
        .strip_prefix("Basic ")
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let decoded = general_purpose::STANDARD
        .decode(encoded)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    let credentials = String::from_utf8(decoded).map_err(|_| StatusCode::UNAUTHORIZED)?;

    // Format: username:password
    let expected = std::env::var("METRICS_AUTH").unwrap_or_else(|_| "admin:changeme".to_string());

    if credentials != expected {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}

pub(crate) fn internal_error(e: anyhow::Error) -> (StatusCode, String) {
    tracing::error!("Request failed: {:#}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

pub mod flashcard;
pub mod puzzle;
pub mod templates;
