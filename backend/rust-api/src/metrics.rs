use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Session store metrics (memory or Redis)
    pub static ref SESSION_STORE_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "session_store_operations_total",
        "Total number of session store operations",
        &["backend", "operation", "status"]
    )
    .unwrap();

    pub static ref SESSION_STORE_OPERATION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "session_store_operation_duration_seconds",
        "Session store operation duration in seconds",
        &["backend", "operation"],
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1]
    )
    .unwrap();

    // Business Metrics
    pub static ref SESSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "visitor_sessions_total",
        "Visitor sessions by how they were obtained",
        &["status"]
    )
    .unwrap();

    pub static ref ANSWERS_SUBMITTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "answers_submitted_total",
        "Total number of puzzle answers submitted",
        &["correct", "mode"]
    )
    .unwrap();

    pub static ref REVIEW_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "review_requests_total",
        "Requests to enter review mode",
        &["status"]
    )
    .unwrap();

    pub static ref DECK_RESTARTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "deck_restarts_total",
        "Puzzle decks reshuffled from scratch",
        &["reason"]
    )
    .unwrap();

    pub static ref FLASHCARD_ACTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "flashcard_actions_total",
        "Flashcard paging actions applied",
        &["action"]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

/// Helper: track session store operation with metrics
pub async fn track_store_operation<F, T>(
    backend: &str,
    operation: &str,
    future: F,
) -> Result<T, anyhow::Error>
where
    F: std::future::Future<Output = Result<T, anyhow::Error>>,
{
    let start = std::time::Instant::now();
    let result = future.await;
    let duration = start.elapsed().as_secs_f64();

    let status = if result.is_ok() { "success" } else { "error" };

    SESSION_STORE_OPERATIONS_TOTAL
        .with_label_values(&[backend, operation, status])
        .inc();

    SESSION_STORE_OPERATION_DURATION_SECONDS
        .with_label_values(&[backend, operation])
        .observe(duration);

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        // Just verify that all metrics are properly registered
        let _ = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/health", "200"])
            .get();
        let _ = ANSWERS_SUBMITTED_TOTAL
            .with_label_values(&["true", "normal"])
            .get();
    }

    #[test]
    fn test_render_metrics() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let result = render_metrics();
        assert!(result.is_ok());
        let output = result.unwrap();
        assert!(output.contains("http_requests_total"));
    }

    #[tokio::test]
    async fn test_track_store_operation_passes_result_through() {
        let ok = track_store_operation("memory", "get", async { Ok::<_, anyhow::Error>(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err = track_store_operation("memory", "get", async {
            Err::<u8, _>(anyhow::anyhow!("boom"))
        })
        .await;
        assert!(err.is_err());

        let failures = SESSION_STORE_OPERATIONS_TOTAL
            .with_label_values(&["memory", "get", "error"])
            .get();
        assert!(failures >= 1);
    }
}
