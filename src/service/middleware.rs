//! Request logging middleware.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info, info_span, Instrument};

/// Log each request with a trace id, status and latency.
///
/// The trace id is taken from `X-Cloud-Trace-Context` when present.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let trace_id = request
        .headers()
        .get("X-Cloud-Trace-Context")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.split('/').next().unwrap_or(s).to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let span = info_span!("request", trace_id = %trace_id, method = %method, path = %path);
    let response = next.run(request).instrument(span).await;

    info!(
        target: "restock_sentinel::access",
        trace_id = %trace_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "request completed"
    );

    response
}

/// Collapse per-source paths to keep log cardinality bounded.
fn normalize_path(path: &str) -> String {
    match path.strip_prefix("/api/stock/") {
        Some(rest) if !rest.is_empty() => "/api/stock/:source".to_string(),
        _ => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_collapses_source() {
        assert_eq!(normalize_path("/api/stock/steeping-room"), "/api/stock/:source");
    }

    #[test]
    fn test_normalize_path_preserves_regular_path() {
        assert_eq!(normalize_path("/api/stock"), "/api/stock");
        assert_eq!(normalize_path("/health"), "/health");
    }
}
