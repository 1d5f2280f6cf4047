use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Records a structured event for every response in the 4xx/5xx range.
pub async fn log_error_responses(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let uri = req.uri().to_string();
    let start = Instant::now();

    let response = next.run(req).await;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        let latency_ms = start.elapsed().as_millis() as u64;
        if status.is_server_error() {
            tracing::error!(
                status = status.as_u16(),
                method,
                uri,
                latency_ms,
                "Request completed with error status"
            );
        } else {
            tracing::warn!(
                status = status.as_u16(),
                method,
                uri,
                latency_ms,
                "Request completed with error status"
            );
        }
    }

    response
}
