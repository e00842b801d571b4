use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::debug;

/// Outermost layer: stamps `Server-Timing: total;dur=<ms>` on every
/// response and emits one debug event per request.
pub async fn timing_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let start = Instant::now();
    let mut response = next.run(req).await;
    let elapsed = start.elapsed();

    let server_timing = format!("total;dur={:.3}", elapsed.as_secs_f64() * 1000.0);
    if let Ok(val) = server_timing.parse() {
        response.headers_mut().insert("Server-Timing", val);
    }

    // Static assets are noise at debug level.
    if !path.starts_with("/static/") {
        debug!(
            %method,
            path = %path,
            status = response.status().as_u16(),
            elapsed_us = elapsed.as_micros() as u64,
            "request served"
        );
    }

    response
}
