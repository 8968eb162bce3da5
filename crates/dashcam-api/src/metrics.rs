//! Prometheus metrics for the API server.

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "dashcam_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "dashcam_http_request_duration_seconds";

    // WebSocket metrics
    pub const WS_CONNECTIONS_TOTAL: &str = "dashcam_ws_connections_total";
    pub const WS_CONNECTIONS_ACTIVE: &str = "dashcam_ws_connections_active";
    pub const WS_MESSAGES_SENT: &str = "dashcam_ws_messages_sent_total";
    pub const WS_MESSAGES_RECEIVED: &str = "dashcam_ws_messages_received_total";

    // Processing metrics
    pub const FRAMES_PROCESSED_TOTAL: &str = "dashcam_frames_processed_total";
    pub const SCENES_CLOSED_TOTAL: &str = "dashcam_scenes_closed_total";
    pub const SESSIONS_COMPLETED_TOTAL: &str = "dashcam_sessions_completed_total";
    pub const FRAME_PROCESSING_SECONDS: &str = "dashcam_frame_processing_seconds";
}

/// Record WebSocket connection.
pub fn record_ws_connection() {
    counter!(names::WS_CONNECTIONS_TOTAL).increment(1);
}

/// Update active WebSocket connections gauge.
pub fn set_ws_active_connections(count: i64) {
    gauge!(names::WS_CONNECTIONS_ACTIVE).set(count as f64);
}

/// Record WebSocket message sent.
pub fn record_ws_message_sent(message_type: &str) {
    let labels = [("type", message_type.to_string())];
    counter!(names::WS_MESSAGES_SENT, &labels).increment(1);
}

/// Record WebSocket message received.
pub fn record_ws_message_received() {
    counter!(names::WS_MESSAGES_RECEIVED).increment(1);
}

/// Record one processed frame and its processing time.
pub fn record_frame_processed(elapsed: Duration) {
    counter!(names::FRAMES_PROCESSED_TOTAL).increment(1);
    histogram!(names::FRAME_PROCESSING_SECONDS).record(elapsed.as_secs_f64());
}

/// Record a closed scene.
pub fn record_scene_closed() {
    counter!(names::SCENES_CLOSED_TOTAL).increment(1);
}

/// Record how a session ended.
pub fn record_session_finished(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::SESSIONS_COMPLETED_TOTAL, &labels).increment(1);
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Metrics middleware for HTTP requests.
///
/// Labels use the matched route template, so client ids never become label
/// values.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let start = Instant::now();

    let response = next.run(request).await;

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}
