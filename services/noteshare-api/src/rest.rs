use crate::{
    handlers::{create_note, get_note},
    state::AppState,
};
use axum::{
    extract::Request,
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{
    classify::ServerErrorsFailureClass, limit::RequestBodyLimitLayer, trace::TraceLayer,
};
use tracing::{info_span, Span};
use uuid::Uuid;

/// Builds the Axum router hosting the note API.
pub fn build_router(state: AppState) -> Router {
    // Transport-level cap sits above the payload limit to leave room for
    // base64 expansion (4/3) and the JSON envelope; the exact limit is
    // enforced against decoded bytes in the write handler.
    let body_cap = state.config.limits.max_payload_bytes * 2;

    Router::new()
        // Health check (no rate limiting)
        .route("/health", get(health_check))
        // Note operations
        .route("/api/note", post(create_note))
        .route("/api/note/:id", get(get_note))
        // Add state
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(body_cap))
        // Add logging layer
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request| {
                    let request_id = Uuid::new_v4();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                        version = ?request.version(),
                    )
                })
                .on_request(|_request: &Request, _span: &Span| {
                    tracing::debug!("started processing request");
                })
                .on_response(|response: &Response, latency: std::time::Duration, _span: &Span| {
                    let status = response.status();
                    let latency_ms = latency.as_millis();

                    if status.is_server_error() {
                        tracing::error!(status = %status, latency_ms = latency_ms, "request failed with server error");
                    } else if status.is_client_error() {
                        tracing::warn!(status = %status, latency_ms = latency_ms, "request failed with client error");
                    } else {
                        tracing::info!(status = %status, latency_ms = latency_ms, "request completed");
                    }
                })
                .on_failure(|failure_class: ServerErrorsFailureClass, latency: std::time::Duration, _span: &Span| {
                    tracing::error!(failure_class = ?failure_class, latency_ms = latency.as_millis(), "request failed");
                }),
        )
}

async fn health_check() -> &'static str {
    "ok"
}
