use crate::api::handlers::{fleet, health, site, stream};
use crate::api::AppState;
use axum::{
    extract::{MatchedPath, Request},
    response::Response,
    routing::get,
    Router,
};
use std::time::Duration;
use tower_http::{classify::ServerErrorsFailureClass, cors::CorsLayer, trace::TraceLayer};
use tracing::{info_span, Span};

pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(health::health));

    let api_routes = Router::new()
        .route("/sse", get(stream::sse_handler))
        .route("/fleet", get(fleet::get_snapshot))
        .route("/site/all", get(site::get_today))
        .route("/site/{site}/{period}", get(site::get_site_period));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(log_response)
                .on_failure(log_failure),
        )
}

/// Span keyed by the route template, so `/site/{site}/{period}` groups
/// every site together, with the concrete path kept alongside.
fn request_span(request: &Request) -> Span {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(MatchedPath::as_str)
        .unwrap_or("unmatched");

    info_span!(
        "http_request",
        method = %request.method(),
        route,
        path = %request.uri().path(),
    )
}

fn log_response(response: &Response, latency: Duration, _span: &Span) {
    let status = response.status().as_u16();
    let latency_ms = latency.as_millis() as u64;

    if response.status().is_server_error() {
        tracing::warn!(status, latency_ms, "request answered with server error");
    } else if response.status().is_client_error() {
        tracing::debug!(status, latency_ms, "request rejected");
    } else {
        tracing::info!(status, latency_ms, "request completed");
    }
}

fn log_failure(class: ServerErrorsFailureClass, latency: Duration, _span: &Span) {
    tracing::error!(
        failure = %class,
        latency_ms = latency.as_millis() as u64,
        "request failed"
    );
}

