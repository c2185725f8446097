use axum::{
    extract::{MatchedPath, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, Span, field, info, info_span, warn};
use uuid::Uuid;

use super::{AppState, feeds::CacheStatus};

/// Response header reporting whether a feed was served from the cache.
pub const CACHE_STATUS_HEADER: &str = "x-cache";

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

/// Per-request span, HTTP metrics and the cache outcome of feed routes.
///
/// Runs inside the `/api` nest, so `route` is the matched pattern
/// (`/api/repo/{language}`) rather than the raw path.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let route = req.extensions().get::<MatchedPath>().map_or_else(
        || req.uri().path().to_string(),
        |matched| matched.as_str().to_string(),
    );

    let span = info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %method,
        route = %route,
        cache = field::Empty,
    );

    async move {
        let mut response = next.run(req).await;
        let status = response.status();

        let cache = response.extensions().get::<CacheStatus>().copied();
        if let Some(cache) = cache {
            Span::current().record("cache", cache.as_str());
            response.headers_mut().insert(
                CACHE_STATUS_HEADER,
                HeaderValue::from_static(cache.as_str()),
            );
        }

        let elapsed = start.elapsed();
        let labels = [
            ("method", method.to_string()),
            ("route", route),
            ("status", status.as_u16().to_string()),
            ("cache", cache.map_or("none", CacheStatus::as_str).to_string()),
        ];
        metrics::counter!("http_requests_total", &labels).increment(1);
        metrics::histogram!("http_request_duration_seconds", &labels)
            .record(elapsed.as_secs_f64());

        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        if status.is_server_error() {
            warn!(status = status.as_u16(), elapsed_ms, "Request failed");
        } else {
            info!(status = status.as_u16(), elapsed_ms, "Request finished");
        }

        response
    }
    .instrument(span)
    .await
}
