use axum::{
    extract::{OriginalUri, Path, State},
    http::{Uri, header},
    response::{IntoResponse, Response},
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::services::AggregationReport;

use super::{ApiError, AppState, validation::validate_language};

/// Routes kept from the first version of the service, each pinned to a language.
pub const LEGACY_LANGUAGE_ROUTES: [(&str, &str); 5] = [
    ("/ts-repo", "typescript"),
    ("/js-repo", "javascript"),
    ("/python-repo", "python"),
    ("/c-repo", "C"),
    ("/go-repo", "go"),
];

/// Cache key for a request: path plus query string, verbatim.
fn cache_key(uri: &Uri) -> &str {
    uri.path_and_query()
        .map_or_else(|| uri.path(), |pq| pq.as_str())
}

/// Whether a feed response came out of the cache. Attached to the response
/// extensions for the request middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
        }
    }
}

fn json_response(body: String, cache: CacheStatus) -> Response {
    let mut response = ([(header::CONTENT_TYPE, "application/json")], body).into_response();
    response.extensions_mut().insert(cache);
    response
}

/// Serves `key` from the cache, or runs `produce` and caches its output.
///
/// Nothing is written when `produce` fails. Concurrent misses on the same key
/// each run `produce`.
async fn serve_cached<F, Fut>(
    state: &AppState,
    endpoint: &'static str,
    key: &str,
    ttl: Duration,
    produce: F,
) -> Result<Response, ApiError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<String, ApiError>>,
{
    if let Some(body) = state.cache().get(key).await? {
        metrics::counter!("cache_hits_total", "endpoint" => endpoint).increment(1);
        return Ok(json_response(body, CacheStatus::Hit));
    }

    metrics::counter!("cache_misses_total", "endpoint" => endpoint).increment(1);

    let body = produce().await?;
    state.cache().set(key, &body, ttl).await?;

    Ok(json_response(body, CacheStatus::Miss))
}

fn log_report(endpoint: &str, report: &AggregationReport) {
    for failure in &report.failures {
        warn!(endpoint, "{}", failure);
    }

    info!(
        endpoint,
        returned = report.repositories.len(),
        candidates = report.candidates,
        dropped_failed = report.failures.len(),
        "Feed rebuilt"
    );
}

pub async fn active_repos(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    let feed_config = &state.config().discovery.global_feed;
    let feed = feed_config.feed_query();
    let ttl = Duration::from_secs(feed_config.cache_ttl_seconds);

    serve_cached(&state, "active_repos", cache_key(&uri), ttl, || async {
        let report = state.pipeline().aggregate(&feed).await?;
        log_report("active_repos", &report);
        Ok(serde_json::to_string(&report.repositories)?)
    })
    .await
}

pub async fn language_repos(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    Path(language): Path<String>,
) -> Result<Response, ApiError> {
    let language = validate_language(&language)?;
    serve_language_feed(&state, &uri, language).await
}

/// Shared by `/repo/{language}` and the legacy per-language routes.
pub async fn serve_language_feed(
    state: &AppState,
    uri: &Uri,
    language: &str,
) -> Result<Response, ApiError> {
    let feed_config = &state.config().discovery.language_feed;
    let feed = feed_config.feed_query(language);
    let ttl = Duration::from_secs(feed_config.cache_ttl_seconds);

    serve_cached(state, "language_repos", cache_key(uri), ttl, || async {
        let report = state.pipeline().aggregate(&feed).await?;
        log_report("language_repos", &report);
        Ok(serde_json::to_string(&report.repositories)?)
    })
    .await
}

pub async fn active_issues(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    let ttl = Duration::from_secs(state.config().discovery.issues_feed.cache_ttl_seconds);

    serve_cached(&state, "active_issues", cache_key(&uri), ttl, || async {
        let body = state.issues().active_issues().await?;
        Ok(serde_json::to_string(&body)?)
    })
    .await
}
