use axum::{
    Router,
    extract::{OriginalUri, State},
    http::HeaderValue,
    middleware,
    routing::{MethodRouter, get},
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::{AggregationPipeline, IssueFeedService, ResponseCache};
use crate::state::SharedState;

mod error;
pub mod feeds;
mod observability;
mod system;
mod validation;

pub use error::ApiError;

use metrics_exporter_prometheus::PrometheusHandle;

/// Body of every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

#[derive(Clone)]
pub struct AppState {
    pub shared: SharedState,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<dyn ResponseCache> {
        &self.shared.cache
    }

    #[must_use]
    pub fn pipeline(&self) -> &Arc<AggregationPipeline> {
        &self.shared.pipeline
    }

    #[must_use]
    pub fn issues(&self) -> &Arc<IssueFeedService> {
        &self.shared.issues
    }
}

#[must_use]
pub fn create_app_state(
    shared: SharedState,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    // Layered inside the nest so the middleware sees `MatchedPath`.
    let api_router = create_api_router()
        .layer(middleware::from_fn(observability::logging_middleware))
        .with_state(state);

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

fn create_api_router() -> Router<Arc<AppState>> {
    let mut router = Router::new()
        .route("/active-repos", get(feeds::active_repos))
        .route("/repo/{language}", get(feeds::language_repos))
        .route("/active-issues", get(feeds::active_issues))
        .route("/health", get(system::health))
        .route("/metrics", get(observability::get_metrics));

    for (path, language) in feeds::LEGACY_LANGUAGE_ROUTES {
        router = router.route(path, legacy_language_route(language));
    }

    router
}

fn legacy_language_route(language: &'static str) -> MethodRouter<Arc<AppState>> {
    get(
        move |State(state): State<Arc<AppState>>, OriginalUri(uri): OriginalUri| async move {
            feeds::serve_language_feed(&state, &uri, language).await
        },
    )
}
