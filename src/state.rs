use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;

use crate::clients::github::{GitHubApi, GitHubClient};
use crate::config::Config;
use crate::db::Store;
use crate::services::{AggregationPipeline, IssueFeedService, ResponseCache};

/// Long-lived collaborators shared by every request.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub cache: Arc<dyn ResponseCache>,

    pub pipeline: Arc<AggregationPipeline>,

    pub issues: Arc<IssueFeedService>,
}

impl SharedState {
    /// Builds the GitHub client from config and uses `store` as the cache.
    pub fn new(config: Config, store: Store) -> anyhow::Result<Self> {
        let github =
            GitHubClient::new(&config.github).context("Failed to build GitHub client")?;

        Ok(Self::with_components(
            config,
            Arc::new(github),
            Arc::new(store),
        ))
    }

    /// Wires explicit collaborators; tests pass fakes here.
    #[must_use]
    pub fn with_components(
        config: Config,
        github: Arc<dyn GitHubApi>,
        cache: Arc<dyn ResponseCache>,
    ) -> Self {
        let discovery = &config.discovery;

        let pipeline = AggregationPipeline::new(github.clone())
            .with_concurrency(discovery.max_concurrent_enrichments)
            .with_window(Duration::days(i64::from(discovery.activity_window_days)));

        let issues = IssueFeedService::new(github, &discovery.issues_feed);

        Self {
            config: Arc::new(config),
            cache,
            pipeline: Arc::new(pipeline),
            issues: Arc::new(issues),
        }
    }
}
