//! Repository feed pipeline: search, enrich, filter, truncate.
//!
//! All feed variants (global, per language) run through [`AggregationPipeline`];
//! they differ only in the [`FeedQuery`] they pass in.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::clients::github::{GitHubApi, SortField, SortOrder, UpstreamError};
use crate::models::RepositorySummary;
use crate::services::activity::{default_activity_window, is_active};
use crate::services::enricher::{ActivityEnricher, EnrichmentError};

/// Enrichments allowed in flight when no limit is configured.
pub const DEFAULT_ENRICHMENT_CONCURRENCY: usize = 8;

/// Search query plus sizing for one feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub query: String,

    /// Search page size
    pub over_fetch: u32,

    pub result_cap: usize,
}

impl FeedQuery {
    #[must_use]
    pub fn new(query: impl Into<String>, over_fetch: u32, result_cap: usize) -> Self {
        Self {
            query: query.into(),
            over_fetch,
            result_cap,
        }
    }
}

/// What an aggregation produced and what it threw away.
#[derive(Debug, Default)]
pub struct AggregationReport {
    /// Active repositories, in search order, at most `result_cap` long.
    pub repositories: Vec<RepositorySummary>,

    pub candidates: usize,

    pub inactive: usize,

    pub failures: Vec<EnrichmentError>,
}

pub struct AggregationPipeline {
    github: Arc<dyn GitHubApi>,
    enricher: ActivityEnricher,
    concurrency: usize,
    window: Duration,
}

impl AggregationPipeline {
    #[must_use]
    pub fn new(github: Arc<dyn GitHubApi>) -> Self {
        Self {
            enricher: ActivityEnricher::new(github.clone()),
            github,
            concurrency: DEFAULT_ENRICHMENT_CONCURRENCY,
            window: default_activity_window(),
        }
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    #[must_use]
    pub const fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub async fn aggregate(&self, feed: &FeedQuery) -> Result<AggregationReport, UpstreamError> {
        self.aggregate_at(feed, Utc::now()).await
    }

    /// Runs the feed against a fixed reference time.
    ///
    /// Only the search call can fail the run. A repository whose enrichment
    /// fails is dropped and reported in [`AggregationReport::failures`].
    pub async fn aggregate_at(
        &self,
        feed: &FeedQuery,
        reference: DateTime<Utc>,
    ) -> Result<AggregationReport, UpstreamError> {
        let candidates = self
            .github
            .search_repositories(
                &feed.query,
                SortField::Updated,
                SortOrder::Desc,
                feed.over_fetch,
            )
            .await?;

        let candidate_count = candidates.len();
        let enricher = &self.enricher;

        // `buffered` keeps search order while capping in-flight enrichments.
        let outcomes: Vec<_> = stream::iter(candidates)
            .map(|repository| async move {
                let outcome = enricher
                    .enrich(&repository.owner.login, &repository.name)
                    .await;
                (repository, outcome)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut report = AggregationReport {
            candidates: candidate_count,
            ..AggregationReport::default()
        };

        for (repository, outcome) in outcomes {
            match outcome {
                Ok(activity) if is_active(&activity, reference, self.window) => {
                    report
                        .repositories
                        .push(RepositorySummary::from_parts(repository, activity));
                }
                Ok(_) => report.inactive += 1,
                Err(e) => {
                    warn!("Dropping repository from feed: {}", e);
                    metrics::counter!("enrichment_failures_total").increment(1);
                    report.failures.push(e);
                }
            }
        }

        report.repositories.truncate(feed.result_cap);

        info!(
            query = %feed.query,
            candidates = report.candidates,
            active = report.repositories.len(),
            inactive = report.inactive,
            failed = report.failures.len(),
            "Aggregation finished"
        );

        Ok(report)
    }
}
