use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::clients::github::{GitHubApi, UpstreamError};
use crate::models::ActivityItem;

/// Issues and pull requests kept per repository, each.
pub const ACTIVITY_ITEMS_PER_KIND: u32 = 5;

/// One of the three enrichment calls failed; the repository gets no summary.
#[derive(Debug, Error)]
#[error("Failed to enrich {owner}/{repo}: {source}")]
pub struct EnrichmentError {
    pub owner: String,
    pub repo: String,
    #[source]
    pub source: UpstreamError,
}

/// Recent activity and language of one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichedActivity {
    pub recent_issues: Vec<ActivityItem>,
    pub recent_prs: Vec<ActivityItem>,
    pub primary_language: Option<String>,
}

impl EnrichedActivity {
    /// Issues first, then pull requests.
    pub fn items(&self) -> impl Iterator<Item = &ActivityItem> {
        self.recent_issues.iter().chain(self.recent_prs.iter())
    }
}

#[derive(Clone)]
pub struct ActivityEnricher {
    github: Arc<dyn GitHubApi>,
}

impl ActivityEnricher {
    #[must_use]
    pub fn new(github: Arc<dyn GitHubApi>) -> Self {
        Self { github }
    }

    /// Fetches issues, pull requests and languages for `owner/repo` at once.
    ///
    /// Items stay in the order GitHub returned them (most recently updated
    /// first); nothing is re-sorted here.
    pub async fn enrich(&self, owner: &str, repo: &str) -> Result<EnrichedActivity, EnrichmentError> {
        let (issues, pulls, languages) = tokio::try_join!(
            self.github.list_issues(owner, repo, ACTIVITY_ITEMS_PER_KIND),
            self.github
                .list_pull_requests(owner, repo, ACTIVITY_ITEMS_PER_KIND),
            self.github.list_languages(owner, repo),
        )
        .map_err(|source| EnrichmentError {
            owner: owner.to_string(),
            repo: repo.to_string(),
            source,
        })?;

        let recent_issues: Vec<ActivityItem> = issues
            .into_iter()
            .filter(|issue| !issue.is_pull_request())
            .take(ACTIVITY_ITEMS_PER_KIND as usize)
            .map(ActivityItem::from)
            .collect();

        let recent_prs: Vec<ActivityItem> = pulls
            .into_iter()
            .take(ACTIVITY_ITEMS_PER_KIND as usize)
            .map(ActivityItem::from)
            .collect();

        let primary_language = languages.primary().map(str::to_string);

        debug!(
            owner,
            repo,
            issues = recent_issues.len(),
            prs = recent_prs.len(),
            language = primary_language.as_deref().unwrap_or("-"),
            "Enriched repository"
        );

        Ok(EnrichedActivity {
            recent_issues,
            recent_prs,
            primary_language,
        })
    }
}
