use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::clients::github::{GitHubApi, SortField, SortOrder, UpstreamError};
use crate::config::IssuesFeedConfig;
use crate::services::activity::window_start;

/// Open issues carrying a contributor-friendly label, recently updated.
pub struct IssueFeedService {
    github: Arc<dyn GitHubApi>,
    label: String,
    window: Duration,
    result_cap: u32,
}

impl IssueFeedService {
    #[must_use]
    pub fn new(github: Arc<dyn GitHubApi>, config: &IssuesFeedConfig) -> Self {
        Self {
            github,
            label: config.label.clone(),
            window: Duration::days(i64::from(config.window_days)),
            result_cap: config.result_cap,
        }
    }

    #[must_use]
    pub fn search_query(&self, reference: DateTime<Utc>) -> String {
        let since = window_start(reference, self.window).format("%Y-%m-%d");
        format!(
            "label:\"{}\" is:issue state:open updated:>{since}",
            self.label
        )
    }

    /// Raw GitHub issue search body, at most `result_cap` items.
    pub async fn active_issues(&self) -> Result<serde_json::Value, UpstreamError> {
        self.active_issues_at(Utc::now()).await
    }

    pub async fn active_issues_at(
        &self,
        reference: DateTime<Utc>,
    ) -> Result<serde_json::Value, UpstreamError> {
        let query = self.search_query(reference);
        let body = self
            .github
            .search_issues(&query, SortField::Updated, SortOrder::Desc, self.result_cap)
            .await?;

        info!(query = %query, "Fetched active issues");
        Ok(body)
    }
}
