use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clients::github::{RawIssue, RawPullRequest, RawRepository};
use crate::services::enricher::EnrichedActivity;

/// A single issue or pull request, reduced to what the feeds display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    pub title: String,

    pub url: String,

    pub updated_at: DateTime<Utc>,
}

impl From<RawIssue> for ActivityItem {
    fn from(issue: RawIssue) -> Self {
        Self {
            title: issue.title,
            url: issue.html_url,
            updated_at: issue.updated_at,
        }
    }
}

impl From<RawPullRequest> for ActivityItem {
    fn from(pr: RawPullRequest) -> Self {
        Self {
            title: pr.title,
            url: pr.html_url,
            updated_at: pr.updated_at,
        }
    }
}

/// One entry of a repository feed. Serialized as-is into the response cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySummary {
    pub name: String,

    pub owner: String,

    pub url: String,

    #[serde(rename = "stars")]
    pub star_count: u64,

    #[serde(rename = "forks")]
    pub fork_count: u64,

    pub updated_at: DateTime<Utc>,

    pub recent_issues: Vec<ActivityItem>,

    #[serde(rename = "recentPRs")]
    pub recent_prs: Vec<ActivityItem>,

    pub primary_language: Option<String>,
}

impl RepositorySummary {
    #[must_use]
    pub fn from_parts(repository: RawRepository, activity: EnrichedActivity) -> Self {
        Self {
            name: repository.name,
            owner: repository.owner.login,
            url: repository.html_url,
            star_count: repository.stargazers_count,
            fork_count: repository.forks_count,
            updated_at: repository.updated_at,
            recent_issues: activity.recent_issues,
            recent_prs: activity.recent_prs,
            primary_language: activity.primary_language,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_serializes_with_feed_field_names() {
        let updated_at = DateTime::parse_from_rfc3339("2026-10-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let summary = RepositorySummary {
            name: "tokio".to_string(),
            owner: "tokio-rs".to_string(),
            url: "https://github.com/tokio-rs/tokio".to_string(),
            star_count: 30_000,
            fork_count: 2_500,
            updated_at,
            recent_issues: vec![],
            recent_prs: vec![ActivityItem {
                title: "Fix waker".to_string(),
                url: "https://github.com/tokio-rs/tokio/pull/1".to_string(),
                updated_at,
            }],
            primary_language: Some("Rust".to_string()),
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["stars"], 30_000);
        assert_eq!(json["forks"], 2_500);
        assert_eq!(json["updatedAt"], "2026-10-01T12:00:00Z");
        assert_eq!(json["recentPRs"][0]["title"], "Fix waker");
        assert!(json["recentIssues"].as_array().unwrap().is_empty());
        assert_eq!(json["primaryLanguage"], "Rust");
        assert_eq!(json["owner"], "tokio-rs");
    }
}
