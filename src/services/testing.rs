//! Scripted GitHub fake shared by the service tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::clients::github::{
    GitHubApi, LanguageBreakdown, RawIssue, RawOwner, RawPullRequest, RawRepository, SortField,
    SortOrder, UpstreamError,
};

pub fn repo(owner: &str, name: &str, updated_at: DateTime<Utc>) -> RawRepository {
    RawRepository {
        name: name.to_string(),
        owner: RawOwner {
            login: owner.to_string(),
        },
        html_url: format!("https://github.com/{owner}/{name}"),
        stargazers_count: 1500,
        forks_count: 100,
        updated_at,
    }
}

pub fn issue(title: &str, updated_at: DateTime<Utc>) -> RawIssue {
    RawIssue {
        title: title.to_string(),
        html_url: format!("https://github.com/o/r/issues/{title}"),
        updated_at,
        pull_request: None,
    }
}

pub fn issue_backed_pr(title: &str, updated_at: DateTime<Utc>) -> RawIssue {
    RawIssue {
        pull_request: Some(serde_json::json!({ "url": "https://api.github.com/pulls/1" })),
        ..issue(title, updated_at)
    }
}

pub fn pr(title: &str, updated_at: DateTime<Utc>) -> RawPullRequest {
    RawPullRequest {
        title: title.to_string(),
        html_url: format!("https://github.com/o/r/pull/{title}"),
        updated_at,
    }
}

#[derive(Default)]
pub struct FakeGitHub {
    search: Vec<RawRepository>,
    search_error: Option<(u16, String)>,
    issues: HashMap<String, Vec<RawIssue>>,
    pulls: HashMap<String, Vec<RawPullRequest>>,
    languages: HashMap<String, LanguageBreakdown>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub last_search: std::sync::Mutex<Option<(String, u32)>>,
}

impl FakeGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, repositories: Vec<RawRepository>) -> Self {
        self.search = repositories;
        self
    }

    pub fn with_search_error(mut self, status: u16, message: &str) -> Self {
        self.search_error = Some((status, message.to_string()));
        self
    }

    pub fn with_issues(mut self, full_name: &str, issues: Vec<RawIssue>) -> Self {
        self.issues.insert(full_name.to_string(), issues);
        self
    }

    pub fn with_pulls(mut self, full_name: &str, pulls: Vec<RawPullRequest>) -> Self {
        self.pulls.insert(full_name.to_string(), pulls);
        self
    }

    pub fn with_languages(mut self, full_name: &str, languages: &[(&str, u64)]) -> Self {
        let entries = languages
            .iter()
            .map(|(name, bytes)| ((*name).to_string(), *bytes))
            .collect();
        self.languages
            .insert(full_name.to_string(), LanguageBreakdown::new(entries));
        self
    }

    pub fn failing_for(mut self, full_name: &str) -> Self {
        self.failing.insert(full_name.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn check(&self, full_name: &str) -> Result<(), UpstreamError> {
        if self.failing.contains(full_name) {
            return Err(UpstreamError::Status {
                status: 404,
                message: "Not Found".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl GitHubApi for FakeGitHub {
    async fn search_repositories(
        &self,
        query: &str,
        _sort: SortField,
        _order: SortOrder,
        per_page: u32,
    ) -> Result<Vec<RawRepository>, UpstreamError> {
        *self.last_search.lock().unwrap() = Some((query.to_string(), per_page));

        if let Some((status, message)) = &self.search_error {
            return Err(UpstreamError::Status {
                status: *status,
                message: message.clone(),
            });
        }

        Ok(self
            .search
            .iter()
            .take(per_page as usize)
            .cloned()
            .collect())
    }

    async fn search_issues(
        &self,
        query: &str,
        _sort: SortField,
        _order: SortOrder,
        per_page: u32,
    ) -> Result<serde_json::Value, UpstreamError> {
        Ok(serde_json::json!({ "query": query, "per_page": per_page, "items": [] }))
    }

    async fn list_issues(
        &self,
        owner: &str,
        repo: &str,
        per_page: u32,
    ) -> Result<Vec<RawIssue>, UpstreamError> {
        let full_name = format!("{owner}/{repo}");

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.check(&full_name)?;
        Ok(self
            .issues
            .get(&full_name)
            .map(|items| items.iter().take(per_page as usize).cloned().collect())
            .unwrap_or_default())
    }

    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        per_page: u32,
    ) -> Result<Vec<RawPullRequest>, UpstreamError> {
        let full_name = format!("{owner}/{repo}");
        self.check(&full_name)?;
        Ok(self
            .pulls
            .get(&full_name)
            .map(|items| items.iter().take(per_page as usize).cloned().collect())
            .unwrap_or_default())
    }

    async fn list_languages(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<LanguageBreakdown, UpstreamError> {
        let full_name = format!("{owner}/{repo}");
        self.check(&full_name)?;
        Ok(self.languages.get(&full_name).cloned().unwrap_or_default())
    }
}
