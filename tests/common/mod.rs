//! Scripted GitHub fake and app builder for the HTTP tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use repopulse::clients::github::{
    GitHubApi, LanguageBreakdown, RawIssue, RawOwner, RawPullRequest, RawRepository, SortField,
    SortOrder, UpstreamError,
};
use repopulse::config::Config;
use repopulse::db::Store;
use repopulse::services::{CacheError, ResponseCache};
use repopulse::state::SharedState;
use tokio::sync::Barrier;

pub fn repo(owner: &str, name: &str) -> RawRepository {
    RawRepository {
        name: name.to_string(),
        owner: RawOwner {
            login: owner.to_string(),
        },
        html_url: format!("https://github.com/{owner}/{name}"),
        stargazers_count: 4200,
        forks_count: 310,
        updated_at: Utc::now(),
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

pub fn pr(title: &str, updated_at: DateTime<Utc>) -> RawPullRequest {
    RawPullRequest {
        title: title.to_string(),
        html_url: format!("https://github.com/o/r/pull/{title}"),
        updated_at,
    }
}

/// GitHub fake whose search can be switched to failing mid-test.
#[derive(Default)]
pub struct ScriptedGitHub {
    pub search: Vec<RawRepository>,
    pub issues: HashMap<String, Vec<RawIssue>>,
    pub pulls: HashMap<String, Vec<RawPullRequest>>,
    pub search_calls: AtomicUsize,
    pub issue_search_calls: AtomicUsize,
    pub queries: std::sync::Mutex<Vec<String>>,
    pub fail_search: AtomicBool,
    pub search_barrier: Option<Barrier>,
}

impl ScriptedGitHub {
    /// Three repositories: `alpha` and `gamma` active, `beta` stale.
    pub fn three_repos() -> Self {
        let now = Utc::now();
        let mut github = Self {
            search: vec![repo("o", "alpha"), repo("o", "beta"), repo("o", "gamma")],
            ..Self::default()
        };
        github
            .pulls
            .insert("o/alpha".to_string(), vec![pr("fix", now - Duration::days(2))]);
        github.issues.insert(
            "o/beta".to_string(),
            vec![issue("old", now - Duration::days(40))],
        );
        github
            .issues
            .insert("o/gamma".to_string(), vec![issue("new", now - Duration::hours(1))]);
        github
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GitHubApi for ScriptedGitHub {
    async fn search_repositories(
        &self,
        query: &str,
        _sort: SortField,
        _order: SortOrder,
        per_page: u32,
    ) -> Result<Vec<RawRepository>, UpstreamError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());

        if let Some(barrier) = &self.search_barrier {
            barrier.wait().await;
        }

        if self.fail_search.load(Ordering::SeqCst) {
            return Err(UpstreamError::Status {
                status: 403,
                message: "API rate limit exceeded".to_string(),
            });
        }

        Ok(self.search.iter().take(per_page as usize).cloned().collect())
    }

    async fn search_issues(
        &self,
        query: &str,
        _sort: SortField,
        _order: SortOrder,
        per_page: u32,
    ) -> Result<serde_json::Value, UpstreamError> {
        self.issue_search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(serde_json::json!({
            "total_count": 1,
            "incomplete_results": false,
            "items": [{ "title": "Add docs", "query": query, "per_page": per_page }]
        }))
    }

    async fn list_issues(
        &self,
        owner: &str,
        repo: &str,
        _per_page: u32,
    ) -> Result<Vec<RawIssue>, UpstreamError> {
        Ok(self
            .issues
            .get(&format!("{owner}/{repo}"))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        _per_page: u32,
    ) -> Result<Vec<RawPullRequest>, UpstreamError> {
        Ok(self
            .pulls
            .get(&format!("{owner}/{repo}"))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_languages(
        &self,
        _owner: &str,
        _repo: &str,
    ) -> Result<LanguageBreakdown, UpstreamError> {
        Ok(LanguageBreakdown::new(vec![("Rust".to_string(), 1000)]))
    }
}

/// Cache whose reads or writes fail with a store error.
#[derive(Default)]
pub struct FailingCache {
    pub fail_reads: bool,
    pub fail_writes: bool,
    pub sets: AtomicUsize,
}

impl FailingCache {
    pub fn failing_reads() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ResponseCache for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        if self.fail_reads {
            return Err(CacheError::Store("database is locked".to_string()));
        }
        Ok(None)
    }

    async fn set(
        &self,
        _key: &str,
        _value: &str,
        _ttl: std::time::Duration,
    ) -> Result<(), CacheError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(CacheError::Store("disk I/O error".to_string()));
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.observability.metrics_enabled = false;
    config
}

/// Router over an arbitrary cache; returns the GitHub fake for call counting.
pub fn spawn_app_with_cache(
    github: ScriptedGitHub,
    cache: Arc<dyn ResponseCache>,
) -> (Router, Arc<ScriptedGitHub>) {
    let github = Arc::new(github);
    let shared = SharedState::with_components(test_config(), github.clone(), cache);
    let state = repopulse::api::create_app_state(shared, None);

    (repopulse::api::router(state), github)
}

pub struct TestApp {
    pub router: Router,
    pub github: Arc<ScriptedGitHub>,
    pub store: Store,
}

pub async fn spawn_app(github: ScriptedGitHub) -> TestApp {
    let store = Store::new(&test_config().general.database_path)
        .await
        .expect("Failed to open cache store");
    let (router, github) = spawn_app_with_cache(github, Arc::new(store.clone()));

    TestApp {
        router,
        github,
        store,
    }
}
