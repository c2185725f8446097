//! Read-only GitHub REST v3 client.
//!
//! Only the handful of search/list endpoints needed for activity discovery are
//! covered. Every call is a single request: no pagination, no retries.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::GitHubConfig;

const GITHUB_API_VERSION: &str = "2022-11-28";

/// Errors raised by a GitHub call. Never retried by this crate.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("GitHub API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("GitHub request failed: {0}")]
    Network(String),

    #[error("Failed to decode GitHub response: {0}")]
    Decode(String),

    #[error("Invalid GitHub request: {0}")]
    InvalidRequest(String),
}

impl UpstreamError {
    /// HTTP status reported by GitHub, when the failure came with one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Updated,
}

impl SortField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Updated => "updated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOwner {
    pub login: String,
}

/// Repository record as returned by `/search/repositories`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRepository {
    pub name: String,
    pub owner: RawOwner,
    pub html_url: String,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    pub updated_at: DateTime<Utc>,
}

/// Issue record from `/repos/{owner}/{repo}/issues`.
///
/// GitHub lists pull requests on this endpoint too; those carry a
/// `pull_request` object.
#[derive(Debug, Clone, Deserialize)]
pub struct RawIssue {
    pub title: String,
    pub html_url: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl RawIssue {
    #[must_use]
    pub const fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// Pull request record from `/repos/{owner}/{repo}/pulls`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPullRequest {
    pub title: String,
    pub html_url: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse<T> {
    items: Vec<T>,
}

/// Language name to byte count, in the order GitHub sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageBreakdown(Vec<(String, u64)>);

impl LanguageBreakdown {
    #[must_use]
    pub const fn new(entries: Vec<(String, u64)>) -> Self {
        Self(entries)
    }

    /// First language in upstream order. GitHub sorts by bytes, but that is
    /// taken on trust.
    #[must_use]
    pub fn primary(&self) -> Option<&str> {
        self.0.first().map(|(name, _)| name.as_str())
    }
}

impl<'de> Deserialize<'de> for LanguageBreakdown {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct BreakdownVisitor;

        impl<'de> Visitor<'de> for BreakdownVisitor {
            type Value = LanguageBreakdown;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of language names to byte counts")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, bytes)) = map.next_entry::<String, u64>()? {
                    entries.push((name, bytes));
                }
                Ok(LanguageBreakdown(entries))
            }
        }

        deserializer.deserialize_map(BreakdownVisitor)
    }
}

/// The GitHub queries activity discovery depends on.
///
/// Implemented by [`GitHubClient`]; tests substitute scripted fakes.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    async fn search_repositories(
        &self,
        query: &str,
        sort: SortField,
        order: SortOrder,
        per_page: u32,
    ) -> Result<Vec<RawRepository>, UpstreamError>;

    /// Issue search; the body is handed back untouched.
    async fn search_issues(
        &self,
        query: &str,
        sort: SortField,
        order: SortOrder,
        per_page: u32,
    ) -> Result<serde_json::Value, UpstreamError>;

    async fn list_issues(
        &self,
        owner: &str,
        repo: &str,
        per_page: u32,
    ) -> Result<Vec<RawIssue>, UpstreamError>;

    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        per_page: u32,
    ) -> Result<Vec<RawPullRequest>, UpstreamError>;

    async fn list_languages(&self, owner: &str, repo: &str)
    -> Result<LanguageBreakdown, UpstreamError>;
}

#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Result<Self, UpstreamError> {
        let mut headers = HeaderMap::new();

        if config.token.is_empty() {
            warn!("No GitHub token configured; requests are unauthenticated and heavily rate limited");
        } else {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", config.token))
                .map_err(|e| UpstreamError::InvalidRequest(format!("invalid token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| UpstreamError::InvalidRequest(format!("invalid user agent: {e}")))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint_url(&self, path: &str, params: &[(&str, String)]) -> Result<Url, UpstreamError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| UpstreamError::InvalidRequest(e.to_string()))?;

        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    fn repo_path(owner: &str, repo: &str, suffix: &str) -> String {
        format!(
            "/repos/{}/{}/{}",
            urlencoding::encode(owner),
            urlencoding::encode(repo),
            suffix
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, UpstreamError> {
        let url = self.endpoint_url(path, params)?;
        debug!(endpoint, url = %url, "GitHub request");

        let response = self.client.get(url).send().await.map_err(|e| {
            metrics::counter!("upstream_requests_total", "endpoint" => endpoint, "status" => "network_error")
                .increment(1);
            UpstreamError::Network(e.to_string())
        })?;

        let status = response.status();
        metrics::counter!(
            "upstream_requests_total",
            "endpoint" => endpoint,
            "status" => status.as_u16().to_string()
        )
        .increment(1);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}

/// GitHub error bodies look like `{"message": "...", "documentation_url": "..."}`.
fn error_message(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .ok()
        .filter(|m| !m.is_empty())
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        })
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn search_repositories(
        &self,
        query: &str,
        sort: SortField,
        order: SortOrder,
        per_page: u32,
    ) -> Result<Vec<RawRepository>, UpstreamError> {
        let params = [
            ("q", query.to_string()),
            ("sort", sort.as_str().to_string()),
            ("order", order.as_str().to_string()),
            ("per_page", per_page.to_string()),
        ];

        let response: SearchResponse<RawRepository> = self
            .get_json("search_repositories", "/search/repositories", &params)
            .await?;

        Ok(response.items)
    }

    async fn search_issues(
        &self,
        query: &str,
        sort: SortField,
        order: SortOrder,
        per_page: u32,
    ) -> Result<serde_json::Value, UpstreamError> {
        let params = [
            ("q", query.to_string()),
            ("sort", sort.as_str().to_string()),
            ("order", order.as_str().to_string()),
            ("per_page", per_page.to_string()),
        ];

        self.get_json("search_issues", "/search/issues", &params)
            .await
    }

    async fn list_issues(
        &self,
        owner: &str,
        repo: &str,
        per_page: u32,
    ) -> Result<Vec<RawIssue>, UpstreamError> {
        let params = [
            ("state", "all".to_string()),
            ("sort", SortField::Updated.as_str().to_string()),
            ("per_page", per_page.to_string()),
        ];

        self.get_json("list_issues", &Self::repo_path(owner, repo, "issues"), &params)
            .await
    }

    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        per_page: u32,
    ) -> Result<Vec<RawPullRequest>, UpstreamError> {
        let params = [
            ("state", "all".to_string()),
            ("sort", SortField::Updated.as_str().to_string()),
            ("direction", SortOrder::Desc.as_str().to_string()),
            ("per_page", per_page.to_string()),
        ];

        self.get_json(
            "list_pull_requests",
            &Self::repo_path(owner, repo, "pulls"),
            &params,
        )
        .await
    }

    async fn list_languages(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<LanguageBreakdown, UpstreamError> {
        self.get_json(
            "list_languages",
            &Self::repo_path(owner, repo, "languages"),
            &[],
        )
        .await
    }
}
