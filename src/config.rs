use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::services::aggregation::FeedQuery;

/// Placeholder substituted with the requested language in
/// [`LanguageFeedConfig::query_template`].
pub const LANGUAGE_PLACEHOLDER: &str = "{language}";

/// Upper bound for `activity_window_days` and `issues_feed.window_days`.
pub const MAX_WINDOW_DAYS: u32 = 365;

/// GitHub search caps `per_page` at 100.
const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub github: GitHubConfig,

    pub server: ServerConfig,

    pub discovery: DiscoveryConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Location of the response cache database
    pub database_path: String,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            worker_threads: 2,
            database_path: "sqlite:data/repopulse.db".to_string(),
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub api_url: String,

    /// Personal access token. `GITHUB_TOKEN` in the environment takes precedence.
    pub token: String,

    pub request_timeout_seconds: u64,

    pub user_agent: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            token: String::new(),
            request_timeout_seconds: 30,
            user_agent: format!("repopulse/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Upper bound on repositories enriched at the same time
    pub max_concurrent_enrichments: usize,

    /// A repository is active when an issue or PR was updated within this many days
    pub activity_window_days: u32,

    pub global_feed: RepositoryFeedConfig,

    pub language_feed: LanguageFeedConfig,

    pub issues_feed: IssuesFeedConfig,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_concurrent_enrichments: 8,
            activity_window_days: 7,
            global_feed: RepositoryFeedConfig::default(),
            language_feed: LanguageFeedConfig::default(),
            issues_feed: IssuesFeedConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryFeedConfig {
    pub query: String,

    /// Search page size; larger than `result_cap` because inactive candidates are dropped
    pub over_fetch: u32,

    pub result_cap: usize,

    pub cache_ttl_seconds: u64,
}

impl Default for RepositoryFeedConfig {
    fn default() -> Self {
        Self {
            query: "stars:>1000".to_string(),
            over_fetch: 50,
            result_cap: 20,
            cache_ttl_seconds: 60 * 60,
        }
    }
}

impl RepositoryFeedConfig {
    #[must_use]
    pub fn feed_query(&self) -> FeedQuery {
        FeedQuery::new(self.query.clone(), self.over_fetch, self.result_cap)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageFeedConfig {
    /// Search query with a `{language}` placeholder
    pub query_template: String,

    pub over_fetch: u32,

    pub result_cap: usize,

    pub cache_ttl_seconds: u64,
}

impl Default for LanguageFeedConfig {
    fn default() -> Self {
        Self {
            query_template: format!("language:{LANGUAGE_PLACEHOLDER} stars:>1000"),
            over_fetch: 30,
            result_cap: 10,
            cache_ttl_seconds: 2 * 60 * 60,
        }
    }
}

impl LanguageFeedConfig {
    #[must_use]
    pub fn feed_query(&self, language: &str) -> FeedQuery {
        FeedQuery::new(
            self.query_template.replace(LANGUAGE_PLACEHOLDER, language),
            self.over_fetch,
            self.result_cap,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuesFeedConfig {
    pub label: String,

    pub window_days: u32,

    pub result_cap: u32,

    pub cache_ttl_seconds: u64,
}

impl Default for IssuesFeedConfig {
    fn default() -> Self {
        Self {
            label: "good first issue".to_string(),
            window_days: 30,
            result_cap: 40,
            cache_ttl_seconds: 60 * 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.apply_env_overrides();
        Ok(config)
    }

    /// `GITHUB_TOKEN` and `PORT` win over whatever the file says.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("GITHUB_TOKEN")
            && !token.trim().is_empty()
        {
            self.github.token = token.trim().to_string();
        }

        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("repopulse").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".repopulse").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.github.api_url.trim().is_empty() {
            anyhow::bail!("GitHub API URL cannot be empty");
        }

        if self.github.request_timeout_seconds == 0 {
            anyhow::bail!("github.request_timeout_seconds must be > 0");
        }

        let discovery = &self.discovery;
        if discovery.max_concurrent_enrichments == 0 {
            anyhow::bail!("max_concurrent_enrichments must be > 0");
        }

        if !(1..=MAX_WINDOW_DAYS).contains(&discovery.activity_window_days) {
            anyhow::bail!("activity_window_days must be between 1 and {MAX_WINDOW_DAYS}");
        }

        Self::validate_feed(
            "global_feed",
            discovery.global_feed.over_fetch,
            discovery.global_feed.result_cap,
            discovery.global_feed.cache_ttl_seconds,
        )?;

        Self::validate_feed(
            "language_feed",
            discovery.language_feed.over_fetch,
            discovery.language_feed.result_cap,
            discovery.language_feed.cache_ttl_seconds,
        )?;

        if !discovery
            .language_feed
            .query_template
            .contains(LANGUAGE_PLACEHOLDER)
        {
            anyhow::bail!("language_feed.query_template must contain {LANGUAGE_PLACEHOLDER}");
        }

        let issues = &discovery.issues_feed;
        if issues.label.trim().is_empty() {
            anyhow::bail!("issues_feed.label cannot be empty");
        }
        if issues.window_days == 0 || issues.result_cap == 0 || issues.cache_ttl_seconds == 0 {
            anyhow::bail!("issues_feed window, cap and TTL must all be > 0");
        }
        if issues.window_days > MAX_WINDOW_DAYS {
            anyhow::bail!("issues_feed.window_days cannot exceed {MAX_WINDOW_DAYS}");
        }
        if issues.result_cap > MAX_PER_PAGE {
            anyhow::bail!("issues_feed.result_cap cannot exceed {MAX_PER_PAGE}");
        }

        Ok(())
    }

    fn validate_feed(name: &str, over_fetch: u32, result_cap: usize, ttl: u64) -> Result<()> {
        if result_cap == 0 {
            anyhow::bail!("{name}.result_cap must be > 0");
        }

        if (over_fetch as usize) < result_cap {
            anyhow::bail!("{name}.over_fetch ({over_fetch}) must be >= result_cap ({result_cap})");
        }

        if over_fetch > MAX_PER_PAGE {
            anyhow::bail!("{name}.over_fetch cannot exceed {MAX_PER_PAGE}");
        }

        if ttl == 0 {
            anyhow::bail!("{name}.cache_ttl_seconds must be > 0");
        }

        Ok(())
    }
}
