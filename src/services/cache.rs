//! Response cache abstraction.
//!
//! Values are opaque serialized strings keyed by the verbatim request path and
//! query. Entries expire after their TTL and are never invalidated otherwise.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache store error: {0}")]
    Store(String),

    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

impl From<sea_orm::DbErr> for CacheError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Key-value store with per-entry expiry.
///
/// A single long-lived instance is created at startup and shared by all
/// handlers.
#[async_trait::async_trait]
pub trait ResponseCache: Send + Sync {
    /// Returns the stored value if present and not expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key`, replacing any previous entry.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Checks that the backing store is reachable.
    async fn ping(&self) -> Result<(), CacheError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_error_display() {
        let err: CacheError = sea_orm::DbErr::Custom("disk full".to_string()).into();
        assert!(err.to_string().starts_with("Cache store error: "));
        assert!(err.to_string().contains("disk full"));
        assert!(matches!(err, CacheError::Store(_)));
    }
}
