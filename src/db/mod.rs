use crate::config::GeneralConfig;
use crate::services::cache::{CacheError, ResponseCache};
use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

/// SQLite-backed response cache. Cloning shares the connection pool.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn from_config(config: &GeneralConfig) -> Result<Self> {
        Self::with_pool_options(
            &config.database_path,
            config.max_db_connections,
            config.min_db_connections,
        )
        .await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Cache database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    /// Closes the pool. Other clones of this store become unusable.
    pub async fn close(&self) -> Result<()> {
        self.conn.clone().close().await?;
        info!("Cache database closed");
        Ok(())
    }

    fn cache_repo(&self) -> repositories::cache::CacheRepository {
        repositories::cache::CacheRepository::new(self.conn.clone())
    }
}

#[async_trait]
impl ResponseCache for Store {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.cache_repo().get(key, chrono::Utc::now()).await?)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let now = chrono::Utc::now();
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| CacheError::Store(format!("invalid TTL: {e}")))?;

        self.cache_repo().set(key, value, now, now + ttl).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Self::ping(self)
            .await
            .map_err(|e| CacheError::Store(e.to_string()))
    }
}
