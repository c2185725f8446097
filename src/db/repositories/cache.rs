use crate::entities::{prelude::*, response_cache};
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::debug;

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub struct CacheRepository {
    conn: DatabaseConnection,
}

impl CacheRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, key: &str, now: DateTime<Utc>) -> Result<Option<String>, sea_orm::DbErr> {
        let now = timestamp(now);

        // Opportunistic cleanup; a failure here must not fail the read
        if let Err(e) = ResponseCache::delete_many()
            .filter(response_cache::Column::ExpiresAt.lte(&now))
            .exec(&self.conn)
            .await
        {
            debug!("Failed to purge expired cache entries: {}", e);
        }

        let entry = ResponseCache::find()
            .filter(response_cache::Column::CacheKey.eq(key))
            .filter(response_cache::Column::ExpiresAt.gt(&now))
            .one(&self.conn)
            .await?;

        Ok(entry.map(|e| e.body))
    }

    pub async fn set(
        &self,
        key: &str,
        body: &str,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), sea_orm::DbErr> {
        let active_model = response_cache::ActiveModel {
            cache_key: Set(key.to_string()),
            body: Set(body.to_string()),
            created_at: Set(timestamp(now)),
            expires_at: Set(timestamp(expires_at)),
            ..Default::default()
        };

        ResponseCache::insert(active_model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(response_cache::Column::CacheKey)
                    .update_columns([
                        response_cache::Column::Body,
                        response_cache::Column::CreatedAt,
                        response_cache::Column::ExpiresAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await?;

        Ok(())
    }
}
