use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ResponseCache::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ResponseCache::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ResponseCache::CacheKey).string().not_null())
                    .col(ColumnDef::new(ResponseCache::Body).text().not_null())
                    .col(ColumnDef::new(ResponseCache::CreatedAt).string().not_null())
                    .col(ColumnDef::new(ResponseCache::ExpiresAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_response_cache_key_unique")
                    .table(ResponseCache::Table)
                    .col(ResponseCache::CacheKey)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_response_cache_expires_at")
                    .table(ResponseCache::Table)
                    .col(ResponseCache::ExpiresAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ResponseCache::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ResponseCache {
    Table,
    Id,
    CacheKey,
    Body,
    CreatedAt,
    ExpiresAt,
}
