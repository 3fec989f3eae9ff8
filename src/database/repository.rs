use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};

use crate::models::{CatalogEntity, PrecomputedEntry};

/// 目录读取接口：预计算任务的 Load 阶段从这里取数
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// 读取全部目录实体并联表人气计数（无计数行的 views/likes 记 0）
    async fn load_catalog_with_popularity(&self) -> Result<Vec<CatalogEntity>>;
}

/// 预计算缓存接口
///
/// 写入方是预计算任务（单写入者）；读取方（范围外的服务层）可能
/// 与写入并发，必须容忍跨键的部分新鲜度
#[async_trait]
pub trait RecommendationRepository: Send + Sync {
    /// 按键覆盖写入一条排好序的 id 列表（重跑覆盖而非追加）
    async fn upsert_entry(
        &self,
        key: &str,
        ranked_ids: &[i64],
        last_updated: DateTime<Utc>,
    ) -> Result<()>;

    async fn get_entry(&self, key: &str) -> Result<Option<PrecomputedEntry>>;

    /// 缓存中现存全部键，升序
    async fn list_keys(&self) -> Result<Vec<String>>;
}

/// SQLite 数据库仓库实现
#[derive(Clone)]
pub struct SqliteRepository {
    pool: Pool<Sqlite>,
}

impl SqliteRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn media_count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM media_items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn cache_entry_count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recommendation_cache")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl CatalogRepository for SqliteRepository {
    async fn load_catalog_with_popularity(&self) -> Result<Vec<CatalogEntity>> {
        let entities = sqlx::query_as::<_, CatalogEntity>(
            "SELECT m.id, m.media_type, m.title, m.genres, m.created_at, \
                    COALESCE(p.views, 0) AS views, COALESCE(p.likes, 0) AS likes \
             FROM media_items m \
             LEFT JOIN media_popularity p ON p.media_id = m.id \
             ORDER BY m.id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(entities)
    }
}

#[async_trait]
impl RecommendationRepository for SqliteRepository {
    async fn upsert_entry(
        &self,
        key: &str,
        ranked_ids: &[i64],
        last_updated: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO recommendation_cache (key, movie_ids, last_updated) \
             VALUES (?, ?, ?) \
             ON CONFLICT(key) DO UPDATE SET \
                 movie_ids = excluded.movie_ids, \
                 last_updated = excluded.last_updated",
        )
        .bind(key)
        .bind(PrecomputedEntry::join_ids(ranked_ids))
        .bind(last_updated)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_entry(&self, key: &str) -> Result<Option<PrecomputedEntry>> {
        let row: Option<(String, String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT key, movie_ids, last_updated FROM recommendation_cache WHERE key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(key, movie_ids, last_updated)| PrecomputedEntry {
            key,
            ranked_ids: PrecomputedEntry::parse_ids(&movie_ids),
            last_updated,
        }))
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT key FROM recommendation_cache ORDER BY key")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(key,)| key).collect())
    }
}
