use anyhow::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use std::str::FromStr;

pub mod repository;

pub use repository::{CatalogRepository, RecommendationRepository, SqliteRepository};

#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
    repository: SqliteRepository,
}

impl Database {
    /// 按 DATABASE_URL 环境变量连接（缺省本地文件库）
    pub async fn new() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:./media_discovery.db?mode=rwc".to_string());
        Self::connect(&database_url).await
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        tracing::info!("Connecting to database: {}", database_url);

        // 配置 SQLite 连接选项
        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .busy_timeout(std::time::Duration::from_secs(30)); // 设置忙等待超时

        // SQLite 单写入者，限制为1个连接以避免锁定问题
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(connect_options)
            .await?;

        // Run migrations
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&pool).await?;

        let repository = SqliteRepository::new(pool.clone());

        let media_count = repository.media_count().await?;
        let cache_count = repository.cache_entry_count().await?;
        tracing::info!(
            "Database initialized - Media: {}, Cached recommendation lists: {}",
            media_count,
            cache_count
        );

        Ok(Self { pool, repository })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub fn repository(&self) -> &SqliteRepository {
        &self.repository
    }
}
