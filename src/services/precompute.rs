use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::database::{CatalogRepository, RecommendationRepository};
use crate::models::{CatalogEntity, PrecomputedEntry};

/// 预计算任务需要的完整存储能力
pub trait PrecomputeRepository: CatalogRepository + RecommendationRepository {}

impl<T: CatalogRepository + RecommendationRepository> PrecomputeRepository for T {}

/// trending 列表长度
pub const TRENDING_LIST_SIZE: usize = 20;
/// similar 列表长度
pub const SIMILAR_LIST_SIZE: usize = 12;

/// 任务运行报告，供运维观察
#[derive(Debug, Clone)]
pub struct PrecomputeReport {
    pub entries_written: usize,
    pub cache_keys: Vec<String>,
}

/// 推荐预计算批处理任务
///
/// 每次调用完整跑一遍 Load → Trending → Similarity → Report 四个阶段。
/// 运行期间对 recommendation_cache 持隐式独占写意图（运维约定，
/// 不靠锁强制）；各阶段之间没有事务边界，并发读取方可能看到
/// 新 trending 配旧 similar_* 的中间状态，这是契约的一部分。
pub struct RecommendationPrecomputer {
    repository: Arc<dyn PrecomputeRepository>,
}

impl RecommendationPrecomputer {
    pub fn new(repository: Arc<dyn PrecomputeRepository>) -> Self {
        Self { repository }
    }

    /// 跑一次完整任务
    ///
    /// Load 阶段失败是致命的（没有计算对象），本次运行不落任何写入；
    /// 之后的阶段按条目隔离失败，只记日志不中断
    pub async fn run(&self) -> Result<PrecomputeReport> {
        tracing::info!("Loading catalog with popularity counters...");
        let entities = self
            .repository
            .load_catalog_with_popularity()
            .await
            .context("failed to load catalog, aborting precompute run")?;
        tracing::info!("Loaded {} catalog entities", entities.len());

        let now = Utc::now();
        let mut entries_written = 0;

        // Trending pass
        let trending = rank_trending(&entities, now, TRENDING_LIST_SIZE);
        match self
            .repository
            .upsert_entry(PrecomputedEntry::TRENDING_KEY, &trending, now)
            .await
        {
            Ok(()) => {
                entries_written += 1;
                tracing::info!("Trending pass complete, ranked {} entities", trending.len());
            }
            Err(e) => tracing::warn!("Failed to write trending list: {}", e),
        }

        // Similarity pass，逐条目隔离失败
        let mut skipped_no_genres = 0;
        for entity in &entities {
            let Some(ranked) = rank_similar(entity, &entities, SIMILAR_LIST_SIZE) else {
                // 无类型数据：不写条目也不报错
                skipped_no_genres += 1;
                continue;
            };

            let key = PrecomputedEntry::similar_key(entity.id);
            match self.repository.upsert_entry(&key, &ranked, now).await {
                Ok(()) => entries_written += 1,
                Err(e) => {
                    tracing::warn!("Skipping similar list for entity {}: {}", entity.id, e);
                }
            }
        }
        tracing::info!(
            "Similarity pass complete ({} entities without genre data skipped)",
            skipped_no_genres
        );

        // Report
        let cache_keys = match self.repository.list_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!("Failed to list cache keys for report: {}", e);
                Vec::new()
            }
        };

        Ok(PrecomputeReport {
            entries_written,
            cache_keys,
        })
    }
}

/// 热度榜：按 `(likes*2+views)/(age_hours+2)` 降序取前 size 个 id
///
/// 得分相同保持载入顺序（稳定排序）
pub fn rank_trending(entities: &[CatalogEntity], now: DateTime<Utc>, size: usize) -> Vec<i64> {
    let mut scored: Vec<(f64, i64)> = entities
        .iter()
        .map(|e| (e.trending_score(now), e.id))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().take(size).map(|(_, id)| id).collect()
}

/// 相似列表：与目标实体共享至少一个类型标签的其他实体，
/// 按 `likes+views` 降序取前 size 个
///
/// 目标实体没有类型数据时返回 None（调用方整体跳过，不写条目）。
/// 匹配刻意保持对逗号分隔类型串的大小写不敏感令牌比对，
/// 改成按 id 联表会改变排名结果。
pub fn rank_similar(
    entity: &CatalogEntity,
    entities: &[CatalogEntity],
    size: usize,
) -> Option<Vec<i64>> {
    let tokens: HashSet<String> = entity.genre_tokens().into_iter().collect();
    if tokens.is_empty() {
        return None;
    }

    let mut candidates: Vec<(i64, i64)> = entities
        .iter()
        .filter(|other| other.id != entity.id)
        .filter(|other| other.genre_tokens().iter().any(|t| tokens.contains(t)))
        .map(|other| (other.engagement(), other.id))
        .collect();
    candidates.sort_by(|a, b| b.0.cmp(&a.0));

    Some(candidates.into_iter().take(size).map(|(_, id)| id).collect())
}
