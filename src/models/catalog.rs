use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 目录实体，联表人气计数后的一行（views/likes 缺省为 0）
#[derive(Debug, Clone, FromRow)]
pub struct CatalogEntity {
    pub id: i64,
    pub media_type: String,
    pub title: String,
    pub genres: Option<String>, // 逗号分隔的类型名串
    pub created_at: DateTime<Utc>,
    pub views: i64,
    pub likes: i64,
}

impl CatalogEntity {
    /// 热度得分：`(likes*2 + views) / (age_hours + 2)`
    ///
    /// age_hours 取任务运行时刻距实体创建的墙钟小时数，
    /// 随时间单调增长，过期的任务运行只会低估新鲜度
    pub fn trending_score(&self, now: DateTime<Utc>) -> f64 {
        let age_hours = (now - self.created_at).num_seconds().max(0) as f64 / 3600.0;
        (self.likes * 2 + self.views) as f64 / (age_hours + 2.0)
    }

    /// 相似度候选的排序依据
    pub fn engagement(&self) -> i64 {
        self.likes + self.views
    }

    /// 类型标签：对逗号分隔串做去空格、转小写的令牌化
    pub fn genre_tokens(&self) -> Vec<String> {
        self.genres
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect()
    }

    pub fn has_genres(&self) -> bool {
        !self.genre_tokens().is_empty()
    }
}

/// 预计算缓存条目：key → 有序 id 列表
///
/// key 有两族："trending" 字面量，以及每实体一条的 "similar_<id>"
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrecomputedEntry {
    pub key: String,
    pub ranked_ids: Vec<i64>,
    pub last_updated: DateTime<Utc>,
}

impl PrecomputedEntry {
    pub const TRENDING_KEY: &'static str = "trending";

    pub fn similar_key(entity_id: i64) -> String {
        format!("similar_{}", entity_id)
    }

    /// 存储格式：逗号连接的整数串
    pub fn join_ids(ids: &[i64]) -> String {
        ids.iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// 解析存储格式，无法解析的片段跳过
    pub fn parse_ids(raw: &str) -> Vec<i64> {
        raw.split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect()
    }
}
