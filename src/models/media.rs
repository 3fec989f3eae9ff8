use serde::{Deserialize, Deserializer, Serialize};

/// 媒体内容类型（上游 API 以 "movie"/"tv" 区分）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Movie => write!(f, "movie"),
            MediaType::Tv => write!(f, "tv"),
        }
    }
}

impl std::str::FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaType::Movie),
            "tv" => Ok(MediaType::Tv),
            _ => Err(format!("Invalid media type: {}", s)),
        }
    }
}

impl MediaType {
    /// 宽松解析：上游的混合列表（如 trending）可能返回 "person" 等
    /// 本系统不认识的类型，解析失败时按缺失处理而不是整页报错
    pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<MediaType>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.and_then(|s| s.parse().ok()))
    }
}

/// 发现结果中的单个条目
///
/// 核心只关心 (media_type, id) 这个去重键，其余目录字段（标题、海报等）
/// 对本引擎透明，原样透传给渲染层
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "MediaType::deserialize_lenient")]
    pub media_type: Option<MediaType>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Entity {
    pub fn new(id: i64, media_type: MediaType) -> Self {
        Self {
            id: Some(id),
            media_type: Some(media_type),
            extra: serde_json::Map::new(),
        }
    }
}

/// 一页发现结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page {
    pub items: Vec<Entity>,
    pub cursor: u32,
    pub has_more: bool,
}

impl Page {
    pub fn empty(cursor: u32) -> Self {
        Self {
            items: Vec::new(),
            cursor,
            has_more: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_deserialize_keeps_opaque_fields() {
        let json = r#"{"id": 603, "media_type": "movie", "title": "The Matrix", "vote_average": 8.2}"#;
        let entity: Entity = serde_json::from_str(json).unwrap();

        assert_eq!(entity.id, Some(603));
        assert_eq!(entity.media_type, Some(MediaType::Movie));
        assert_eq!(entity.extra["title"], "The Matrix");
        assert_eq!(entity.extra["vote_average"], 8.2);
    }

    #[test]
    fn test_entity_unknown_media_type_is_dropped_not_fatal() {
        // trending 混合列表里可能出现 person
        let json = r#"{"id": 1, "media_type": "person", "name": "Keanu Reeves"}"#;
        let entity: Entity = serde_json::from_str(json).unwrap();

        assert_eq!(entity.id, Some(1));
        assert_eq!(entity.media_type, None);
    }

    #[test]
    fn test_entity_missing_id() {
        let json = r#"{"title": "broken row"}"#;
        let entity: Entity = serde_json::from_str(json).unwrap();
        assert_eq!(entity.id, None);
    }
}
