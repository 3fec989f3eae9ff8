//! 应用态筛选与可导航地址串的同步
//!
//! 每次 apply 都会把应用态序列化为地址查询串；浏览器后退等
//! 地址变化反向解析后整体重建 FilterState。序列化与编译器一样
//! 只写非默认字段，保证地址串保持短小且可往返。

use url::form_urlencoded;

use crate::models::{FilterState, MediaType};

/// 序列化为地址查询串（字段名用内部字段名，与上游参数名无关）
pub fn to_location_query(filters: &FilterState) -> String {
    let defaults = FilterState::default_for(filters.content_type);
    let mut ser = form_urlencoded::Serializer::new(String::new());

    ser.append_pair("type", &filters.content_type.to_string());
    if filters.category != defaults.category {
        ser.append_pair("category", &filters.category.to_string());
    }

    append_ids(&mut ser, "with_genres", &filters.with_genres);
    append_ids(&mut ser, "without_genres", &filters.without_genres);

    append_date(&mut ser, "primary_release_date", &filters.primary_release_date);
    append_date(&mut ser, "release_date", &filters.release_date);
    append_date(&mut ser, "first_air_date", &filters.first_air_date);
    append_date(&mut ser, "air_date", &filters.air_date);

    append_opt(&mut ser, "runtime.gte", &filters.runtime.min.map(|v| v.to_string()));
    append_opt(&mut ser, "runtime.lte", &filters.runtime.max.map(|v| v.to_string()));
    append_opt(&mut ser, "vote_average.gte", &filters.vote_average.min.map(|v| v.to_string()));
    append_opt(&mut ser, "vote_average.lte", &filters.vote_average.max.map(|v| v.to_string()));
    append_opt(&mut ser, "vote_count.gte", &filters.vote_count.min.map(|v| v.to_string()));
    append_opt(&mut ser, "vote_count.lte", &filters.vote_count.max.map(|v| v.to_string()));

    append_ids(&mut ser, "with_watch_providers", &filters.with_watch_providers);
    if !filters.with_watch_monetization_types.is_empty() {
        let joined = filters
            .with_watch_monetization_types
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(",");
        ser.append_pair("with_watch_monetization_types", &joined);
    }

    append_ids(&mut ser, "with_cast", &filters.with_cast);
    append_ids(&mut ser, "with_crew", &filters.with_crew);
    append_ids(&mut ser, "with_people", &filters.with_people);
    append_ids(&mut ser, "with_companies", &filters.with_companies);
    append_ids(&mut ser, "with_networks", &filters.with_networks);
    append_ids(&mut ser, "with_keywords", &filters.with_keywords);
    append_ids(&mut ser, "without_keywords", &filters.without_keywords);
    append_ids(&mut ser, "with_release_type", &filters.with_release_type);

    append_opt(&mut ser, "original_language", &filters.original_language);
    append_opt(&mut ser, "region", &filters.region);
    append_opt(&mut ser, "watch_region", &filters.watch_region);
    append_opt(&mut ser, "certification", &filters.certification);
    append_opt(&mut ser, "certification.lte", &filters.certification_lte);
    append_opt(&mut ser, "certification_country", &filters.certification_country);
    append_bool(&mut ser, "include_adult", filters.include_adult);
    append_bool(&mut ser, "include_video", filters.include_video);
    append_bool(&mut ser, "screened_theatrically", filters.screened_theatrically);
    append_opt(&mut ser, "timezone", &filters.timezone);

    if filters.sort_by != defaults.sort_by {
        ser.append_pair("sort_by", filters.sort_by.as_str());
    }

    ser.finish()
}

/// 从地址查询串重建筛选状态
///
/// 未知键与无法解析的值一律忽略（防御式），缺失的 type 按 movie 处理
pub fn from_location_query(query: &str) -> FilterState {
    let pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let content_type = pairs
        .iter()
        .find(|(k, _)| k == "type")
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(MediaType::Movie);

    let mut filters = FilterState::default_for(content_type);

    for (key, value) in &pairs {
        match key.as_str() {
            "type" => {}
            "category" => {
                if let Ok(c) = value.parse() {
                    filters.category = c;
                }
            }
            "with_genres" => filters.with_genres = parse_ids(value),
            "without_genres" => filters.without_genres = parse_ids(value),
            "primary_release_date.gte" => filters.primary_release_date.start = non_empty(value),
            "primary_release_date.lte" => filters.primary_release_date.end = non_empty(value),
            "release_date.gte" => filters.release_date.start = non_empty(value),
            "release_date.lte" => filters.release_date.end = non_empty(value),
            "first_air_date.gte" => filters.first_air_date.start = non_empty(value),
            "first_air_date.lte" => filters.first_air_date.end = non_empty(value),
            "air_date.gte" => filters.air_date.start = non_empty(value),
            "air_date.lte" => filters.air_date.end = non_empty(value),
            "runtime.gte" => filters.runtime.min = value.parse().ok(),
            "runtime.lte" => filters.runtime.max = value.parse().ok(),
            "vote_average.gte" => filters.vote_average.min = value.parse().ok(),
            "vote_average.lte" => filters.vote_average.max = value.parse().ok(),
            "vote_count.gte" => filters.vote_count.min = value.parse().ok(),
            "vote_count.lte" => filters.vote_count.max = value.parse().ok(),
            "with_watch_providers" => filters.with_watch_providers = parse_ids(value),
            "with_watch_monetization_types" => {
                filters.with_watch_monetization_types = value
                    .split(',')
                    .filter_map(|s| s.trim().parse().ok())
                    .collect();
            }
            "with_cast" => filters.with_cast = parse_ids(value),
            "with_crew" => filters.with_crew = parse_ids(value),
            "with_people" => filters.with_people = parse_ids(value),
            "with_companies" => filters.with_companies = parse_ids(value),
            "with_networks" => filters.with_networks = parse_ids(value),
            "with_keywords" => filters.with_keywords = parse_ids(value),
            "without_keywords" => filters.without_keywords = parse_ids(value),
            "with_release_type" => filters.with_release_type = parse_ids(value),
            "original_language" => filters.original_language = non_empty(value),
            "region" => filters.region = non_empty(value),
            "watch_region" => filters.watch_region = non_empty(value),
            "certification" => filters.certification = non_empty(value),
            "certification.lte" => filters.certification_lte = non_empty(value),
            "certification_country" => filters.certification_country = non_empty(value),
            "include_adult" => filters.include_adult = parse_bool(value),
            "include_video" => filters.include_video = parse_bool(value),
            "screened_theatrically" => filters.screened_theatrically = parse_bool(value),
            "timezone" => filters.timezone = non_empty(value),
            "sort_by" => {
                if let Ok(s) = value.parse() {
                    filters.sort_by = s;
                }
            }
            _ => {}
        }
    }

    filters
}

fn append_ids(ser: &mut form_urlencoded::Serializer<'_, String>, key: &str, ids: &[i32]) {
    if ids.is_empty() {
        return;
    }
    let joined = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    ser.append_pair(key, &joined);
}

fn append_date(
    ser: &mut form_urlencoded::Serializer<'_, String>,
    base: &str,
    range: &crate::models::DateRange,
) {
    if let Some(ref start) = range.start {
        ser.append_pair(&format!("{}.gte", base), start);
    }
    if let Some(ref end) = range.end {
        ser.append_pair(&format!("{}.lte", base), end);
    }
}

fn append_opt(ser: &mut form_urlencoded::Serializer<'_, String>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        if !v.is_empty() {
            ser.append_pair(key, v);
        }
    }
}

fn append_bool(ser: &mut form_urlencoded::Serializer<'_, String>, key: &str, value: Option<bool>) {
    if let Some(v) = value {
        ser.append_pair(key, if v { "true" } else { "false" });
    }
}

fn parse_ids(raw: &str) -> Vec<i32> {
    raw.split(',').filter_map(|s| s.trim().parse().ok()).collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn non_empty(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MonetizationType, SortBy};

    #[test]
    fn test_default_state_serializes_to_type_only() {
        let f = FilterState::default_for(MediaType::Tv);
        assert_eq!(to_location_query(&f), "type=tv");
    }

    #[test]
    fn test_round_trip_preserves_filters() {
        let mut f = FilterState::default_for(MediaType::Tv);
        f.with_genres = vec![18, 10765];
        f.with_networks = vec![213];
        f.first_air_date.start = Some("2020-01-01".to_string());
        f.vote_average.min = Some(7.5);
        f.with_watch_monetization_types = vec![MonetizationType::Flatrate];
        f.include_adult = Some(false);
        f.sort_by = SortBy::FirstAirDateDesc;

        let query = to_location_query(&f);
        let back = from_location_query(&query);
        assert_eq!(back, f);
    }

    #[test]
    fn test_unknown_keys_and_garbage_values_ignored() {
        let f = from_location_query("type=movie&bogus=1&vote_count.gte=abc&with_genres=28,x,12");
        assert_eq!(f.content_type, MediaType::Movie);
        assert_eq!(f.vote_count.min, None);
        // 无法解析的片段跳过，不拖垮整个列表
        assert_eq!(f.with_genres, vec![28, 12]);
    }

    #[test]
    fn test_missing_type_defaults_to_movie() {
        let f = from_location_query("with_genres=28");
        assert_eq!(f.content_type, MediaType::Movie);
    }
}
