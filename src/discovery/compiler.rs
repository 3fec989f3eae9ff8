use std::fmt::Display;

use crate::models::{DateRange, FilterState, NumericRange, SortBy};

/// 编译产物：有序的 key→value 参数表，每次编译全新生成
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// 渲染为 URL 编码的查询串（`,` 和 `|` 是上游的布尔组合符，保留原样）
    pub fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    k,
                    urlencoding::encode(v).replace("%2C", ",").replace("%7C", "|")
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl IntoIterator for QueryParams {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}

/// 将筛选状态编译为上游发现接口的扁平参数表
///
/// 纯函数：同一状态编译多次结果一致，不产生副作用，从不失败。
/// 规则：
/// - 字段只有偏离"空默认"才发射（默认排序也省略，缺省即"无偏好"）
/// - 逗号/竖线连接符按字段的历史约定保留，上游把二者当作不同的布尔组合符
/// - 区间字段的 min/max 各自独立，缺省的一半不发射
/// - 日期区间的参数名按内容类型取用
/// - 同一类型 id 同时出现在包含与排除集时只发射到包含侧
/// - 人员字段仅 movie 生效，networks 仅 tv 生效
/// - min>max 的非法区间原样透传，是否纠正由上游裁决
pub fn compile(filters: &FilterState) -> QueryParams {
    let mut params = QueryParams::new();

    // 类型包含/排除集（逗号：OR within, AND across）。
    // 同一 id 不得同时出现在两个参数里：包含侧优先，排除侧剔除重叠项
    push_joined_ids(&mut params, "with_genres", &filters.with_genres, ",");
    let without_genres: Vec<i32> = filters
        .without_genres
        .iter()
        .copied()
        .filter(|id| !filters.with_genres.contains(id))
        .collect();
    push_joined_ids(&mut params, "without_genres", &without_genres, ",");

    // 日期区间按内容类型取基础名
    if filters.is_movie() {
        push_date_range(&mut params, "primary_release_date", &filters.primary_release_date);
        push_date_range(&mut params, "release_date", &filters.release_date);
    } else {
        push_date_range(&mut params, "first_air_date", &filters.first_air_date);
        push_date_range(&mut params, "air_date", &filters.air_date);
    }

    // 数值区间
    push_numeric_range(&mut params, "with_runtime", &filters.runtime);
    push_numeric_range(&mut params, "vote_average", &filters.vote_average);
    push_numeric_range(&mut params, "vote_count", &filters.vote_count);

    // 观看渠道（竖线：单维度内 OR）
    push_joined_ids(&mut params, "with_watch_providers", &filters.with_watch_providers, "|");
    if !filters.with_watch_monetization_types.is_empty() {
        let joined = filters
            .with_watch_monetization_types
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join("|");
        params.push("with_watch_monetization_types", joined);
    }

    // 人员字段仅对 movie 编译
    if filters.is_movie() {
        push_joined_ids(&mut params, "with_cast", &filters.with_cast, ",");
        push_joined_ids(&mut params, "with_crew", &filters.with_crew, ",");
        push_joined_ids(&mut params, "with_people", &filters.with_people, ",");
    }

    push_joined_ids(&mut params, "with_companies", &filters.with_companies, ",");

    // networks 仅对 tv 编译
    if !filters.is_movie() {
        push_joined_ids(&mut params, "with_networks", &filters.with_networks, ",");
    }

    push_joined_ids(&mut params, "with_keywords", &filters.with_keywords, ",");
    push_joined_ids(&mut params, "without_keywords", &filters.without_keywords, ",");

    // 发行方式沿用 movie lab 变体的竖线连接
    push_joined_ids(&mut params, "with_release_type", &filters.with_release_type, "|");

    push_scalar(&mut params, "with_original_language", &filters.original_language);
    push_scalar(&mut params, "region", &filters.region);
    push_scalar(&mut params, "watch_region", &filters.watch_region);
    push_scalar(&mut params, "certification", &filters.certification);
    push_scalar(&mut params, "certification.lte", &filters.certification_lte);
    push_scalar(&mut params, "certification_country", &filters.certification_country);

    // 布尔值编译为字面量字符串，仅显式设置时发射
    push_bool(&mut params, "include_adult", filters.include_adult);
    push_bool(&mut params, "include_video", filters.include_video);
    push_bool(&mut params, "screened_theatrically", filters.screened_theatrically);

    push_scalar(&mut params, "timezone", &filters.timezone);

    // 默认排序靠省略表达
    if filters.sort_by != SortBy::default() {
        params.push("sort_by", filters.sort_by.as_str());
    }

    params
}

fn push_joined_ids(params: &mut QueryParams, key: &str, ids: &[i32], sep: &str) {
    if ids.is_empty() {
        return;
    }
    let joined = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(sep);
    params.push(key, joined);
}

fn push_date_range(params: &mut QueryParams, base: &str, range: &DateRange) {
    if let Some(ref start) = range.start {
        params.push(format!("{}.gte", base), start.clone());
    }
    if let Some(ref end) = range.end {
        params.push(format!("{}.lte", base), end.clone());
    }
}

fn push_numeric_range<T: Display>(params: &mut QueryParams, base: &str, range: &NumericRange<T>) {
    if let Some(ref min) = range.min {
        params.push(format!("{}.gte", base), min.to_string());
    }
    if let Some(ref max) = range.max {
        params.push(format!("{}.lte", base), max.to_string());
    }
}

fn push_scalar(params: &mut QueryParams, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        if !v.is_empty() {
            params.push(key, v.clone());
        }
    }
}

fn push_bool(params: &mut QueryParams, key: &str, value: Option<bool>) {
    if let Some(v) = value {
        params.push(key, if v { "true" } else { "false" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FilterState, MediaType, MonetizationType, SortBy};
    use proptest::prelude::*;

    #[test]
    fn test_default_state_compiles_to_empty_params() {
        for ct in [MediaType::Movie, MediaType::Tv] {
            let params = compile(&FilterState::default_for(ct));
            assert!(params.is_empty(), "default {} state must emit nothing", ct);
        }
    }

    #[test]
    fn test_genres_comma_joined() {
        let mut f = FilterState::default_for(MediaType::Movie);
        f.with_genres = vec![28, 12, 878];
        f.without_genres = vec![27];

        let params = compile(&f);
        assert_eq!(params.get("with_genres"), Some("28,12,878"));
        assert_eq!(params.get("without_genres"), Some("27"));
    }

    #[test]
    fn test_genre_id_in_both_sets_emits_only_include_side() {
        let mut f = FilterState::default_for(MediaType::Movie);
        f.with_genres = vec![28, 12];
        f.without_genres = vec![28, 27];

        let params = compile(&f);
        assert_eq!(params.get("with_genres"), Some("28,12"));
        assert_eq!(params.get("without_genres"), Some("27"));

        // 排除集被全量吞掉时整个参数省略
        f.without_genres = vec![28, 12];
        let params = compile(&f);
        assert_eq!(params.get("with_genres"), Some("28,12"));
        assert!(!params.contains_key("without_genres"));
    }

    #[test]
    fn test_providers_and_monetization_pipe_joined() {
        let mut f = FilterState::default_for(MediaType::Movie);
        f.with_watch_providers = vec![8, 337];
        f.with_watch_monetization_types = vec![MonetizationType::Flatrate, MonetizationType::Ads];

        let params = compile(&f);
        assert_eq!(params.get("with_watch_providers"), Some("8|337"));
        assert_eq!(params.get("with_watch_monetization_types"), Some("flatrate|ads"));
    }

    #[test]
    fn test_release_type_pipe_joined() {
        let mut f = FilterState::default_for(MediaType::Movie);
        f.with_release_type = vec![3, 2];
        assert_eq!(compile(&f).get("with_release_type"), Some("3|2"));
    }

    #[test]
    fn test_range_half_omission() {
        let mut f = FilterState::default_for(MediaType::Movie);
        f.vote_average.min = Some(7.0);

        let params = compile(&f);
        assert_eq!(params.get("vote_average.gte"), Some("7"));
        assert!(!params.contains_key("vote_average.lte"));
    }

    #[test]
    fn test_date_base_names_follow_content_type() {
        let mut movie = FilterState::default_for(MediaType::Movie);
        movie.primary_release_date.start = Some("2020-01-01".to_string());
        let params = compile(&movie);
        assert_eq!(params.get("primary_release_date.gte"), Some("2020-01-01"));

        let mut tv = FilterState::default_for(MediaType::Tv);
        tv.first_air_date.end = Some("2024-12-31".to_string());
        tv.air_date.start = Some("2024-01-01".to_string());
        let params = compile(&tv);
        assert_eq!(params.get("first_air_date.lte"), Some("2024-12-31"));
        assert_eq!(params.get("air_date.gte"), Some("2024-01-01"));
        assert!(!params.contains_key("primary_release_date.gte"));
    }

    #[test]
    fn test_content_type_gating_for_people_and_networks() {
        // tv 状态下填了 cast 也不编译
        let mut tv = FilterState::default_for(MediaType::Tv);
        tv.with_cast = vec![500];
        tv.with_networks = vec![213];
        let params = compile(&tv);
        assert!(!params.contains_key("with_cast"));
        assert_eq!(params.get("with_networks"), Some("213"));

        // movie 状态下填了 networks 也不编译
        let mut movie = FilterState::default_for(MediaType::Movie);
        movie.with_cast = vec![500];
        movie.with_networks = vec![213];
        let params = compile(&movie);
        assert_eq!(params.get("with_cast"), Some("500"));
        assert!(!params.contains_key("with_networks"));
    }

    #[test]
    fn test_booleans_emit_literal_strings_only_when_set() {
        let mut f = FilterState::default_for(MediaType::Movie);
        let params = compile(&f);
        assert!(!params.contains_key("include_adult"));

        f.include_adult = Some(false);
        f.include_video = Some(true);
        let params = compile(&f);
        assert_eq!(params.get("include_adult"), Some("false"));
        assert_eq!(params.get("include_video"), Some("true"));
    }

    #[test]
    fn test_default_sort_omitted_non_default_verbatim() {
        let mut f = FilterState::default_for(MediaType::Movie);
        assert!(!compile(&f).contains_key("sort_by"));

        f.sort_by = SortBy::VoteAverageDesc;
        assert_eq!(compile(&f).get("sort_by"), Some("vote_average.desc"));
    }

    #[test]
    fn test_invalid_range_passes_through_uncorrected() {
        let mut f = FilterState::default_for(MediaType::Movie);
        f.vote_count.min = Some(500);
        f.vote_count.max = Some(100); // min > max

        let params = compile(&f);
        assert_eq!(params.get("vote_count.gte"), Some("500"));
        assert_eq!(params.get("vote_count.lte"), Some("100"));
    }

    #[test]
    fn test_certification_params() {
        let mut f = FilterState::default_for(MediaType::Movie);
        f.certification = Some("R".to_string());
        f.certification_lte = Some("PG-13".to_string());
        f.certification_country = Some("US".to_string());

        let params = compile(&f);
        assert_eq!(params.get("certification"), Some("R"));
        assert_eq!(params.get("certification.lte"), Some("PG-13"));
        assert_eq!(params.get("certification_country"), Some("US"));
    }

    #[test]
    fn test_query_string_keeps_join_characters() {
        let mut f = FilterState::default_for(MediaType::Movie);
        f.with_genres = vec![28, 12];
        f.with_watch_providers = vec![8, 337];

        let qs = compile(&f).to_query_string();
        assert!(qs.contains("with_genres=28,12"));
        assert!(qs.contains("with_watch_providers=8|337"));
    }

    proptest! {
        // 编译纯度：同一状态重复编译结果逐字节一致
        #[test]
        fn prop_compile_is_pure(
            genres in proptest::collection::vec(1..2000i32, 0..6),
            vote_min in proptest::option::of(0..10i32),
            vote_max in proptest::option::of(0..10i32),
            adult in proptest::option::of(any::<bool>()),
        ) {
            let mut f = FilterState::default_for(MediaType::Movie);
            f.with_genres = genres;
            f.vote_average.min = vote_min.map(f64::from);
            f.vote_average.max = vote_max.map(f64::from);
            f.include_adult = adult;

            prop_assert_eq!(compile(&f), compile(&f));
        }
    }
}
