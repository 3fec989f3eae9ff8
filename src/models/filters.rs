use serde::{Deserialize, Serialize};

use super::MediaType;

/// 浏览类目预设，决定上游请求走哪个端点
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Trending,
    Popular,
    TopRated,
    Upcoming,
    NowPlaying,
    OnTheAir,
    AiringToday,
    Discover,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Category::Trending => "trending",
            Category::Popular => "popular",
            Category::TopRated => "top_rated",
            Category::Upcoming => "upcoming",
            Category::NowPlaying => "now_playing",
            Category::OnTheAir => "on_the_air",
            Category::AiringToday => "airing_today",
            Category::Discover => "discover",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trending" => Ok(Category::Trending),
            "popular" => Ok(Category::Popular),
            "top_rated" => Ok(Category::TopRated),
            "upcoming" => Ok(Category::Upcoming),
            "now_playing" => Ok(Category::NowPlaying),
            "on_the_air" => Ok(Category::OnTheAir),
            "airing_today" => Ok(Category::AiringToday),
            "discover" => Ok(Category::Discover),
            _ => Err(format!("Invalid category: {}", s)),
        }
    }
}

/// 日期区间，两端均可缺省，值为 ISO 日期字符串（YYYY-MM-DD）
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl DateRange {
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// 数值区间，两端均可缺省
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NumericRange<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T> NumericRange<T> {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// 观看变现方式（上游以竖线连接的枚举串）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MonetizationType {
    Flatrate,
    Free,
    Ads,
    Rent,
    Buy,
}

impl MonetizationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonetizationType::Flatrate => "flatrate",
            MonetizationType::Free => "free",
            MonetizationType::Ads => "ads",
            MonetizationType::Rent => "rent",
            MonetizationType::Buy => "buy",
        }
    }
}

impl std::str::FromStr for MonetizationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flatrate" => Ok(MonetizationType::Flatrate),
            "free" => Ok(MonetizationType::Free),
            "ads" => Ok(MonetizationType::Ads),
            "rent" => Ok(MonetizationType::Rent),
            "buy" => Ok(MonetizationType::Buy),
            _ => Err(format!("Invalid monetization type: {}", s)),
        }
    }
}

/// 排序键，逐字对应上游 `sort_by` 参数（`<field>.<asc|desc>`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SortBy {
    PopularityAsc,
    PopularityDesc,
    VoteAverageAsc,
    VoteAverageDesc,
    VoteCountAsc,
    VoteCountDesc,
    PrimaryReleaseDateAsc,
    PrimaryReleaseDateDesc,
    FirstAirDateAsc,
    FirstAirDateDesc,
    ReleaseDateAsc,
    ReleaseDateDesc,
    RevenueAsc,
    RevenueDesc,
    OriginalTitleAsc,
    OriginalTitleDesc,
}

impl Default for SortBy {
    fn default() -> Self {
        SortBy::PopularityDesc
    }
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::PopularityAsc => "popularity.asc",
            SortBy::PopularityDesc => "popularity.desc",
            SortBy::VoteAverageAsc => "vote_average.asc",
            SortBy::VoteAverageDesc => "vote_average.desc",
            SortBy::VoteCountAsc => "vote_count.asc",
            SortBy::VoteCountDesc => "vote_count.desc",
            SortBy::PrimaryReleaseDateAsc => "primary_release_date.asc",
            SortBy::PrimaryReleaseDateDesc => "primary_release_date.desc",
            SortBy::FirstAirDateAsc => "first_air_date.asc",
            SortBy::FirstAirDateDesc => "first_air_date.desc",
            SortBy::ReleaseDateAsc => "release_date.asc",
            SortBy::ReleaseDateDesc => "release_date.desc",
            SortBy::RevenueAsc => "revenue.asc",
            SortBy::RevenueDesc => "revenue.desc",
            SortBy::OriginalTitleAsc => "original_title.asc",
            SortBy::OriginalTitleDesc => "original_title.desc",
        }
    }
}

impl std::fmt::Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "popularity.asc" => Ok(SortBy::PopularityAsc),
            "popularity.desc" => Ok(SortBy::PopularityDesc),
            "vote_average.asc" => Ok(SortBy::VoteAverageAsc),
            "vote_average.desc" => Ok(SortBy::VoteAverageDesc),
            "vote_count.asc" => Ok(SortBy::VoteCountAsc),
            "vote_count.desc" => Ok(SortBy::VoteCountDesc),
            "primary_release_date.asc" => Ok(SortBy::PrimaryReleaseDateAsc),
            "primary_release_date.desc" => Ok(SortBy::PrimaryReleaseDateDesc),
            "first_air_date.asc" => Ok(SortBy::FirstAirDateAsc),
            "first_air_date.desc" => Ok(SortBy::FirstAirDateDesc),
            "release_date.asc" => Ok(SortBy::ReleaseDateAsc),
            "release_date.desc" => Ok(SortBy::ReleaseDateDesc),
            "revenue.asc" => Ok(SortBy::RevenueAsc),
            "revenue.desc" => Ok(SortBy::RevenueDesc),
            "original_title.asc" => Ok(SortBy::OriginalTitleAsc),
            "original_title.desc" => Ok(SortBy::OriginalTitleDesc),
            _ => Err(format!("Invalid sort key: {}", s)),
        }
    }
}

impl TryFrom<String> for SortBy {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SortBy> for String {
    fn from(s: SortBy) -> String {
        s.as_str().to_string()
    }
}

/// 一个浏览会话的全部筛选状态
///
/// 生命周期：按内容类型创建默认值，由用户交互逐字段修改，
/// 重置或切换内容类型时整体替换（同时清空类型专属字段），
/// 请求层永远不会修改它
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterState {
    pub content_type: MediaType,
    pub category: Category,

    // 类型筛选（包含/排除集）
    pub with_genres: Vec<i32>,
    pub without_genres: Vec<i32>,

    // 日期区间：movie 用 primary_release_date / release_date，
    // tv 用 first_air_date / air_date，编译时按内容类型取用
    pub primary_release_date: DateRange,
    pub release_date: DateRange,
    pub first_air_date: DateRange,
    pub air_date: DateRange,

    // 数值区间
    pub runtime: NumericRange<i32>,
    pub vote_average: NumericRange<f64>,
    pub vote_count: NumericRange<i32>,

    // 列表筛选
    pub with_watch_providers: Vec<i32>,
    pub with_watch_monetization_types: Vec<MonetizationType>,
    pub with_cast: Vec<i32>,
    pub with_crew: Vec<i32>,
    pub with_people: Vec<i32>,
    pub with_companies: Vec<i32>,
    pub with_networks: Vec<i32>,
    pub with_keywords: Vec<i32>,
    pub without_keywords: Vec<i32>,
    pub with_release_type: Vec<i32>,

    // 标量筛选
    pub original_language: Option<String>,
    pub region: Option<String>,
    pub watch_region: Option<String>,
    pub certification: Option<String>,
    pub certification_lte: Option<String>,
    pub certification_country: Option<String>,
    pub include_adult: Option<bool>,
    pub include_video: Option<bool>,
    pub screened_theatrically: Option<bool>,
    pub timezone: Option<String>,

    pub sort_by: SortBy,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::default_for(MediaType::Movie)
    }
}

impl FilterState {
    /// 按内容类型创建默认筛选状态
    pub fn default_for(content_type: MediaType) -> Self {
        Self {
            content_type,
            category: Category::Discover,
            with_genres: Vec::new(),
            without_genres: Vec::new(),
            primary_release_date: DateRange::default(),
            release_date: DateRange::default(),
            first_air_date: DateRange::default(),
            air_date: DateRange::default(),
            runtime: NumericRange::default(),
            vote_average: NumericRange::default(),
            vote_count: NumericRange::default(),
            with_watch_providers: Vec::new(),
            with_watch_monetization_types: Vec::new(),
            with_cast: Vec::new(),
            with_crew: Vec::new(),
            with_people: Vec::new(),
            with_companies: Vec::new(),
            with_networks: Vec::new(),
            with_keywords: Vec::new(),
            without_keywords: Vec::new(),
            with_release_type: Vec::new(),
            original_language: None,
            region: None,
            watch_region: None,
            certification: None,
            certification_lte: None,
            certification_country: None,
            include_adult: None,
            include_video: None,
            screened_theatrically: None,
            timezone: None,
            sort_by: SortBy::default(),
        }
    }

    /// 切换内容类型：整体替换为新类型的默认状态
    /// （同时清掉 cast/crew/networks 等类型专属列表）
    pub fn switch_content_type(&self, content_type: MediaType) -> Self {
        Self::default_for(content_type)
    }

    pub fn is_movie(&self) -> bool {
        self.content_type == MediaType::Movie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sort_is_popularity_desc() {
        assert_eq!(SortBy::default(), SortBy::PopularityDesc);
        assert_eq!(SortBy::default().as_str(), "popularity.desc");
    }

    #[test]
    fn test_sort_by_round_trip() {
        for s in [
            "popularity.desc",
            "vote_average.asc",
            "first_air_date.desc",
            "original_title.asc",
        ] {
            let parsed: SortBy = s.parse().unwrap();
            assert_eq!(parsed.as_str(), s);
        }
    }

    #[test]
    fn test_switch_content_type_clears_type_specific_lists() {
        let mut movie = FilterState::default_for(MediaType::Movie);
        movie.with_cast = vec![500, 287];
        movie.with_genres = vec![28];

        let tv = movie.switch_content_type(MediaType::Tv);
        assert_eq!(tv.content_type, MediaType::Tv);
        assert!(tv.with_cast.is_empty());
        // 整体替换，通用字段也回到默认
        assert!(tv.with_genres.is_empty());
    }

    #[test]
    fn test_filter_state_serde_round_trip() {
        let mut f = FilterState::default_for(MediaType::Tv);
        f.with_networks = vec![213];
        f.vote_average.min = Some(7.5);
        f.sort_by = SortBy::FirstAirDateDesc;

        let json = serde_json::to_string(&f).unwrap();
        let back: FilterState = serde_json::from_str(&json).unwrap();
        assert_eq!(f, back);
    }
}
