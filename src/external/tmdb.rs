use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::cache::DiscoverCache;
use crate::discovery::{compile, DiscoveryFetcher, FetchError};
use crate::models::{Category, Entity, FilterState, MediaType, Page};

/// 上游发现 API 客户端
///
/// 把 (内容类型, 类目) 映射到端点路径，附上编译后的参数表取一页结果。
/// 响应按"路径?page=N&参数串"为键缓存 30 分钟。
#[derive(Clone)]
pub struct TmdbDiscoverClient {
    client: Client,
    api_key: String,
    base_url: String,
    cache: DiscoverCache,
}

impl TmdbDiscoverClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://api.themoviedb.org/3".to_string(),
            cache: DiscoverCache::new(),
        }
    }

    /// 从 TMDB_API_KEY 环境变量构建
    pub fn from_env() -> Option<Self> {
        std::env::var("TMDB_API_KEY").ok().map(Self::new)
    }

    /// 测试用：指向本地 mock 服务
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn cache(&self) -> &DiscoverCache {
        &self.cache
    }

    /// 类目预设对应的端点路径
    fn endpoint_path(content_type: MediaType, category: Category) -> String {
        match (category, content_type) {
            (Category::Trending, ct) => format!("/trending/{}/week", ct),
            (Category::Popular, ct) => format!("/{}/popular", ct),
            (Category::TopRated, ct) => format!("/{}/top_rated", ct),
            (Category::Upcoming, MediaType::Movie) => "/movie/upcoming".to_string(),
            (Category::Upcoming, MediaType::Tv) => "/tv/on_the_air".to_string(),
            (Category::NowPlaying, MediaType::Movie) => "/movie/now_playing".to_string(),
            (Category::NowPlaying, MediaType::Tv) => "/tv/airing_today".to_string(),
            (Category::OnTheAir, MediaType::Movie) => "/movie/upcoming".to_string(),
            (Category::OnTheAir, MediaType::Tv) => "/tv/on_the_air".to_string(),
            (Category::AiringToday, MediaType::Movie) => "/movie/now_playing".to_string(),
            (Category::AiringToday, MediaType::Tv) => "/tv/airing_today".to_string(),
            (Category::Discover, ct) => format!("/discover/{}", ct),
        }
    }
}

#[async_trait]
impl DiscoveryFetcher for TmdbDiscoverClient {
    async fn fetch_page(&self, filters: &FilterState, cursor: u32) -> Result<Page, FetchError> {
        let params = compile(filters);
        let path = Self::endpoint_path(filters.content_type, filters.category);
        let cache_key = format!("{}?page={}&{}", path, cursor, params.to_query_string());

        // 检查缓存
        if let Some(page) = self.cache.get_page(&cache_key) {
            tracing::debug!("Cache hit for discover page: {}", cache_key);
            return Ok(page);
        }

        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url).query(&[
            ("api_key", self.api_key.as_str()),
            ("page", &cursor.to_string()),
        ]);
        for (key, value) in params.iter() {
            request = request.query(&[(key, value)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Upstream(response.status().as_u16()));
        }

        let body: DiscoverResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        let page = Page {
            items: body.results,
            cursor: body.page,
            has_more: body.page < body.total_pages,
        };

        // 缓存结果
        self.cache.set_page(cache_key, page.clone());

        Ok(page)
    }
}

/// 上游发现响应
#[derive(Debug, Deserialize)]
struct DiscoverResponse {
    page: u32,
    results: Vec<Entity>,
    total_pages: u32,
    #[allow(dead_code)]
    total_results: Option<u32>,
}
