use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::models::Page;

/// 缓存条目
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    created_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn new(data: T, ttl: Duration) -> Self {
        Self {
            data,
            created_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }
}

/// 内存缓存实现
#[derive(Debug, Clone)]
pub struct MemoryCache<T> {
    cache: Arc<RwLock<HashMap<String, CacheEntry<T>>>>,
    default_ttl: Duration,
}

impl<T: Clone> MemoryCache<T> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            default_ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let cache = self.cache.read().ok()?;
        let entry = cache.get(key)?;

        if entry.is_expired() {
            drop(cache);
            self.remove(key);
            None
        } else {
            Some(entry.data.clone())
        }
    }

    pub fn set(&self, key: String, value: T) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    pub fn set_with_ttl(&self, key: String, value: T, ttl: Duration) {
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key, CacheEntry::new(value, ttl));
        }
    }

    pub fn remove(&self, key: &str) {
        if let Ok(mut cache) = self.cache.write() {
            cache.remove(key);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    pub fn cleanup_expired(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.retain(|_, entry| !entry.is_expired());
        }
    }

    pub fn size(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }
}

/// 发现接口响应缓存
///
/// 键是端点路径加完整编译参数串，同一筛选组合的同一页在 TTL 内
/// 不重复请求上游
#[derive(Debug, Clone)]
pub struct DiscoverCache {
    pages: MemoryCache<Page>,
}

impl DiscoverCache {
    pub fn new() -> Self {
        Self {
            // 发现结果缓存30分钟
            pages: MemoryCache::new(Duration::from_secs(30 * 60)),
        }
    }

    pub fn get_page(&self, key: &str) -> Option<Page> {
        self.pages.get(key)
    }

    pub fn set_page(&self, key: String, page: Page) {
        self.pages.set(key, page);
    }

    pub fn cleanup_expired(&self) {
        self.pages.cleanup_expired();
    }

    pub fn clear_all(&self) {
        self.pages.clear();
    }

    pub fn size(&self) -> usize {
        self.pages.size()
    }
}

impl Default for DiscoverCache {
    fn default() -> Self {
        Self::new()
    }
}
