use std::collections::HashSet;

use crate::models::{Entity, MediaType, Page};

/// 无限滚动结果累加器
///
/// 把连续页面合并为一个按首次出现顺序排列、按 (media_type, id) 去重的
/// 结果列表。应用态筛选变化（新的 generation）时整体清空，
/// 同代内的 load_more 则保留已有条目。
#[derive(Debug, Clone)]
pub struct InfiniteResultStore {
    items: Vec<Entity>,
    seen: HashSet<(MediaType, i64)>,
    default_media_type: MediaType,
    has_more: bool,
    last_cursor: u32,
}

impl InfiniteResultStore {
    pub fn new(default_media_type: MediaType) -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
            default_media_type,
            has_more: false,
            last_cursor: 0,
        }
    }

    /// 清空到初始状态（应用态变化时由控制器调用）
    pub fn reset(&mut self, default_media_type: MediaType) {
        self.items.clear();
        self.seen.clear();
        self.default_media_type = default_media_type;
        self.has_more = false;
        self.last_cursor = 0;
    }

    /// 合并一页结果
    ///
    /// 缺 id 的畸形条目直接丢弃；条目未带 media_type 时按当前
    /// 浏览上下文的内容类型补齐，再参与去重
    pub fn absorb_page(&mut self, page: &Page) {
        for item in &page.items {
            let Some(id) = item.id else {
                tracing::debug!("dropping result item without id");
                continue;
            };
            let media_type = item.media_type.unwrap_or(self.default_media_type);
            if !self.seen.insert((media_type, id)) {
                continue; // 跨页重复，保留首次出现
            }

            let mut entity = item.clone();
            entity.media_type = Some(media_type);
            self.items.push(entity);
        }

        self.has_more = page.has_more;
        self.last_cursor = page.cursor;
    }

    pub fn items(&self) -> &[Entity] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 最近一页的 has_more 透传
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn last_cursor(&self) -> u32 {
        self.last_cursor
    }

    /// 下一页游标（尚未收到任何页时从第 1 页开始）
    pub fn next_cursor(&self) -> u32 {
        self.last_cursor + 1
    }

    /// 触发器契约：调用方的接近信号触发且既有后续页又不在请求中时，
    /// 才应该发起 load_more
    pub fn should_load_more(&self, trigger_fired: bool, is_fetching: bool) -> bool {
        trigger_fired && self.has_more && !is_fetching
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(items: Vec<Entity>, cursor: u32, has_more: bool) -> Page {
        Page {
            items,
            cursor,
            has_more,
        }
    }

    #[test]
    fn test_pages_accumulate_in_first_seen_order() {
        let mut store = InfiniteResultStore::new(MediaType::Movie);
        store.absorb_page(&page(
            vec![Entity::new(1, MediaType::Movie), Entity::new(2, MediaType::Movie)],
            1,
            true,
        ));
        store.absorb_page(&page(
            vec![Entity::new(3, MediaType::Movie), Entity::new(4, MediaType::Movie)],
            2,
            false,
        ));

        let ids: Vec<i64> = store.items().iter().filter_map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert!(!store.has_more());
    }

    #[test]
    fn test_duplicates_across_pages_dropped() {
        // 上游分页窗口漂移时同一条目可能出现在相邻两页
        let mut store = InfiniteResultStore::new(MediaType::Movie);
        store.absorb_page(&page(
            vec![Entity::new(1, MediaType::Movie), Entity::new(2, MediaType::Movie)],
            1,
            true,
        ));
        store.absorb_page(&page(
            vec![Entity::new(2, MediaType::Movie), Entity::new(3, MediaType::Movie)],
            2,
            true,
        ));

        let ids: Vec<i64> = store.items().iter().filter_map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_same_id_different_media_type_both_kept() {
        let mut store = InfiniteResultStore::new(MediaType::Movie);
        store.absorb_page(&page(
            vec![Entity::new(7, MediaType::Movie), Entity::new(7, MediaType::Tv)],
            1,
            false,
        ));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_items_without_id_are_dropped() {
        let broken = Entity {
            id: None,
            media_type: Some(MediaType::Movie),
            extra: serde_json::Map::new(),
        };
        let mut store = InfiniteResultStore::new(MediaType::Movie);
        store.absorb_page(&page(vec![broken, Entity::new(1, MediaType::Movie)], 1, false));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_missing_media_type_falls_back_to_context() {
        let mut item = Entity::new(9, MediaType::Tv);
        item.media_type = None;
        let mut store = InfiniteResultStore::new(MediaType::Tv);
        store.absorb_page(&page(vec![item], 1, false));
        assert_eq!(store.items()[0].media_type, Some(MediaType::Tv));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut store = InfiniteResultStore::new(MediaType::Movie);
        store.absorb_page(&page(vec![Entity::new(1, MediaType::Movie)], 1, true));
        store.reset(MediaType::Tv);

        assert!(store.is_empty());
        assert!(!store.has_more());
        assert_eq!(store.next_cursor(), 1);
    }

    #[test]
    fn test_should_load_more_contract() {
        let mut store = InfiniteResultStore::new(MediaType::Movie);
        store.absorb_page(&page(vec![Entity::new(1, MediaType::Movie)], 1, true));

        assert!(store.should_load_more(true, false));
        assert!(!store.should_load_more(true, true)); // 请求中不触发
        assert!(!store.should_load_more(false, false)); // 信号没响不触发

        store.absorb_page(&page(vec![], 2, false));
        assert!(!store.should_load_more(true, false)); // 没有后续页
    }
}
