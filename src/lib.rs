// 媒体发现后端库
//
// 本库提供内容发现的核心功能，包括：
// - 筛选状态与编译（FilterState → 上游查询参数）
// - 防抖取数控制与无限滚动结果累加
// - 上游发现 API 客户端与响应缓存
// - 推荐预计算批处理任务与其缓存表

pub mod database;
pub mod discovery;
pub mod external;
pub mod models;
pub mod services;
