use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};

use super::location;
use super::store::InfiniteResultStore;
use crate::models::{Entity, FilterState, MediaType, Page};

/// 默认防抖窗口
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// 读取 DEBOUNCE_MS 环境变量的防抖窗口，缺省 250ms
pub fn debounce_from_env() -> Duration {
    debounce_from_value(std::env::var("DEBOUNCE_MS").ok())
}

fn debounce_from_value(value: Option<String>) -> Duration {
    value
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_DEBOUNCE)
}

/// 发现请求错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("上游接口错误: HTTP {0}")]
    Upstream(u16),

    #[error("请求失败: {0}")]
    Transport(String),

    #[error("响应解析失败: {0}")]
    Decode(String),
}

/// 发现接口抽象：按应用态筛选取一页结果
///
/// 超时等传输策略由实现方负责，控制器只做代际失效
#[async_trait]
pub trait DiscoveryFetcher: Send + Sync + 'static {
    async fn fetch_page(&self, filters: &FilterState, cursor: u32) -> Result<Page, FetchError>;
}

/// 控制器状态机：Idle → Debouncing → Fetching → Idle，
/// Error 可从 Fetching 进入
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Debouncing,
    Fetching,
    Error,
}

/// 对渲染层发布的只读快照
#[derive(Debug, Clone)]
pub struct DiscoverySnapshot {
    pub state: ControllerState,
    pub applied: FilterState,
    pub items: Vec<Entity>,
    pub has_more: bool,
    pub generation: u64,
    pub location_query: String,
    pub error: Option<String>,
}

enum Command {
    EditFilters(FilterState),
    ApplyNow,
    SwitchContentType(MediaType),
    LoadMore,
    NearListEnd,
    SyncFromLocation(String),
}

struct FetchOutcome {
    generation: u64,
    cursor: u32,
    result: Result<Page, FetchError>,
}

/// 防抖取数控制器（句柄）
///
/// 维护 pending/applied 两个筛选寄存器：pending 随用户每次编辑同步更新，
/// 自身从不触发请求；applied 只在防抖窗口静默后或显式 apply 时更新，
/// 只有 applied 的变化（加上翻页）才产生网络活动。
/// 内部是单任务事件循环（命令通道 + 防抖计时 + 请求完成通道），
/// 不存在并行修改。
#[derive(Clone)]
pub struct DebouncedFetchController {
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<DiscoverySnapshot>,
}

impl DebouncedFetchController {
    /// 启动控制器任务
    pub fn spawn(
        fetcher: Arc<dyn DiscoveryFetcher>,
        initial: FilterState,
        debounce: Duration,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        let store = InfiniteResultStore::new(initial.content_type);
        let (snapshot_tx, snapshot_rx) = watch::channel(DiscoverySnapshot {
            state: ControllerState::Idle,
            applied: initial.clone(),
            items: Vec::new(),
            has_more: false,
            generation: 0,
            location_query: location::to_location_query(&initial),
            error: None,
        });

        let task = ControllerTask {
            fetcher,
            debounce,
            pending: initial.clone(),
            applied: initial,
            generation: 0,
            state: ControllerState::Idle,
            store,
            error: None,
            deadline: None,
            outcome_tx,
            snapshot_tx,
        };
        tokio::spawn(task.run(command_rx, outcome_rx));

        Self {
            commands: command_tx,
            snapshot: snapshot_rx,
        }
    }

    /// 编辑 pending 筛选（重置防抖计时，本身不触发请求）
    pub fn edit_filters(&self, filters: FilterState) {
        let _ = self.commands.send(Command::EditFilters(filters));
    }

    /// 显式应用（翻页导航等场景，跳过防抖窗口）
    pub fn apply_now(&self) {
        let _ = self.commands.send(Command::ApplyNow);
    }

    /// 切换内容类型：pending 整体替换为新类型默认值并立即应用
    pub fn switch_content_type(&self, content_type: MediaType) {
        let _ = self.commands.send(Command::SwitchContentType(content_type));
    }

    /// 请求下一页（仅 Idle 且有后续页时有效；请求中为幂等空操作）
    pub fn load_more(&self) {
        let _ = self.commands.send(Command::LoadMore);
    }

    /// 接近列表末尾的触发信号（代理传感器可能重复触发，内部有幂等保护）
    pub fn notify_near_list_end(&self) {
        let _ = self.commands.send(Command::NearListEnd);
    }

    /// 地址变化（如浏览器后退）：重建 pending=applied=解析结果，
    /// 恰好触发一次请求；与当前应用态相同时不做任何事，避免取数循环
    pub fn sync_from_location(&self, query: &str) {
        let _ = self.commands.send(Command::SyncFromLocation(query.to_string()));
    }

    pub fn snapshot(&self) -> DiscoverySnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DiscoverySnapshot> {
        self.snapshot.clone()
    }
}

struct ControllerTask {
    fetcher: Arc<dyn DiscoveryFetcher>,
    debounce: Duration,
    pending: FilterState,
    applied: FilterState,
    generation: u64,
    state: ControllerState,
    store: InfiniteResultStore,
    error: Option<FetchError>,
    deadline: Option<Instant>,
    outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
    snapshot_tx: watch::Sender<DiscoverySnapshot>,
}

impl ControllerTask {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut outcomes: mpsc::UnboundedReceiver<FetchOutcome>,
    ) {
        loop {
            let deadline = self.deadline;
            tokio::select! {
                cmd = commands.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd),
                        None => break, // 所有句柄已释放
                    }
                }
                Some(outcome) = outcomes.recv() => {
                    self.handle_outcome(outcome);
                }
                _ = async { sleep_until(deadline.unwrap()).await }, if deadline.is_some() => {
                    // 防抖窗口静默期满
                    self.deadline = None;
                    self.apply_pending();
                }
            }
            self.publish();
        }
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::EditFilters(filters) => {
                self.pending = filters;
                self.state = ControllerState::Debouncing;
                // 每次编辑都把计时推倒重来，被超越的中间态不会产生请求
                self.deadline = Some(Instant::now() + self.debounce);
            }
            Command::ApplyNow => {
                self.deadline = None;
                self.apply_pending();
            }
            Command::SwitchContentType(content_type) => {
                self.pending = self.pending.switch_content_type(content_type);
                self.deadline = None;
                self.apply_pending();
            }
            Command::LoadMore => self.load_more(),
            Command::NearListEnd => {
                let is_fetching = self.state == ControllerState::Fetching;
                if self.state == ControllerState::Idle
                    && self.store.should_load_more(true, is_fetching)
                {
                    self.load_more();
                }
            }
            Command::SyncFromLocation(query) => {
                let parsed = location::from_location_query(&query);
                if parsed == self.applied {
                    tracing::debug!("location change matches applied filters, nothing to do");
                    return;
                }
                self.pending = parsed;
                self.deadline = None;
                self.apply_pending();
            }
        }
    }

    /// 应用 pending：复制到 applied、代际+1、清空结果并取第一页
    fn apply_pending(&mut self) {
        self.applied = self.pending.clone();
        self.generation += 1;
        self.store.reset(self.applied.content_type);
        self.error = None;
        self.start_fetch(1);
    }

    fn load_more(&mut self) {
        match self.state {
            // 重复触发（如接近传感器连发两次）的幂等保护
            ControllerState::Fetching | ControllerState::Debouncing => {}
            ControllerState::Idle => {
                if self.store.has_more() {
                    self.start_fetch(self.store.next_cursor());
                }
            }
            // 失败后的重试：同一代际、同一页游标
            ControllerState::Error => {
                self.start_fetch(self.store.next_cursor());
            }
        }
    }

    fn start_fetch(&mut self, cursor: u32) {
        self.state = ControllerState::Fetching;
        self.error = None;

        let fetcher = Arc::clone(&self.fetcher);
        let filters = self.applied.clone();
        let generation = self.generation;
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = fetcher.fetch_page(&filters, cursor).await;
            let _ = tx.send(FetchOutcome {
                generation,
                cursor,
                result,
            });
        });
    }

    fn handle_outcome(&mut self, outcome: FetchOutcome) {
        // 代际守卫：过期代际的响应到达即丢弃，不渲染不合并也不重试
        if outcome.generation != self.generation {
            tracing::debug!(
                stale = outcome.generation,
                current = self.generation,
                "discarding response from superseded generation"
            );
            return;
        }

        match outcome.result {
            Ok(page) => {
                self.store.absorb_page(&page);
                if self.state == ControllerState::Fetching {
                    self.state = ControllerState::Idle;
                }
                self.error = None;
            }
            Err(e) => {
                tracing::warn!(cursor = outcome.cursor, "discovery fetch failed: {}", e);
                // 已有页面保留，不回滚
                self.error = Some(e);
                if self.state == ControllerState::Fetching {
                    self.state = ControllerState::Error;
                }
            }
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(DiscoverySnapshot {
            state: self.state,
            applied: self.applied.clone(),
            items: self.store.items().to_vec(),
            has_more: self.store.has_more(),
            generation: self.generation,
            location_query: location::to_location_query(&self.applied),
            error: self.error.as_ref().map(|e| e.to_string()),
        });
    }
}
