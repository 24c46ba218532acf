use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::auth::{AuthService, IdentityProvider, MemoryIdentityProvider};
use crate::cart::CartManager;
use crate::catalog::{CatalogAdminView, CatalogService, MenuView};
use crate::core::Config;
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::dashboard::SalesFeed;
use crate::db::repository::{OrderRepository, ProductRepository};
use crate::db::{DocumentStore, MemoryStore};
use crate::live::LiveFeed;
use crate::orders::OrderLifecycle;
use crate::storage::{FileStorage, LocalStorage};
use crate::utils::AppResult;
use crate::utils::time::{Clock, SystemClock};

/// 服务器状态 - 持有所有服务的共享引用
///
/// Clone 只复制 Arc。
///
/// | 字段 | 说明 |
/// |------|------|
/// | store | 文档数据库 (`produtos` / `pedidos`) |
/// | storage | 本地存储 (购物车、记住的邮箱) |
/// | auth | 登录 / 会话 |
/// | catalog | 商品管理 |
/// | orders | 订单状态流转 |
/// | cart | 本机购物车 (单设备) |
/// | menu / admin | 实时商品视图 |
/// | sales | 当日销售看板 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub storage: Arc<dyn LocalStorage>,
    pub clock: Arc<dyn Clock>,
    pub auth: AuthService,
    pub catalog: Arc<CatalogService>,
    pub orders: OrderLifecycle,
    pub cart: Arc<Mutex<CartManager>>,
    pub menu: Arc<RwLock<MenuView>>,
    pub admin: Arc<RwLock<CatalogAdminView>>,
    pub sales: Arc<SalesFeed>,
    feeds: Arc<Mutex<Vec<LiveFeed>>>,
}

impl ServerState {
    /// 按配置初始化: 内存文档库、工作目录下的本地存储、可选的管理员账号
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        let store = Arc::new(MemoryStore::with_subscription_buffer(config.subscription_buffer));
        let storage = Arc::new(FileStorage::open(config.storage_dir())?);

        let provider = MemoryIdentityProvider::new();
        match (&config.admin_email, &config.admin_password_hash) {
            (Some(email), Some(hash)) => {
                provider.add_user_with_hash(email, hash.clone());
                tracing::info!(email = %email, "Admin account registered");
            }
            _ => tracing::warn!("ADMIN_EMAIL / ADMIN_PASSWORD_HASH not set, admin sign-in disabled"),
        }

        Self::build(
            config.clone(),
            store,
            storage,
            Arc::new(provider),
            Arc::new(SystemClock),
        )
        .await
    }

    /// 组装服务并挂上实时订阅。测试用它注入内存实现和固定时钟。
    pub async fn build(
        config: Config,
        store: Arc<dyn DocumentStore>,
        storage: Arc<dyn LocalStorage>,
        provider: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        let state = Self {
            auth: AuthService::new(provider, storage.clone()),
            catalog: Arc::new(CatalogService::new(store.clone())),
            orders: OrderLifecycle::new(store.clone(), clock.clone()),
            cart: Arc::new(Mutex::new(CartManager::load(storage.clone()))),
            menu: Arc::new(RwLock::new(MenuView::new())),
            admin: Arc::new(RwLock::new(CatalogAdminView::new())),
            sales: Arc::new(SalesFeed::new(OrderRepository::new(store.clone()))),
            feeds: Arc::new(Mutex::new(Vec::new())),
            config,
            store,
            storage,
            clock,
        };
        state.start_live_feeds().await?;
        state.sales.select_date(state.clock.today()).await?;
        Ok(state)
    }

    /// 菜单只订阅上架商品，后台订阅全部商品
    async fn start_live_feeds(&self) -> AppResult<()> {
        let products = ProductRepository::new(self.store.clone());

        let menu = LiveFeed::attach(
            "menu",
            products.subscribe_active().await?,
            self.menu.clone(),
            |view: &mut MenuView, snaps| {
                view.replace_products(snaps.iter().map(ProductRepository::from_snapshot).collect());
            },
        )
        .await?;

        let admin = LiveFeed::attach(
            "catalog_admin",
            products.subscribe_all().await?,
            self.admin.clone(),
            |view: &mut CatalogAdminView, snaps| {
                view.replace_products(snaps.iter().map(ProductRepository::from_snapshot).collect());
            },
        )
        .await?;

        let mut feeds = self.feeds.lock().await;
        feeds.push(menu);
        feeds.push(admin);
        Ok(())
    }

    /// 注册后台任务: 会话事件日志、看板跨日切换
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        let token = tasks.shutdown_token();
        let mut events = self.auth.provider().session_events();
        tasks.spawn("session_events", TaskKind::Listener, async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    event = events.recv() => match event {
                        Ok(event) => tracing::info!(?event, "Session changed"),
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(skipped = n, "Session events lagged");
                        }
                        Err(_) => break,
                    }
                }
            }
        });

        let token = tasks.shutdown_token();
        let state = self.clone();
        tasks.spawn("sales_day_rollover", TaskKind::Periodic, async move {
            let mut today = state.clock.today();
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        let now = state.clock.today();
                        if now == today {
                            continue;
                        }
                        // Only follow the day change if the operator was on "today"
                        let previous = today.format("%Y-%m-%d").to_string();
                        if state.sales.current_date().await.as_deref() == Some(previous.as_str())
                            && let Err(e) = state.sales.select_date(now).await
                        {
                            tracing::error!(error = %e, "Failed to roll sales dashboard over");
                        }
                        today = now;
                    }
                }
            }
        });

        tasks
    }

    /// 停止所有实时订阅
    pub async fn stop_live_feeds(&self) {
        self.feeds.lock().await.clear();
        self.sales.stop().await;
    }
}
