//! Cardápio Digital - 餐厅点餐服务端
//!
//! # 架构概述
//!
//! - **商品目录** (`catalog`): 后台商品管理、顾客菜单视图
//! - **购物车** (`cart`): 本机购物车，持久化到本地存储
//! - **订单** (`orders`): 下单、完成、取消，库存随批量写原子调整
//! - **销售看板** (`dashboard`): 当日分桶、汇总、CSV 导出
//! - **数据库** (`db`): 文档数据库抽象 + 实时订阅
//! - **认证** (`auth`): 身份服务抽象 + Argon2 内存实现
//! - **HTTP API** (`api`): RESTful 接口
//!
//! # 模块结构
//!
//! ```text
//! menu-server/src/
//! ├── core/          # 配置、状态、服务器、后台任务
//! ├── auth/          # 登录、会话、提取器
//! ├── api/           # HTTP 路由和处理器
//! ├── routes/        # 路由组装和中间件
//! ├── catalog/       # 商品管理 / 菜单
//! ├── orders/        # 订单生命周期
//! ├── dashboard/     # 销售看板
//! ├── db/            # 文档数据库
//! └── utils/         # 工具函数
//! ```

pub mod api;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod confirm;
pub mod core;
pub mod dashboard;
pub mod db;
pub mod live;
pub mod orders;
pub mod routes;
pub mod storage;
pub mod utils;

// Re-export 公共类型
pub use auth::CurrentUser;
pub use core::{Config, Server, ServerState};
pub use routes::build_app;
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 创建工作目录，初始化日志 (生产环境输出 JSON)
pub fn setup_environment(config: &Config) -> std::io::Result<()> {
    std::fs::create_dir_all(&config.work_dir)?;
    init_logger_with_file(
        Some(&config.log_level),
        config.is_production(),
        config.log_dir.as_deref(),
    );
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
   ______               __      __
  / ____/___ __________/ /___ _/ /_  (_)___
 / /   / __ `/ ___/ __  / __ `/ __ \/ / __ \
/ /___/ /_/ / /  / /_/ / /_/ / /_/ / / /_/ /
\____/\__,_/_/   \__,_/\__,_/ .___/_/\____/
                           /_/
    "#
    );
}
