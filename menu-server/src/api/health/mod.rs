//! 健康检查路由
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /health | GET | 简单健康检查 | 无 |
//!
//! ```json
//! { "status": "ok", "version": "0.1.0", "active_products": 12, "sales_date": "2024-06-01" }
//! ```

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;

/// 公共路由 (无需认证)
pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    /// 菜单中上架商品数
    active_products: usize,
    /// 看板当前日期 (订阅已挂上时)
    #[serde(skip_serializing_if = "Option::is_none")]
    sales_date: Option<String>,
}

async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let active_products = state.menu.read().products().len();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        active_products,
        sales_date: state.sales.current_date().await,
    })
}
