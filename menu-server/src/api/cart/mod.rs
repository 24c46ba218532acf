//! Cart API (no auth, one cart per device)
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/cart | GET | 购物车内容和合计 |
//! | /api/cart | DELETE | 清空 (需确认) |
//! | /api/cart/items | POST | 加入商品 |
//! | /api/cart/items/{index} | PATCH | 数量 +/- |
//! | /api/cart/items/{index} | DELETE | 删除一行 |
//! | /api/cart/checkout | POST | 提交订单 |

mod handler;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cart", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::get_cart).delete(handler::clear))
        .route("/items", post(handler::add_item))
        .route(
            "/items/{index}",
            patch(handler::change_quantity).delete(handler::remove_item),
        )
        .route("/checkout", post(handler::checkout))
}
