//! Order transitions API (admin)
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/orders/{id}/finalize | POST | pendente -> finalizada |
//! | /api/orders/{id}/cancel | POST | pendente -> cancelada (回补库存) |
//! | /api/orders/finalize-all | POST | 看板当天所有待处理订单 |

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/finalize-all", post(handler::finalize_all))
        .route("/{id}/finalize", post(handler::finalize))
        .route("/{id}/cancel", post(handler::cancel))
}
