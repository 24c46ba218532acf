//! Authentication Routes
//!
//! | 路径 | 方法 | 认证 |
//! |------|------|------|
//! | /api/auth/login | POST | 无 |
//! | /api/auth/password-reset | POST | 无 |
//! | /api/auth/hints | GET | 无 |
//! | /api/auth/me | GET | Bearer |
//! | /api/auth/logout | POST | Bearer |

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/auth/login", post(handler::login))
        .route("/api/auth/password-reset", post(handler::password_reset))
        .route("/api/auth/hints", get(handler::hints))
        .route("/api/auth/me", get(handler::me))
        .route("/api/auth/logout", post(handler::logout))
}
