//! Sales-of-the-day API (admin)

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/sales", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::dashboard))
        .route("/export", get(handler::export))
        .route("/migrations/status", post(handler::migrate_orders))
}
