//! Catalog admin API
//!
//! Every route requires an admin session. The edit flow mirrors the form:
//! load a product into the form, then `POST /` saves it (update), or saves a
//! new product when nothing is loaded.

mod handler;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/admin/products", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::save))
        .route("/stats", get(handler::stats))
        .route("/edit", delete(handler::cancel_edit))
        .route("/migrations/stock", post(handler::migrate_stock))
        .route("/{id}", delete(handler::delete))
        .route("/{id}/edit", post(handler::load_for_edit))
        .route("/{id}/toggle", post(handler::toggle_status))
}
