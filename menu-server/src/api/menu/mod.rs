//! Public menu API (no auth)

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::catalog::MenuCard;
use crate::catalog::menu::CategoryButton;
use crate::core::ServerState;
use crate::utils::{ApiResponse, ok};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/menu", get(menu))
}

#[derive(Debug, Default, Deserialize)]
pub struct MenuQuery {
    /// Category key, `todos` for all
    pub category: Option<String>,
    #[serde(default)]
    pub search: String,
}

#[derive(Debug, Serialize)]
pub struct MenuResponse {
    pub categories: Vec<CategoryButton>,
    pub cards: Vec<MenuCard>,
}

/// GET /api/menu?category=bebida&search=suco
async fn menu(
    State(state): State<ServerState>,
    Query(query): Query<MenuQuery>,
) -> Json<ApiResponse<MenuResponse>> {
    let mut view = state.menu.write();
    view.select_category(query.category.as_deref());
    view.set_search(&query.search);
    ok(MenuResponse {
        categories: view.category_buttons(),
        cards: view.cards(),
    })
}
