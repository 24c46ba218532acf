//! Catalog Admin Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::api::ConfirmRequest;
use crate::auth::CurrentUser;
use crate::catalog::{AdminListing, ProductForm, SaveOutcome, SidebarStats, StatusFilter};
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppError, AppResult, ok, ok_with_message};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: StatusFilter,
    #[serde(default)]
    pub search: String,
    /// "Mostrar todos"
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub listing: AdminListing,
    pub stats: SidebarStats,
    /// Product loaded in the form, if any
    pub editing: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MigrationResponse {
    pub migrated: usize,
}

/// GET /api/admin/products
pub async fn list(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Json<ApiResponse<ListResponse>> {
    let now = state.clock.now_millis();
    let (listing, stats) = {
        let mut view = state.admin.write();
        view.set_filter(query.status);
        view.set_search(&query.search);
        if query.all {
            view.show_all();
        }
        (view.listing(now), view.sidebar_stats())
    };
    ok(ListResponse {
        listing,
        stats,
        editing: state.catalog.editing(),
    })
}

/// GET /api/admin/products/stats
pub async fn stats(
    State(state): State<ServerState>,
    _user: CurrentUser,
) -> Json<ApiResponse<SidebarStats>> {
    ok(state.admin.read().sidebar_stats())
}

/// POST /api/admin/products
pub async fn save(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Json(form): Json<ProductForm>,
) -> AppResult<Json<ApiResponse<SaveOutcome>>> {
    let outcome = state.catalog.save(form).await?;
    let message = outcome.message();
    Ok(ok_with_message(outcome, message))
}

/// POST /api/admin/products/{id}/edit
pub async fn load_for_edit(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ProductForm>>> {
    Ok(ok(state.catalog.load_for_edit(&id).await?))
}

/// DELETE /api/admin/products/edit
pub async fn cancel_edit(
    State(state): State<ServerState>,
    _user: CurrentUser,
) -> Json<ApiResponse<()>> {
    state.catalog.cancel_edit();
    ok(())
}

/// POST /api/admin/products/{id}/toggle
pub async fn toggle_status(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<bool>>> {
    let active = state.catalog.toggle_status(&id).await?;
    let message = if active {
        "Produto ativado com sucesso!"
    } else {
        "Produto desativado com sucesso!"
    };
    Ok(ok_with_message(active, message))
}

/// DELETE /api/admin/products/{id}?confirmed=true
pub async fn delete(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Path(id): Path<String>,
    Query(confirm): Query<ConfirmRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    if !state.catalog.delete(&id, &confirm.provider()).await? {
        return Err(AppError::declined());
    }
    tracing::info!(product_id = %id, "Product deleted");
    Ok(ok_with_message((), "Produto excluído com sucesso!"))
}

/// POST /api/admin/products/migrations/stock
pub async fn migrate_stock(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Json(confirm): Json<ConfirmRequest>,
) -> AppResult<Json<ApiResponse<MigrationResponse>>> {
    let migrated = state
        .catalog
        .migrate_legacy_stock(&confirm.provider())
        .await?
        .ok_or_else(AppError::declined)?;
    Ok(ok_with_message(
        MigrationResponse { migrated },
        format!("{migrated} produtos migrados com sucesso!"),
    ))
}
