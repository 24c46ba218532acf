//! Sales Dashboard Handlers

use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::api::ConfirmRequest;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::dashboard::{
    Bucket, DashboardSnapshot, SaleRow, export_bucket, migrate_legacy_orders, migration_message,
};
use crate::db::repository::OrderRepository;
use crate::utils::time::parse_date;
use crate::utils::{ApiResponse, AppError, AppResult, ok, ok_with_message};

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// YYYY-MM-DD; the day already shown when absent
    pub date: Option<String>,
    /// `finalizadas` (default), `pendentes` or `canceladas`
    pub bucket: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub bucket: String,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub snapshot: DashboardSnapshot,
    pub bucket: Bucket,
    pub rows: Vec<SaleRow>,
}

#[derive(Debug, Serialize)]
pub struct MigrationResponse {
    pub migrated: usize,
}

fn parse_bucket(raw: Option<&str>) -> AppResult<Bucket> {
    match raw {
        None => Ok(Bucket::Finalized),
        Some(raw) => {
            Bucket::parse(raw).ok_or_else(|| AppError::validation(format!("Aba inválida: {raw}")))
        }
    }
}

/// GET /api/sales?date=2024-06-01&bucket=canceladas&search=pizza
pub async fn dashboard(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<ApiResponse<DashboardResponse>>> {
    let bucket = parse_bucket(query.bucket.as_deref())?;
    if let Some(raw) = query.date.as_deref() {
        state.sales.select_date(parse_date(raw)?).await?;
    }

    let view = state.sales.view();
    let view = view.read();
    Ok(ok(DashboardResponse {
        snapshot: view.snapshot(),
        bucket,
        rows: view.rows(bucket, query.search.as_deref()),
    }))
}

/// GET /api/sales/export?bucket=finalizadas
pub async fn export(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    let bucket = parse_bucket(Some(&query.bucket))?;
    let csv = {
        let view = state.sales.view();
        let view = view.read();
        export_bucket(bucket, view.orders(bucket), state.clock.today())?
    };
    tracing::info!(file = %csv.filename, orders = csv.orders, "Sales exported");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", csv.filename),
            ),
        ],
        csv.content,
    )
        .into_response())
}

/// POST /api/sales/migrations/status
pub async fn migrate_orders(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Json(confirm): Json<ConfirmRequest>,
) -> AppResult<Json<ApiResponse<MigrationResponse>>> {
    let orders = OrderRepository::new(state.store.clone());
    let migrated = migrate_legacy_orders(&orders, &confirm.provider())
        .await?
        .ok_or_else(AppError::declined)?;
    Ok(ok_with_message(
        MigrationResponse { migrated },
        migration_message(migrated),
    ))
}
