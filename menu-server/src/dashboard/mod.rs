//! 当日销售看板
//!
//! - [`aggregator`]: 按状态分桶、汇总指标、表格行
//! - [`view`]: 看板视图模型，由实时快照整体替换
//! - [`feed`]: 按日期订阅订单
//! - [`export`]: CSV 导出

pub mod aggregator;
pub mod export;
pub mod feed;
pub mod view;

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use crate::confirm::ConfirmationProvider;
use crate::db::StoreError;
use crate::db::repository::{OrderRepository, RepoError};

pub use aggregator::{Bucket, BucketCounts, Buckets, FormattedSummary, SaleRow, SalesSummary};
pub use export::{CsvExport, export_bucket};
pub use feed::SalesFeed;
pub use view::{DashboardSnapshot, SalesDashboard};

pub const MIGRATE_ORDERS_CONFIRM: &str =
    "Atualizar pedidos antigos sem status para 'finalizada'?";

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Não há dados de {} para exportar!", .0.label())]
    NothingToExport(Bucket),

    #[error("Pedidos {} não podem ser exportados", .0.label())]
    NotExportable(Bucket),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<DashboardError> for AppError {
    fn from(err: DashboardError) -> Self {
        let message = err.to_string();
        match err {
            DashboardError::NothingToExport(bucket) => {
                AppError::with_message(ErrorCode::NothingToExport, message)
                    .with_detail("bucket", bucket.label())
            }
            DashboardError::NotExportable(_) => AppError::invalid_request(message),
            DashboardError::Store(e) => e.into(),
            DashboardError::Repo(e) => e.into(),
        }
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;

/// `N pedidos foram atualizados para status 'finalizada'`
pub fn migration_message(migrated: usize) -> String {
    if migrated == 0 {
        "Nenhum pedido precisou ser atualizado".to_string()
    } else {
        format!("{migrated} pedidos foram atualizados para status 'finalizada'")
    }
}

/// Marks status-less orders finalized after the operator confirms.
/// `None` when declined.
pub async fn migrate_legacy_orders(
    orders: &OrderRepository,
    confirm: &dyn ConfirmationProvider,
) -> DashboardResult<Option<usize>> {
    if !confirm.confirm(MIGRATE_ORDERS_CONFIRM) {
        return Ok(None);
    }
    Ok(Some(orders.migrate_legacy_status().await?))
}
