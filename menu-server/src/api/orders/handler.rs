//! Order Transition Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::api::ConfirmRequest;
use crate::auth::CurrentUser;
use crate::confirm::Preanswered;
use crate::core::ServerState;
use crate::dashboard::Bucket;
use crate::orders::Outcome;
use crate::utils::{ApiResponse, AppError, AppResult, ok_with_message};

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    /// `None` when the operator dismissed the prompt
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FinalizeAllResponse {
    pub finalized: usize,
}

fn done(outcome: Outcome) -> AppResult<()> {
    match outcome {
        Outcome::Done => Ok(()),
        Outcome::Declined => Err(AppError::declined()),
    }
}

/// POST /api/orders/{id}/finalize
pub async fn finalize(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(confirm): Json<ConfirmRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    done(state.orders.finalize_confirmed(&id, &confirm.provider()).await?)?;
    tracing::info!(order_id = %id, by = %user.email, "Order finalized from dashboard");
    Ok(ok_with_message((), "Pedido finalizado com sucesso!"))
}

/// POST /api/orders/{id}/cancel
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<CancelRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    let answer = Preanswered::with_answer(req.reason);
    done(state.orders.cancel_prompted(&id, &answer).await?)?;
    tracing::info!(order_id = %id, by = %user.email, "Order cancelled from dashboard");
    Ok(ok_with_message((), "Pedido cancelado com sucesso!"))
}

/// POST /api/orders/finalize-all
///
/// Finalizes the pending orders of the day the dashboard is showing.
pub async fn finalize_all(
    State(state): State<ServerState>,
    _user: CurrentUser,
    Json(confirm): Json<ConfirmRequest>,
) -> AppResult<Json<ApiResponse<FinalizeAllResponse>>> {
    let pending = state.sales.view().read().orders(Bucket::Pending).to_vec();
    done(
        state
            .orders
            .finalize_all_confirmed(&pending, &confirm.provider())
            .await?,
    )?;
    Ok(ok_with_message(
        FinalizeAllResponse {
            finalized: pending.len(),
        },
        "Todos os pedidos foram finalizados!",
    ))
}
