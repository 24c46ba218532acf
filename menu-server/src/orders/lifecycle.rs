//! Order Lifecycle Controller
//!
//! ```text
//! cart ──submit──▶ pendente ──finalize──▶ finalizada
//!                     │
//!                     └────cancel────▶ cancelada (stock put back)
//! ```
//!
//! Every transition is a single atomic [`WriteBatch`]. Finalize and cancel
//! carry a status precondition so a closed order is never closed twice.

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{Order, OrderStatus, SubmitReceipt};
use shared::util::non_blank;
use thiserror::Error;

use super::id::next_order_id;
use super::money::{DELIVERY_FEE, order_items, order_total, subtotal};
use crate::cart::{CartManager, ProductLookup};
use crate::confirm::ConfirmationProvider;
use crate::db::repository::{OrderRepository, ProductRepository, RepoError};
use crate::db::store::{DocumentStore, StoreError, WriteBatch};
use crate::utils::time::{Clock, format_order_date, format_order_time};

pub const FINALIZE_CONFIRM: &str = "Deseja finalizar este pedido?";
pub const CANCEL_REASON_PROMPT: &str = "Informe o motivo do cancelamento:";

pub fn finalize_all_confirm(count: usize) -> String {
    format!("Deseja finalizar todos os {count} pedidos pendentes?")
}

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Carrinho vazio")]
    CartEmpty,

    #[error("{name} sem estoque suficiente!")]
    InsufficientStock { product_id: String, name: String },

    #[error("Pedido não encontrado")]
    NotFound(String),

    #[error("Pedido já finalizado")]
    AlreadyFinalized(String),

    #[error("Pedido já cancelado")]
    AlreadyCancelled(String),

    #[error("Já existe um pedido com o ID {0}")]
    IdCollision(String),

    #[error("Informe o motivo do cancelamento")]
    CancelReasonRequired,

    #[error("Não há pedidos pendentes para finalizar!")]
    NoPendingOrders,

    #[error("Ocorreu um erro ao finalizar o pedido. Tente novamente.")]
    SubmitFailed(#[source] StoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        let message = err.to_string();
        match err {
            OrderError::CartEmpty => AppError::with_message(ErrorCode::CartEmpty, message),
            OrderError::InsufficientStock { product_id, .. } => {
                AppError::with_message(ErrorCode::ProductInsufficientStock, message)
                    .with_detail("product_id", product_id)
            }
            OrderError::NotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, message).with_detail("order_id", id)
            }
            OrderError::AlreadyFinalized(id) => {
                AppError::with_message(ErrorCode::OrderAlreadyFinalized, message)
                    .with_detail("order_id", id)
            }
            OrderError::AlreadyCancelled(id) => {
                AppError::with_message(ErrorCode::OrderAlreadyCancelled, message)
                    .with_detail("order_id", id)
            }
            OrderError::IdCollision(id) => {
                AppError::with_message(ErrorCode::OrderIdCollision, message).with_detail("order_id", id)
            }
            OrderError::CancelReasonRequired => {
                AppError::with_message(ErrorCode::CancelReasonRequired, message)
            }
            OrderError::NoPendingOrders => AppError::with_message(ErrorCode::NoPendingOrders, message),
            OrderError::SubmitFailed(_) => AppError::with_message(ErrorCode::OrderSubmitFailed, message),
            OrderError::Store(e) => e.into(),
            OrderError::Repo(e) => e.into(),
        }
    }
}

pub type OrderResult<T> = Result<T, OrderError>;

/// What the operator decided in a dialog-guarded transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Declined,
}

#[derive(Clone)]
pub struct OrderLifecycle {
    store: Arc<dyn DocumentStore>,
    orders: OrderRepository,
    products: ProductRepository,
    clock: Arc<dyn Clock>,
}

impl OrderLifecycle {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            orders: OrderRepository::new(store.clone()),
            products: ProductRepository::new(store.clone()),
            store,
            clock,
        }
    }

    /// Turns the cart into a pending order.
    ///
    /// Stock is checked against `catalog` (the last product snapshot seen),
    /// not re-read from the store: two customers racing for the last unit
    /// can both pass the check.
    pub async fn submit(
        &self,
        cart: &mut CartManager,
        catalog: &(impl ProductLookup + ?Sized),
    ) -> OrderResult<SubmitReceipt> {
        if cart.is_empty() {
            return Err(OrderError::CartEmpty);
        }

        for item in cart.items() {
            let enough = catalog
                .find_product(&item.product_id)
                .is_some_and(|p| p.stock >= item.quantity);
            if !enough {
                return Err(OrderError::InsufficientStock {
                    product_id: item.product_id.clone(),
                    name: item.name.clone(),
                });
            }
        }

        let now = self.clock.now_local();
        let items = order_items(cart.items());
        let subtotal = subtotal(&items);
        let order = Order {
            id: next_order_id(self.clock.as_ref()),
            subtotal,
            delivery_fee: DELIVERY_FEE,
            total: order_total(subtotal),
            items,
            date: format_order_date(now),
            time: format_order_time(now),
            status: OrderStatus::Pending,
            cancellation_reason: None,
            created_at: None,
            updated_at: None,
        };

        let mut batch = WriteBatch::new();
        OrderRepository::queue_create(&mut batch, &order);
        for item in &order.items {
            self.products
                .queue_stock_adjustment(&mut batch, &item.product_id, -i64::from(item.quantity))
                .await
                .map_err(OrderError::SubmitFailed)?;
        }

        match self.store.commit(batch).await {
            Ok(()) => {}
            Err(StoreError::AlreadyExists { id, .. }) => {
                tracing::error!(order_id = %id, "Order id collision, nothing written");
                return Err(OrderError::IdCollision(id));
            }
            Err(e) => {
                tracing::error!(order_id = %order.id, error = %e, "Order submission failed");
                return Err(OrderError::SubmitFailed(e));
            }
        }

        // The order is in; a storage hiccup must not report it as failed
        if let Err(e) = cart.reset() {
            tracing::warn!(error = %e, "Failed to persist emptied cart");
        }

        tracing::info!(
            order_id = %order.id,
            lines = order.items.len(),
            total = %order.total,
            "Order submitted as pending"
        );
        Ok(SubmitReceipt {
            order_id: order.id,
            total: order.total,
            date: order.date,
            time: order.time,
        })
    }

    /// pendente -> finalizada. Stock is untouched.
    pub async fn finalize(&self, order_id: &str) -> OrderResult<()> {
        self.ensure_pending(order_id).await?;

        let mut batch = WriteBatch::new();
        OrderRepository::queue_finalize(&mut batch, order_id);
        self.commit_transition(order_id, batch).await?;

        tracing::info!(order_id, "Order finalized");
        Ok(())
    }

    /// pendente -> cancelada, putting every line's quantity back in stock.
    /// A blank reason is rejected before anything is read or written.
    pub async fn cancel(&self, order_id: &str, reason: &str) -> OrderResult<()> {
        let reason = non_blank(Some(reason)).ok_or(OrderError::CancelReasonRequired)?;
        let order = self.ensure_pending(order_id).await?;

        let mut batch = WriteBatch::new();
        for item in &order.items {
            self.products
                .queue_stock_adjustment(&mut batch, &item.product_id, i64::from(item.quantity))
                .await?;
        }
        OrderRepository::queue_cancel(&mut batch, order_id, &reason);
        self.commit_transition(order_id, batch).await?;

        tracing::info!(order_id, reason = %reason, restocked = order.items.len(), "Order cancelled");
        Ok(())
    }

    /// Finalizes every listed order in one batch. If any of them was closed
    /// in the meantime, none are finalized.
    pub async fn finalize_all(&self, pending: &[Order]) -> OrderResult<usize> {
        if pending.is_empty() {
            return Err(OrderError::NoPendingOrders);
        }

        let mut batch = WriteBatch::new();
        for order in pending {
            OrderRepository::queue_finalize(&mut batch, &order.id);
        }
        match self.store.commit(batch).await {
            Ok(()) => {}
            Err(StoreError::FailedPrecondition(msg)) => {
                tracing::warn!(reason = %msg, "Batch finalize hit an already closed order");
                return Err(OrderError::Store(StoreError::FailedPrecondition(msg)));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(count = pending.len(), "All pending orders finalized");
        Ok(pending.len())
    }

    // ========== Dialog-guarded variants ==========

    pub async fn finalize_confirmed(
        &self,
        order_id: &str,
        confirm: &dyn ConfirmationProvider,
    ) -> OrderResult<Outcome> {
        if !confirm.confirm(FINALIZE_CONFIRM) {
            return Ok(Outcome::Declined);
        }
        self.finalize(order_id).await?;
        Ok(Outcome::Done)
    }

    /// Asks for the reason; a dismissed prompt does nothing
    pub async fn cancel_prompted(
        &self,
        order_id: &str,
        confirm: &dyn ConfirmationProvider,
    ) -> OrderResult<Outcome> {
        let Some(reason) = confirm.prompt(CANCEL_REASON_PROMPT) else {
            return Ok(Outcome::Declined);
        };
        self.cancel(order_id, &reason).await?;
        Ok(Outcome::Done)
    }

    pub async fn finalize_all_confirmed(
        &self,
        pending: &[Order],
        confirm: &dyn ConfirmationProvider,
    ) -> OrderResult<Outcome> {
        if pending.is_empty() {
            return Err(OrderError::NoPendingOrders);
        }
        if !confirm.confirm(&finalize_all_confirm(pending.len())) {
            return Ok(Outcome::Declined);
        }
        self.finalize_all(pending).await?;
        Ok(Outcome::Done)
    }

    // ========== Helpers ==========

    async fn ensure_pending(&self, order_id: &str) -> OrderResult<Order> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))?;
        closed_error(order_id, order.status).map_or(Ok(order), Err)
    }

    /// Commits a finalize/cancel batch, explaining a lost race from the
    /// order's current status.
    async fn commit_transition(&self, order_id: &str, batch: WriteBatch) -> OrderResult<()> {
        match self.store.commit(batch).await {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound { collection, id }) if id == order_id => {
                tracing::warn!(collection = %collection, order_id, "Order vanished before commit");
                Err(OrderError::NotFound(id))
            }
            Err(StoreError::FailedPrecondition(msg)) => {
                tracing::warn!(order_id, reason = %msg, "Order closed concurrently");
                let current = self
                    .orders
                    .find_by_id(order_id)
                    .await
                    .ok()
                    .flatten()
                    .map(|o| o.status);
                Err(current
                    .and_then(|status| closed_error(order_id, status))
                    .unwrap_or(OrderError::Store(StoreError::FailedPrecondition(msg))))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn closed_error(order_id: &str, status: OrderStatus) -> Option<OrderError> {
    match status {
        OrderStatus::Pending => None,
        OrderStatus::Finalized => Some(OrderError::AlreadyFinalized(order_id.to_string())),
        OrderStatus::Cancelled => Some(OrderError::AlreadyCancelled(order_id.to_string())),
    }
}
