//! Cart Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{CartItem, CartTotals, Product, SubmitReceipt};

use crate::api::ConfirmRequest;
use crate::cart::{CartManager, QuantityChange};
use crate::core::ServerState;
use crate::orders::DELIVERY_FEE;
use crate::utils::format::format_brl;
use crate::utils::{ApiResponse, AppError, AppResult, ok, ok_with_message};

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<CartItem>,
    pub totals: CartTotals,
    pub delivery_fee: Decimal,
    pub total: Decimal,
}

impl CartResponse {
    fn of(cart: &CartManager) -> Self {
        let totals = cart.totals();
        let delivery_fee = if cart.is_empty() { Decimal::ZERO } else { DELIVERY_FEE };
        Self {
            items: cart.items().to_vec(),
            totals,
            delivery_fee,
            total: totals.items_value + delivery_fee,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
}

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    /// +1 / -1 from the stepper buttons
    pub delta: i64,
}

/// Menu products at this instant; the lock is not held across awaits
fn catalog(state: &ServerState) -> Vec<Product> {
    state.menu.read().products().to_vec()
}

/// GET /api/cart
pub async fn get_cart(State(state): State<ServerState>) -> Json<ApiResponse<CartResponse>> {
    let cart = state.cart.lock().await;
    ok(CartResponse::of(&cart))
}

/// POST /api/cart/items
pub async fn add_item(
    State(state): State<ServerState>,
    Json(req): Json<AddItemRequest>,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let catalog = catalog(&state);
    let mut cart = state.cart.lock().await;
    let name = cart.add(&req.product_id, &catalog)?.name.clone();
    Ok(ok_with_message(
        CartResponse::of(&cart),
        format!("{name} adicionado"),
    ))
}

/// PATCH /api/cart/items/{index}
pub async fn change_quantity(
    State(state): State<ServerState>,
    Path(index): Path<usize>,
    Json(req): Json<QuantityRequest>,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let catalog = catalog(&state);
    let mut cart = state.cart.lock().await;
    let change = cart.set_quantity(index, req.delta, &catalog)?;
    let message = match change {
        QuantityChange::Updated(_) => "Quantidade atualizada",
        QuantityChange::Removed => "Item removido",
    };
    Ok(ok_with_message(CartResponse::of(&cart), message))
}

/// DELETE /api/cart/items/{index}
pub async fn remove_item(
    State(state): State<ServerState>,
    Path(index): Path<usize>,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let mut cart = state.cart.lock().await;
    cart.remove(index)?;
    Ok(ok_with_message(CartResponse::of(&cart), "Item removido"))
}

/// DELETE /api/cart?confirmed=true
pub async fn clear(
    State(state): State<ServerState>,
    Query(confirm): Query<ConfirmRequest>,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let mut cart = state.cart.lock().await;
    if !cart.clear(&confirm.provider())? {
        return Err(AppError::declined());
    }
    Ok(ok_with_message(CartResponse::of(&cart), "Carrinho limpo"))
}

/// POST /api/cart/checkout
pub async fn checkout(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<SubmitReceipt>>> {
    let catalog = catalog(&state);
    let mut cart = state.cart.lock().await;
    let receipt = state.orders.submit(&mut cart, &catalog).await?;
    let message = format!(
        "Pedido realizado com sucesso!\n\nID do Pedido: {}\nTotal: {}\nData: {}\nHora: {}",
        receipt.order_id,
        format_brl(receipt.total),
        receipt.date,
        receipt.time
    );
    Ok(ok_with_message(receipt, message))
}
