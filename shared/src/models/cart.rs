//! Cart Model
//!
//! Cart lines are persisted in client storage with the web client's field
//! names, hence the renames.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One cart line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(rename = "id")]
    pub product_id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "preco")]
    pub price: Decimal,
    /// Always >= 1
    #[serde(rename = "quantidade")]
    pub quantity: u32,
    #[serde(rename = "imagemURL", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Stock seen when the line was last changed
    #[serde(rename = "maxQuantidade")]
    pub max_quantity: u32,
}

impl CartItem {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Cart badge and footer values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartTotals {
    pub item_count: u32,
    pub items_value: Decimal,
}

impl CartTotals {
    pub fn of(items: &[CartItem]) -> Self {
        items.iter().fold(Self::default(), |acc, item| Self {
            item_count: acc.item_count + item.quantity,
            items_value: acc.items_value + item.line_total(),
        })
    }
}
