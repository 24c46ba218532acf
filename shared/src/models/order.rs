//! Order Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order lifecycle status
///
/// `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "finalizada")]
    Finalized,
    #[serde(rename = "cancelada")]
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pendente",
            Self::Finalized => "finalizada",
            Self::Cancelled => "cancelada",
        }
    }

    /// Strict parse of the stored value
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pendente" => Some(Self::Pending),
            "finalizada" => Some(Self::Finalized),
            "cancelada" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Dashboard bucketing: missing or unrecognized values count as pending
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        raw.and_then(Self::parse).unwrap_or(Self::Pending)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pendente",
            Self::Finalized => "Finalizada",
            Self::Cancelled => "Cancelada",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Snapshot of a product line at checkout. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
}

/// Order entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// `PED` + 6 timestamp digits + 3 random digits
    pub id: String,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
    /// YYYY-MM-DD, local clock
    pub date: String,
    /// HH:MM, local clock
    pub time: String,
    pub status: OrderStatus,
    pub cancellation_reason: Option<String>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Order {
    pub fn units(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

/// Returned to the customer after a successful checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub order_id: String,
    pub total: Decimal,
    pub date: String,
    pub time: String,
}
