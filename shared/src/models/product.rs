//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product kind: sold on its own, or an addon offered with other categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProductKind {
    #[default]
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "adicional")]
    Addon,
}

impl ProductKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Addon => "adicional",
        }
    }

    /// Unknown values fall back to `Normal`
    pub fn parse(raw: &str) -> Self {
        match raw {
            "adicional" => Self::Addon,
            _ => Self::Normal,
        }
    }
}

/// Product entity
///
/// `stock` is the single canonical stock count. The two legacy document
/// fields are reconciled by the product repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub stock: u32,
    /// Category key (`comida`, `bebida`, `sobremesa`, `outro` or free text)
    pub category: String,
    pub is_active: bool,
    #[serde(default)]
    pub kind: ProductKind,
    /// Categories an addon is offered with (empty for normal products)
    #[serde(default)]
    pub addon_categories: Vec<String>,
    pub image_url: Option<String>,
    /// Unix millis, assigned by the store
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Product {
    pub fn is_available(&self) -> bool {
        self.stock > 0
    }

    pub fn stock_level(&self) -> StockLevel {
        StockLevel::from_stock(self.stock)
    }
}

/// Product create/update payload after validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: u32,
    pub category: String,
    pub is_active: bool,
    pub kind: ProductKind,
    pub addon_categories: Vec<String>,
    pub image_url: Option<String>,
}

/// Admin-side stock indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    SoldOut,
    Low,
    Moderate,
    Good,
}

impl StockLevel {
    pub fn from_stock(stock: u32) -> Self {
        match stock {
            0 => Self::SoldOut,
            1..=5 => Self::Low,
            6..=10 => Self::Moderate,
            _ => Self::Good,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::SoldOut => "Esgotado",
            Self::Low => "Baixo",
            Self::Moderate => "Moderado",
            Self::Good => "Bom",
        }
    }
}

/// Menu-facing category name, e.g. `bebida` -> `Bebidas`
pub fn category_display_name(category: &str) -> String {
    match category {
        "bebida" => "Bebidas".to_string(),
        "comida" => "Comidas".to_string(),
        "lanche" => "Lanches".to_string(),
        "sobremesa" => "Sobremesas".to_string(),
        "outro" => "Outros".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_level_thresholds() {
        assert_eq!(StockLevel::from_stock(0), StockLevel::SoldOut);
        assert_eq!(StockLevel::from_stock(5), StockLevel::Low);
        assert_eq!(StockLevel::from_stock(6), StockLevel::Moderate);
        assert_eq!(StockLevel::from_stock(10), StockLevel::Moderate);
        assert_eq!(StockLevel::from_stock(11), StockLevel::Good);
        assert_eq!(StockLevel::from_stock(0).label(), "Esgotado");
    }

    #[test]
    fn test_category_display_name() {
        assert_eq!(category_display_name("bebida"), "Bebidas");
        assert_eq!(category_display_name("outro"), "Outros");
        assert_eq!(category_display_name("pizza"), "Pizza");
        assert_eq!(category_display_name(""), "");
    }

    #[test]
    fn test_product_kind_serde() {
        assert_eq!(
            serde_json::to_string(&ProductKind::Addon).unwrap(),
            "\"adicional\""
        );
        assert_eq!(ProductKind::parse("qualquer"), ProductKind::Normal);
    }
}
