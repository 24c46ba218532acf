//! Public menu
//!
//! Holds the active products from the live feed. The listing only shows
//! products with stock; the cart still looks products up through the full
//! active list so a line whose product sold out sees stock 0.

use serde::Serialize;
use shared::models::{Product, category_display_name};

use crate::cart::ProductLookup;
use crate::utils::format::format_brl;

pub const ALL_CATEGORIES: &str = "todos";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryButton {
    pub key: String,
    pub label: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuCard {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: String,
    pub available: bool,
    pub status_label: &'static str,
    pub stock_label: String,
    pub image_url: Option<String>,
}

/// `Em estoque` above 5, `Últimas N` down to 1, then `Esgotado`
pub fn stock_label(stock: u32) -> String {
    match stock {
        0 => "Esgotado".to_string(),
        1..=5 => format!("Últimas {stock}"),
        _ => "Em estoque".to_string(),
    }
}

fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Outro".to_string(),
    }
}

#[derive(Debug, Default)]
pub struct MenuView {
    products: Vec<Product>,
    /// First-seen order; categories are never dropped while the view lives
    categories: Vec<String>,
    active_category: Option<String>,
    search: String,
}

impl MenuView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the product list with a new snapshot. Inactive products are
    /// ignored even if the feed delivers them.
    pub fn replace_products(&mut self, products: Vec<Product>) {
        self.products = products.into_iter().filter(|p| p.is_active).collect();
        for product in &self.products {
            if !self.categories.iter().any(|c| c == &product.category) {
                self.categories.push(product.category.clone());
            }
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// `None` or `todos` shows every category
    pub fn select_category(&mut self, category: Option<&str>) {
        self.active_category = category
            .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES)
            .map(str::to_string);
    }

    pub fn set_search(&mut self, term: &str) {
        self.search = term.trim().to_lowercase();
    }

    pub fn category_buttons(&self) -> Vec<CategoryButton> {
        let all = CategoryButton {
            key: ALL_CATEGORIES.to_string(),
            label: "Todos".to_string(),
            active: self.active_category.is_none(),
        };
        std::iter::once(all)
            .chain(self.categories.iter().map(|c| CategoryButton {
                key: c.clone(),
                label: category_display_name(c),
                active: self.active_category.as_deref() == Some(c.as_str()),
            }))
            .collect()
    }

    /// A non-empty search spans all categories; otherwise the selected
    /// category applies.
    pub fn visible(&self) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.is_available())
            .filter(|p| {
                if self.search.is_empty() {
                    self.active_category
                        .as_deref()
                        .is_none_or(|c| p.category == c)
                } else {
                    p.name.to_lowercase().contains(&self.search)
                        || p.description.to_lowercase().contains(&self.search)
                }
            })
            .collect()
    }

    pub fn cards(&self) -> Vec<MenuCard> {
        self.visible()
            .into_iter()
            .map(|p| MenuCard {
                id: p.id.clone(),
                name: p.name.clone(),
                description: if p.description.is_empty() {
                    "Sem descrição".to_string()
                } else {
                    p.description.clone()
                },
                category: capitalize(&p.category),
                price: format_brl(p.price),
                available: p.is_available(),
                status_label: if p.is_available() { "Disponível" } else { "Esgotado" },
                stock_label: stock_label(p.stock),
                image_url: p.image_url.clone(),
            })
            .collect()
    }
}

impl ProductLookup for MenuView {
    fn find_product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::models::ProductKind;

    fn product(id: &str, name: &str, category: &str, stock: u32) -> Product {
        Product {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price: Decimal::new(890, 2),
            stock,
            category: category.into(),
            is_active: true,
            kind: ProductKind::Normal,
            addon_categories: Vec::new(),
            image_url: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn view() -> MenuView {
        let mut v = MenuView::new();
        v.replace_products(vec![
            product("1", "X-Burguer", "lanche", 3),
            product("2", "Coca-Cola", "bebida", 20),
            product("3", "Pudim", "sobremesa", 0),
            product("4", "Suco de laranja", "bebida", 8),
        ]);
        v
    }

    #[test]
    fn test_sold_out_hidden_but_still_looked_up() {
        let v = view();
        let ids: Vec<&str> = v.visible().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "4"]);
        assert_eq!(v.find_product("3").map(|p| p.stock), Some(0));
    }

    #[test]
    fn test_categories_first_seen_and_kept() {
        let mut v = view();
        let labels: Vec<String> = v.category_buttons().into_iter().map(|b| b.label).collect();
        assert_eq!(labels, vec!["Todos", "Lanches", "Bebidas", "Sobremesas"]);

        v.replace_products(vec![product("9", "Pastel", "salgados", 4)]);
        let keys: Vec<String> = v.category_buttons().into_iter().map(|b| b.key).collect();
        assert_eq!(keys, vec!["todos", "lanche", "bebida", "sobremesa", "salgados"]);
    }

    #[test]
    fn test_category_filter_and_search() {
        let mut v = view();
        v.select_category(Some("bebida"));
        assert_eq!(v.visible().len(), 2);
        assert!(v.category_buttons().iter().any(|b| b.key == "bebida" && b.active));

        // search ignores the selected category
        v.set_search("BURG");
        let found = v.visible();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "1");

        v.set_search("  ");
        assert_eq!(v.visible().len(), 2);

        v.select_category(Some(ALL_CATEGORIES));
        assert_eq!(v.visible().len(), 3);
    }

    #[test]
    fn test_cards() {
        let v = view();
        let cards = v.cards();
        assert_eq!(cards[0].price, "R$ 8,90");
        assert_eq!(cards[0].stock_label, "Últimas 3");
        assert_eq!(cards[0].category, "Lanche");
        assert_eq!(cards[0].description, "Sem descrição");
        assert_eq!(cards[1].stock_label, "Em estoque");
        assert_eq!(cards[1].status_label, "Disponível");
        assert_eq!(stock_label(0), "Esgotado");
    }
}
