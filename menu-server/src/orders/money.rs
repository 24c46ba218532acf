//! Money calculation utilities using rust_decimal for precision
//!
//! All amounts are kept as `Decimal` and rounded to cents (half away from
//! zero) at the edges.

use rust_decimal::Decimal;
use shared::models::{CartItem, OrderItem};

use crate::utils::format::round_money;

/// Flat delivery fee added to every order (5.00)
pub const DELIVERY_FEE: Decimal = Decimal::from_parts(500, 0, 0, false, 2);

pub fn line_total(unit_price: Decimal, quantity: u32) -> Decimal {
    round_money(unit_price * Decimal::from(quantity))
}

/// Snapshot cart lines into order lines
pub fn order_items(cart: &[CartItem]) -> Vec<OrderItem> {
    cart.iter()
        .map(|item| OrderItem {
            product_id: item.product_id.clone(),
            name: item.name.clone(),
            unit_price: item.price,
            quantity: item.quantity,
            line_total: line_total(item.price, item.quantity),
        })
        .collect()
}

pub fn subtotal(items: &[OrderItem]) -> Decimal {
    round_money(items.iter().map(|i| i.line_total).sum())
}

pub fn order_total(subtotal: Decimal) -> Decimal {
    round_money(subtotal + DELIVERY_FEE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart_item(id: &str, price: Decimal, quantity: u32) -> CartItem {
        CartItem {
            product_id: id.into(),
            name: id.to_uppercase(),
            price,
            quantity,
            image_url: None,
            max_quantity: 99,
        }
    }

    #[test]
    fn test_delivery_fee_constant() {
        assert_eq!(DELIVERY_FEE, Decimal::new(500, 2));
    }

    #[test]
    fn test_totals_from_cart() {
        let items = order_items(&[
            cart_item("p1", Decimal::new(1000, 2), 2),
            cart_item("p2", Decimal::new(333, 2), 3),
        ]);
        assert_eq!(items[1].line_total, Decimal::new(999, 2));

        let sub = subtotal(&items);
        assert_eq!(sub, Decimal::new(2999, 2));
        assert_eq!(order_total(sub), Decimal::new(3499, 2));
    }
}
