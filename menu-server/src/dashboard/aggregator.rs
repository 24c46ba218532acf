//! Sales-of-the-day aggregation
//!
//! Everything here is a pure function of the latest snapshot. Metrics come
//! from the finalized bucket only.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{Order, OrderStatus};

use crate::utils::format::{count_label, format_brl, round_money, truncate_label};

/// Characters of the best seller's name shown on the summary card
pub const BEST_SELLER_LABEL_LEN: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Finalized,
    Pending,
    Cancelled,
}

impl Bucket {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "finalizadas" | "finalized" => Some(Self::Finalized),
            "pendentes" | "pending" => Some(Self::Pending),
            "canceladas" | "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Plural label used in file names and messages
    pub fn label(&self) -> &'static str {
        match self {
            Self::Finalized => "finalizadas",
            Self::Pending => "pendentes",
            Self::Cancelled => "canceladas",
        }
    }
}

/// Orders of one day split by status. Unknown statuses were already read
/// as pending by the repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Buckets {
    pub finalized: Vec<Order>,
    pub pending: Vec<Order>,
    pub cancelled: Vec<Order>,
}

impl Buckets {
    pub fn partition(orders: Vec<Order>) -> Self {
        let mut buckets = Self::default();
        for order in orders {
            match order.status {
                OrderStatus::Finalized => buckets.finalized.push(order),
                OrderStatus::Pending => buckets.pending.push(order),
                OrderStatus::Cancelled => buckets.cancelled.push(order),
            }
        }
        buckets
    }

    pub fn get(&self, bucket: Bucket) -> &[Order] {
        match bucket {
            Bucket::Finalized => &self.finalized,
            Bucket::Pending => &self.pending,
            Bucket::Cancelled => &self.cancelled,
        }
    }

    pub fn counts(&self) -> BucketCounts {
        BucketCounts {
            finalized: self.finalized.len(),
            pending: self.pending.len(),
            cancelled: self.cancelled.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BucketCounts {
    pub finalized: usize,
    pub pending: usize,
    pub cancelled: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BestSeller {
    pub name: String,
    pub quantity: u32,
}

/// Raw metrics over the finalized orders
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SalesSummary {
    pub total_revenue: Decimal,
    pub order_count: usize,
    pub units_sold: u32,
    pub distinct_products: usize,
    pub average_ticket: Decimal,
    pub best_seller: Option<BestSeller>,
}

impl SalesSummary {
    pub fn from_finalized(orders: &[Order]) -> Self {
        if orders.is_empty() {
            return Self::default();
        }

        let total_revenue: Decimal = orders.iter().map(|o| o.total).sum();
        let order_count = orders.len();

        // Insertion order is kept so ties go to the first product seen
        let mut per_product: Vec<(String, u32)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut units_sold = 0u32;
        for item in orders.iter().flat_map(|o| o.items.iter()) {
            units_sold = units_sold.saturating_add(item.quantity);
            match index.get(&item.name) {
                Some(&i) => {
                    per_product[i].1 = per_product[i].1.saturating_add(item.quantity);
                }
                None => {
                    index.insert(item.name.clone(), per_product.len());
                    per_product.push((item.name.clone(), item.quantity));
                }
            }
        }

        let mut best_seller: Option<BestSeller> = None;
        for (name, quantity) in &per_product {
            if *quantity > best_seller.as_ref().map_or(0, |b| b.quantity) {
                best_seller = Some(BestSeller {
                    name: name.clone(),
                    quantity: *quantity,
                });
            }
        }

        Self {
            total_revenue: round_money(total_revenue),
            order_count,
            units_sold,
            distinct_products: per_product.len(),
            average_ticket: round_money(total_revenue / Decimal::from(order_count)),
            best_seller,
        }
    }

    pub fn formatted(&self) -> FormattedSummary {
        FormattedSummary {
            total_sales: format_brl(self.total_revenue),
            sales_count: count_label(self.order_count, "venda", "vendas"),
            units_sold: self.units_sold.to_string(),
            distinct_products: count_label(self.distinct_products, "tipo", "tipos"),
            average_ticket: format_brl(self.average_ticket),
            best_product: self
                .best_seller
                .as_ref()
                .map(|b| truncate_label(&b.name, BEST_SELLER_LABEL_LEN))
                .unwrap_or_else(|| "-".to_string()),
            best_product_quantity: format!(
                "{} un",
                self.best_seller.as_ref().map_or(0, |b| b.quantity)
            ),
        }
    }
}

/// Summary cards as displayed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedSummary {
    pub total_sales: String,
    pub sales_count: String,
    pub units_sold: String,
    pub distinct_products: String,
    pub average_ticket: String,
    pub best_product: String,
    pub best_product_quantity: String,
}

/// One table row per order line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleRow {
    /// Store id, for row actions
    pub doc_id: String,
    /// Only on the first line of an order
    pub order_id: Option<String>,
    pub product: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    /// Only on the first line of an order
    pub time: Option<String>,
    /// Cancelled bucket only
    pub reason: Option<String>,
}

impl SaleRow {
    fn text(&self) -> String {
        let mut cells: Vec<&str> = Vec::with_capacity(7);
        let quantity = self.quantity.to_string();
        if let Some(id) = &self.order_id {
            cells.push(id);
        }
        cells.extend([
            self.product.as_str(),
            quantity.as_str(),
            self.unit_price.as_str(),
            self.line_total.as_str(),
        ]);
        if let Some(time) = &self.time {
            cells.push(time);
        }
        if let Some(reason) = &self.reason {
            cells.push(reason);
        }
        cells.join(" ").to_lowercase()
    }

    /// Case-insensitive match against every visible cell
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty() || self.text().contains(&term)
    }
}

pub fn rows(bucket: Bucket, orders: &[Order]) -> Vec<SaleRow> {
    orders
        .iter()
        .flat_map(|order| {
            order.items.iter().enumerate().map(move |(i, item)| {
                let first = i == 0;
                SaleRow {
                    doc_id: order.id.clone(),
                    order_id: first.then(|| format!("#{}", order.id)),
                    product: item.name.clone(),
                    quantity: item.quantity,
                    unit_price: format_brl(item.unit_price),
                    line_total: format_brl(item.line_total),
                    time: first.then(|| order.time.clone()),
                    reason: (bucket == Bucket::Cancelled).then(|| {
                        order
                            .cancellation_reason
                            .clone()
                            .unwrap_or_else(|| "Não informado".to_string())
                    }),
                }
            })
        })
        .collect()
}

pub fn search_rows(rows: Vec<SaleRow>, term: &str) -> Vec<SaleRow> {
    rows.into_iter().filter(|r| r.matches(term)).collect()
}

/// Banner text when the number of pending orders changed
pub fn pending_notice(previous: usize, current: usize) -> Option<String> {
    (current > 0 && current != previous)
        .then(|| format!("{current} novo(s) pedido(s) pendente(s)!"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::OrderItem;

    fn item(name: &str, price: i64, quantity: u32) -> OrderItem {
        let unit_price = Decimal::new(price, 2);
        OrderItem {
            product_id: name.to_lowercase(),
            name: name.into(),
            unit_price,
            quantity,
            line_total: unit_price * Decimal::from(quantity),
        }
    }

    fn order(id: &str, status: OrderStatus, total: i64, items: Vec<OrderItem>) -> Order {
        Order {
            id: id.into(),
            items,
            subtotal: Decimal::new(total - 500, 2),
            delivery_fee: Decimal::new(500, 2),
            total: Decimal::new(total, 2),
            date: "2024-06-01".into(),
            time: "12:30".into(),
            status,
            cancellation_reason: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn day() -> Vec<Order> {
        vec![
            order(
                "PED1",
                OrderStatus::Finalized,
                5680,
                vec![item("Hambúrguer Clássico", 2590, 2)],
            ),
            order(
                "PED2",
                OrderStatus::Finalized,
                4390,
                vec![item("Pizza Margherita", 3890, 1)],
            ),
            order("PED3", OrderStatus::Pending, 1000, vec![item("Suco", 500, 1)]),
            order("PED4", OrderStatus::Cancelled, 1000, vec![item("Suco", 500, 1)]),
        ]
    }

    #[test]
    fn test_partition() {
        let b = Buckets::partition(day());
        assert_eq!(
            b.counts(),
            BucketCounts {
                finalized: 2,
                pending: 1,
                cancelled: 1
            }
        );
    }

    #[test]
    fn test_summary_of_two_finalized_orders() {
        let b = Buckets::partition(day());
        let summary = SalesSummary::from_finalized(&b.finalized);
        assert_eq!(summary.total_revenue, Decimal::new(10070, 2));
        assert_eq!(summary.units_sold, 3);
        assert_eq!(summary.average_ticket, Decimal::new(5035, 2));

        let f = summary.formatted();
        assert_eq!(f.total_sales, "R$ 100,70");
        assert_eq!(f.sales_count, "2 vendas");
        assert_eq!(f.distinct_products, "2 tipos");
        assert_eq!(f.best_product, "Hambúrguer Clás...");
        assert_eq!(f.best_product_quantity, "2 un");
    }

    #[test]
    fn test_empty_summary() {
        let f = SalesSummary::from_finalized(&[]).formatted();
        assert_eq!(f.total_sales, "R$ 0,00");
        assert_eq!(f.sales_count, "0 vendas");
        assert_eq!(f.best_product, "-");
        assert_eq!(f.best_product_quantity, "0 un");
        assert_eq!(f.average_ticket, "R$ 0,00");
    }

    #[test]
    fn test_best_seller_tie_goes_to_first_seen() {
        let orders = vec![
            order("A", OrderStatus::Finalized, 1000, vec![item("Pastel", 500, 2)]),
            order("B", OrderStatus::Finalized, 1000, vec![item("Coxinha", 500, 2)]),
        ];
        let summary = SalesSummary::from_finalized(&orders);
        assert_eq!(summary.best_seller.as_ref().unwrap().name, "Pastel");
        assert_eq!(summary.formatted().sales_count, "2 vendas");

        let one = SalesSummary::from_finalized(&orders[..1]).formatted();
        assert_eq!(one.sales_count, "1 venda");
        assert_eq!(one.distinct_products, "1 tipo");
    }

    #[test]
    fn test_unit_counts_saturate() {
        let orders = vec![
            order("A", OrderStatus::Finalized, 1000, vec![item("Pastel", 1, u32::MAX)]),
            order("B", OrderStatus::Finalized, 1000, vec![item("Pastel", 1, 5)]),
        ];
        let summary = SalesSummary::from_finalized(&orders);
        assert_eq!(summary.units_sold, u32::MAX);
        assert_eq!(summary.best_seller.as_ref().unwrap().quantity, u32::MAX);
    }

    #[test]
    fn test_rows_repeat_id_only_on_first_line() {
        let mut cancelled = order(
            "PED9",
            OrderStatus::Cancelled,
            2000,
            vec![item("Suco", 500, 1), item("Pastel", 1000, 1)],
        );
        let r = rows(Bucket::Cancelled, std::slice::from_ref(&cancelled));
        assert_eq!(r.len(), 2);
        assert_eq!(r[0].order_id.as_deref(), Some("#PED9"));
        assert_eq!(r[0].time.as_deref(), Some("12:30"));
        assert!(r[1].order_id.is_none());
        assert!(r[1].time.is_none());
        assert_eq!(r[1].reason.as_deref(), Some("Não informado"));

        cancelled.cancellation_reason = Some("Cliente desistiu".into());
        let r = rows(Bucket::Cancelled, std::slice::from_ref(&cancelled));
        assert_eq!(r[1].reason.as_deref(), Some("Cliente desistiu"));

        let finalized = rows(Bucket::Finalized, &day()[..1]);
        assert!(finalized[0].reason.is_none());
        assert_eq!(finalized[0].line_total, "R$ 51,80");
    }

    #[test]
    fn test_row_search() {
        let all = rows(Bucket::Finalized, &day()[..2]);
        assert_eq!(search_rows(all.clone(), "pizza").len(), 1);
        assert_eq!(search_rows(all.clone(), "#ped1").len(), 1);
        assert_eq!(search_rows(all.clone(), "R$ 25,90").len(), 1);
        assert_eq!(search_rows(all, "").len(), 2);
    }

    #[test]
    fn test_pending_notice() {
        assert_eq!(pending_notice(0, 0), None);
        assert_eq!(pending_notice(2, 2), None);
        assert_eq!(
            pending_notice(1, 2).as_deref(),
            Some("2 novo(s) pedido(s) pendente(s)!")
        );
    }
}
