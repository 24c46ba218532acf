//! CSV export of the finalized or cancelled bucket
//!
//! `;` separated with decimal commas so spreadsheets in pt-BR locales open
//! it without an import dialog. One row per order line.

use chrono::NaiveDate;
use serde::Serialize;
use shared::models::Order;

use super::aggregator::Bucket;
use super::{DashboardError, DashboardResult};
use crate::utils::format::decimal_comma;

pub const CSV_SEPARATOR: char = ';';

const BASE_HEADER: [&str; 8] = [
    "ID Pedido",
    "Produto",
    "Quantidade",
    "Valor Unitário",
    "Total",
    "Data",
    "Hora",
    "Status",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvExport {
    pub filename: String,
    pub content: String,
    /// Orders exported, not lines
    pub orders: usize,
}

impl CsvExport {
    /// `Exportado: 3 finalizadas`
    pub fn message(&self, bucket: Bucket) -> String {
        format!("Exportado: {} {}", self.orders, bucket.label())
    }
}

fn escape(cell: &str) -> String {
    if cell.contains([CSV_SEPARATOR, '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn push_row(out: &mut String, cells: &[String]) {
    let line: Vec<String> = cells.iter().map(|c| escape(c)).collect();
    out.push_str(&line.join(&CSV_SEPARATOR.to_string()));
    out.push('\n');
}

/// Builds the file for `bucket`. Only finalized and cancelled are exportable;
/// `today` names the file.
pub fn export_bucket(bucket: Bucket, orders: &[Order], today: NaiveDate) -> DashboardResult<CsvExport> {
    if bucket == Bucket::Pending {
        return Err(DashboardError::NotExportable(bucket));
    }
    if orders.is_empty() {
        return Err(DashboardError::NothingToExport(bucket));
    }

    let with_reason = bucket == Bucket::Cancelled;
    let mut header: Vec<String> = BASE_HEADER.iter().map(|h| h.to_string()).collect();
    if with_reason {
        header.push("Motivo".to_string());
    }

    let mut content = String::new();
    push_row(&mut content, &header);

    for order in orders {
        for (i, item) in order.items.iter().enumerate() {
            let first = i == 0;
            let mut cells = vec![
                if first { order.id.clone() } else { String::new() },
                item.name.clone(),
                item.quantity.to_string(),
                decimal_comma(item.unit_price),
                decimal_comma(item.line_total),
                order.date.clone(),
                if first { order.time.clone() } else { String::new() },
                order.status.as_str().to_string(),
            ];
            if with_reason {
                cells.push(order.cancellation_reason.clone().unwrap_or_default());
            }
            push_row(&mut content, &cells);
        }
    }

    Ok(CsvExport {
        filename: format!("vendas_{}_{}.csv", bucket.label(), today.format("%Y-%m-%d")),
        content,
        orders: orders.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::models::{OrderItem, OrderStatus};

    fn order(id: &str, status: OrderStatus, reason: Option<&str>) -> Order {
        let line = |name: &str, cents: i64, quantity: u32| OrderItem {
            product_id: name.to_lowercase(),
            name: name.into(),
            unit_price: Decimal::new(cents, 2),
            quantity,
            line_total: Decimal::new(cents, 2) * Decimal::from(quantity),
        };
        Order {
            id: id.into(),
            items: vec![line("Coxinha", 650, 2), line("Suco; natural", 800, 1)],
            subtotal: Decimal::new(2100, 2),
            delivery_fee: Decimal::new(500, 2),
            total: Decimal::new(2600, 2),
            date: "2024-06-01".into(),
            time: "19:45".into(),
            status,
            cancellation_reason: reason.map(str::to_string),
            created_at: None,
            updated_at: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 2).unwrap()
    }

    #[test]
    fn test_finalized_export() {
        let csv = export_bucket(
            Bucket::Finalized,
            &[order("PED123456789", OrderStatus::Finalized, None)],
            today(),
        )
        .unwrap();

        assert_eq!(csv.filename, "vendas_finalizadas_2024-06-02.csv");
        assert_eq!(csv.message(Bucket::Finalized), "Exportado: 1 finalizadas");

        let lines: Vec<&str> = csv.content.lines().collect();
        assert_eq!(
            lines[0],
            "ID Pedido;Produto;Quantidade;Valor Unitário;Total;Data;Hora;Status"
        );
        assert_eq!(
            lines[1],
            "PED123456789;Coxinha;2;6,50;13,00;2024-06-01;19:45;finalizada"
        );
        assert_eq!(
            lines[2],
            ";\"Suco; natural\";1;8,00;8,00;2024-06-01;;finalizada"
        );
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_cancelled_export_carries_reason() {
        let csv = export_bucket(
            Bucket::Cancelled,
            &[
                order("PED1", OrderStatus::Cancelled, Some("Cliente desistiu")),
                order("PED2", OrderStatus::Cancelled, None),
            ],
            today(),
        )
        .unwrap();

        assert_eq!(csv.filename, "vendas_canceladas_2024-06-02.csv");
        let lines: Vec<&str> = csv.content.lines().collect();
        assert!(lines[0].ends_with(";Status;Motivo"));
        assert!(lines[1].ends_with(";cancelada;Cliente desistiu"));
        assert!(lines[3].ends_with(";cancelada;"));
        assert_eq!(csv.orders, 2);
    }

    #[test]
    fn test_empty_bucket_is_rejected() {
        let err = export_bucket(Bucket::Cancelled, &[], today()).unwrap_err();
        assert_eq!(err.to_string(), "Não há dados de canceladas para exportar!");
        assert!(matches!(
            export_bucket(Bucket::Pending, &[order("X", OrderStatus::Pending, None)], today()),
            Err(DashboardError::NotExportable(Bucket::Pending))
        ));
    }
}
