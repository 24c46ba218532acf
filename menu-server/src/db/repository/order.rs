//! Order Repository

use std::sync::Arc;

use serde_json::{Value, json};
use shared::models::{Order, OrderItem, OrderStatus};

use super::{
    BaseRepository, RepoResult, money_value, read_count, read_millis, read_money, read_string,
};
use crate::db::store::{DocumentStore, Patch, Precondition, Query, Snapshot, WriteBatch};
use crate::db::subscription::Subscription;

pub const ORDER_COLLECTION: &str = "pedidos";

pub const FIELD_ORDER_ID: &str = "idPedido";
pub const FIELD_ITEMS: &str = "itens";
pub const FIELD_SUBTOTAL: &str = "subtotal";
pub const FIELD_DELIVERY_FEE: &str = "taxaEntrega";
pub const FIELD_TOTAL: &str = "total";
pub const FIELD_DATE: &str = "data";
pub const FIELD_TIME: &str = "hora";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_CANCEL_REASON: &str = "motivoCancelamento";
pub const FIELD_CREATED_AT: &str = "criadoEm";
pub const FIELD_UPDATED_AT: &str = "atualizadoEm";

const ITEM_PRODUCT_ID: &str = "produtoId";
const ITEM_NAME: &str = "nome";
const ITEM_PRICE: &str = "preco";
const ITEM_QUANTITY: &str = "quantidade";
const ITEM_TOTAL: &str = "totalItem";

// =============================================================================
// Order Repository
// =============================================================================

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            base: BaseRepository::new(store),
        }
    }

    /// Orders of one business day (`data == YYYY-MM-DD`)
    pub fn by_date_query(date: &str) -> Query {
        Query::collection(ORDER_COLLECTION).where_eq(FIELD_DATE, date)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let snap = self.base.store().get(ORDER_COLLECTION, id).await?;
        Ok(snap.as_ref().map(Self::from_snapshot))
    }

    pub async fn find_by_date(&self, date: &str) -> RepoResult<Vec<Order>> {
        let snaps = self.base.store().query(&Self::by_date_query(date)).await?;
        Ok(snaps.iter().map(Self::from_snapshot).collect())
    }

    pub async fn subscribe_by_date(&self, date: &str) -> RepoResult<Subscription> {
        Ok(self
            .base
            .store()
            .subscribe(Self::by_date_query(date))
            .await?)
    }

    /// Queues creation of a new order; the batch fails if the id is taken
    pub fn queue_create(batch: &mut WriteBatch, order: &Order) {
        let items: Vec<Value> = order
            .items
            .iter()
            .map(|item| {
                json!({
                    ITEM_PRODUCT_ID: item.product_id,
                    ITEM_NAME: item.name,
                    ITEM_PRICE: money_value(item.unit_price),
                    ITEM_QUANTITY: item.quantity,
                    ITEM_TOTAL: money_value(item.line_total),
                })
            })
            .collect();

        let patch = Patch::new()
            .set(FIELD_ORDER_ID, order.id.clone())
            .set(FIELD_ITEMS, Value::Array(items))
            .set(FIELD_SUBTOTAL, money_value(order.subtotal))
            .set(FIELD_DELIVERY_FEE, money_value(order.delivery_fee))
            .set(FIELD_TOTAL, money_value(order.total))
            .set(FIELD_DATE, order.date.clone())
            .set(FIELD_TIME, order.time.clone())
            .set(FIELD_STATUS, order.status.as_str())
            .server_timestamp(FIELD_CREATED_AT)
            .server_timestamp(FIELD_UPDATED_AT);

        batch.create(ORDER_COLLECTION, &order.id, patch);
    }

    /// Queues pending -> finalized. Fails the batch if the order was closed
    /// in the meantime.
    pub fn queue_finalize(batch: &mut WriteBatch, order_id: &str) {
        batch.update_if(
            ORDER_COLLECTION,
            order_id,
            Patch::new()
                .set(FIELD_STATUS, OrderStatus::Finalized.as_str())
                .server_timestamp(FIELD_UPDATED_AT),
            still_open(),
        );
    }

    /// Queues pending -> cancelled with the operator's reason
    pub fn queue_cancel(batch: &mut WriteBatch, order_id: &str, reason: &str) {
        batch.update_if(
            ORDER_COLLECTION,
            order_id,
            Patch::new()
                .set(FIELD_STATUS, OrderStatus::Cancelled.as_str())
                .set(FIELD_CANCEL_REASON, reason)
                .server_timestamp(FIELD_UPDATED_AT),
            still_open(),
        );
    }

    /// Orders written before statuses existed (or with a value this system
    /// does not know) are marked finalized. One batch; returns the count.
    pub async fn migrate_legacy_status(&self) -> RepoResult<usize> {
        let snaps = self
            .base
            .store()
            .query(&Query::collection(ORDER_COLLECTION))
            .await?;

        let mut batch = WriteBatch::new();
        for snap in snaps
            .iter()
            .filter(|s| s.get_str(FIELD_STATUS).and_then(OrderStatus::parse).is_none())
        {
            batch.update(
                ORDER_COLLECTION,
                &snap.id,
                Patch::new()
                    .set(FIELD_STATUS, OrderStatus::Finalized.as_str())
                    .server_timestamp(FIELD_UPDATED_AT),
            );
        }

        let migrated = batch.len();
        if migrated > 0 {
            self.base.store().commit(batch).await?;
        }
        tracing::info!(migrated, "Legacy order statuses migrated");
        Ok(migrated)
    }

    // ========== Mapping ==========

    pub fn from_snapshot(snap: &Snapshot) -> Order {
        let items: Vec<OrderItem> = snap
            .get(FIELD_ITEMS)
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(read_item).collect())
            .unwrap_or_default();

        let subtotal = read_money(snap.get(FIELD_SUBTOTAL))
            .unwrap_or_else(|| items.iter().map(|i| i.line_total).sum());
        let delivery_fee = read_money(snap.get(FIELD_DELIVERY_FEE)).unwrap_or_default();
        let total = read_money(snap.get(FIELD_TOTAL)).unwrap_or(subtotal + delivery_fee);

        Order {
            id: snap
                .get_str(FIELD_ORDER_ID)
                .map(str::to_string)
                .unwrap_or_else(|| snap.id.clone()),
            items,
            subtotal,
            delivery_fee,
            total,
            date: read_string(snap.get(FIELD_DATE)).unwrap_or_default(),
            time: read_string(snap.get(FIELD_TIME)).unwrap_or_default(),
            status: OrderStatus::parse_lenient(snap.get_str(FIELD_STATUS)),
            cancellation_reason: read_string(snap.get(FIELD_CANCEL_REASON)),
            created_at: read_millis(snap.get(FIELD_CREATED_AT)),
            updated_at: read_millis(snap.get(FIELD_UPDATED_AT)),
        }
    }
}

fn still_open() -> Precondition {
    Precondition::FieldNotIn(
        FIELD_STATUS.to_string(),
        vec![
            json!(OrderStatus::Finalized.as_str()),
            json!(OrderStatus::Cancelled.as_str()),
        ],
    )
}

fn read_item(value: &Value) -> Option<OrderItem> {
    let obj = value.as_object()?;
    let quantity = read_count(obj.get(ITEM_QUANTITY))
        .and_then(|q| u32::try_from(q).ok())
        .unwrap_or(0);
    let unit_price = read_money(obj.get(ITEM_PRICE)).unwrap_or_default();
    let line_total = read_money(obj.get(ITEM_TOTAL))
        .unwrap_or_else(|| unit_price * rust_decimal::Decimal::from(quantity));

    Some(OrderItem {
        product_id: read_string(obj.get(ITEM_PRODUCT_ID)).unwrap_or_default(),
        name: read_string(obj.get(ITEM_NAME)).unwrap_or_default(),
        unit_price,
        quantity,
        line_total,
    })
}
