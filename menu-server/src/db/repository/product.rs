//! Product Repository
//!
//! Stock lives in two document fields (`quantidade` and the older
//! `quantidadeEstoque`). This repository is the only place aware of that:
//! reads resolve one canonical value, every write and adjustment touches both.

use std::sync::Arc;

use serde_json::{Value, json};
use shared::models::{Product, ProductDraft, ProductKind};

use super::{BaseRepository, RepoError, RepoResult, money_value, read_count, read_millis, read_money, read_string};
use crate::db::store::{
    Direction, DocumentStore, Patch, Query, Snapshot, StoreResult, WriteBatch,
};
use crate::db::subscription::Subscription;

pub const PRODUCT_COLLECTION: &str = "produtos";

pub const FIELD_NAME: &str = "nome";
pub const FIELD_DESCRIPTION: &str = "descricao";
pub const FIELD_PRICE: &str = "preco";
pub const FIELD_STOCK: &str = "quantidade";
pub const FIELD_LEGACY_STOCK: &str = "quantidadeEstoque";
pub const FIELD_CATEGORY: &str = "categoria";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_KIND: &str = "tipo";
pub const FIELD_ADDON_CATEGORIES: &str = "categoriasAdicionais";
pub const FIELD_IMAGE_URL: &str = "imagemURL";
pub const FIELD_CREATED_AT: &str = "dataCadastro";
pub const FIELD_UPDATED_AT: &str = "dataAtualizacao";

pub const STATUS_ON: &str = "on";
pub const STATUS_OFF: &str = "off";

// =============================================================================
// Product Repository
// =============================================================================

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            base: BaseRepository::new(store),
        }
    }

    /// All products, newest first
    pub fn all_query() -> Query {
        Query::collection(PRODUCT_COLLECTION).order_by(FIELD_CREATED_AT, Direction::Descending)
    }

    /// Products visible on the public menu
    pub fn active_query() -> Query {
        Query::collection(PRODUCT_COLLECTION).where_eq(FIELD_STATUS, STATUS_ON)
    }

    pub async fn find_all(&self) -> RepoResult<Vec<Product>> {
        let snaps = self.base.store().query(&Self::all_query()).await?;
        Ok(snaps.iter().map(Self::from_snapshot).collect())
    }

    pub async fn find_active(&self) -> RepoResult<Vec<Product>> {
        let snaps = self.base.store().query(&Self::active_query()).await?;
        Ok(snaps.iter().map(Self::from_snapshot).collect())
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let snap = self.base.store().get(PRODUCT_COLLECTION, id).await?;
        Ok(snap.as_ref().map(Self::from_snapshot))
    }

    /// Creates a product; the store assigns the id
    pub async fn create(&self, draft: &ProductDraft) -> RepoResult<String> {
        let patch = Self::draft_patch(draft)
            .server_timestamp(FIELD_CREATED_AT)
            .server_timestamp(FIELD_UPDATED_AT);
        let id = self.base.store().add(PRODUCT_COLLECTION, patch).await?;
        tracing::info!(product_id = %id, name = %draft.name, "Product created");
        Ok(id)
    }

    /// Overwrites the editable fields of an existing product
    pub async fn update(&self, id: &str, draft: &ProductDraft) -> RepoResult<()> {
        let patch = Self::draft_patch(draft).server_timestamp(FIELD_UPDATED_AT);
        self.base
            .store()
            .update(PRODUCT_COLLECTION, id, patch)
            .await
            .map_err(RepoError::from)?;
        tracing::info!(product_id = %id, "Product updated");
        Ok(())
    }

    pub async fn set_active(&self, id: &str, active: bool) -> RepoResult<()> {
        let patch = Patch::new()
            .set(FIELD_STATUS, status_value(active))
            .server_timestamp(FIELD_UPDATED_AT);
        self.base
            .store()
            .update(PRODUCT_COLLECTION, id, patch)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        self.base.store().delete(PRODUCT_COLLECTION, id).await?;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    pub async fn subscribe_all(&self) -> RepoResult<Subscription> {
        Ok(self.base.store().subscribe(Self::all_query()).await?)
    }

    pub async fn subscribe_active(&self) -> RepoResult<Subscription> {
        Ok(self.base.store().subscribe(Self::active_query()).await?)
    }

    /// Queues a stock change on both stock fields.
    /// Negative `delta` takes stock out, positive puts it back.
    ///
    /// Both fields get an atomic increment when both hold numbers. A document
    /// missing one of them (or holding a legacy string) gets both set from its
    /// canonical stock instead, so the pair never diverges.
    pub async fn queue_stock_adjustment(
        &self,
        batch: &mut WriteBatch,
        product_id: &str,
        delta: i64,
    ) -> StoreResult<()> {
        let snap = self.base.store().get(PRODUCT_COLLECTION, product_id).await?;
        let patch = match snap {
            Some(snap) if !has_numeric_stock_fields(&snap) => {
                let next = (i64::from(canonical_stock(&snap)) + delta).max(0);
                tracing::debug!(product_id, stock = next, "Normalizing stock fields");
                Patch::new()
                    .set(FIELD_STOCK, next)
                    .set(FIELD_LEGACY_STOCK, next)
            }
            // a missing product fails the batch with NotFound at commit
            _ => Patch::new()
                .increment(FIELD_STOCK, delta)
                .increment(FIELD_LEGACY_STOCK, delta),
        };
        batch.update(PRODUCT_COLLECTION, product_id, patch);
        Ok(())
    }

    /// Copies the canonical stock into whichever stock field is missing.
    /// Returns how many documents were rewritten; all in one batch.
    pub async fn migrate_legacy_stock(&self) -> RepoResult<usize> {
        let snaps = self
            .base
            .store()
            .query(&Query::collection(PRODUCT_COLLECTION))
            .await?;

        let mut batch = WriteBatch::new();
        for snap in &snaps {
            let has_stock = snap.get(FIELD_STOCK).is_some();
            let has_legacy = snap.get(FIELD_LEGACY_STOCK).is_some();
            if has_stock && has_legacy {
                continue;
            }
            let stock = canonical_stock(snap);
            batch.update(
                PRODUCT_COLLECTION,
                &snap.id,
                Patch::new()
                    .set(FIELD_STOCK, stock)
                    .set(FIELD_LEGACY_STOCK, stock)
                    .server_timestamp(FIELD_UPDATED_AT),
            );
        }

        let migrated = batch.len();
        if migrated > 0 {
            self.base.store().commit(batch).await?;
        }
        tracing::info!(migrated, "Legacy stock fields migrated");
        Ok(migrated)
    }

    // ========== Mapping ==========

    fn draft_patch(draft: &ProductDraft) -> Patch {
        let addon_categories = match draft.kind {
            ProductKind::Addon => draft.addon_categories.clone(),
            ProductKind::Normal => Vec::new(),
        };
        Patch::new()
            .set(FIELD_NAME, draft.name.clone())
            .set(FIELD_DESCRIPTION, draft.description.clone())
            .set(FIELD_PRICE, money_value(draft.price))
            .set(FIELD_STOCK, draft.stock)
            .set(FIELD_LEGACY_STOCK, draft.stock)
            .set(FIELD_CATEGORY, draft.category.clone())
            .set(FIELD_STATUS, status_value(draft.is_active))
            .set(FIELD_KIND, draft.kind.as_str())
            .set(FIELD_ADDON_CATEGORIES, json!(addon_categories))
            .set(
                FIELD_IMAGE_URL,
                draft.image_url.clone().map(Value::from).unwrap_or(Value::Null),
            )
    }

    /// Never fails: malformed fields fall back to safe defaults with a warning
    pub fn from_snapshot(snap: &Snapshot) -> Product {
        let price = read_money(snap.get(FIELD_PRICE)).unwrap_or_else(|| {
            tracing::warn!(product_id = %snap.id, "Product has no valid price, using 0");
            Default::default()
        });

        Product {
            id: snap.id.clone(),
            name: read_string(snap.get(FIELD_NAME)).unwrap_or_default(),
            description: read_string(snap.get(FIELD_DESCRIPTION)).unwrap_or_default(),
            price: if price.is_sign_negative() { Default::default() } else { price },
            stock: canonical_stock(snap),
            category: read_string(snap.get(FIELD_CATEGORY)).unwrap_or_else(|| "outro".into()),
            is_active: is_active_value(snap.get(FIELD_STATUS)),
            kind: snap
                .get_str(FIELD_KIND)
                .map(ProductKind::parse)
                .unwrap_or_default(),
            addon_categories: snap
                .get(FIELD_ADDON_CATEGORIES)
                .and_then(Value::as_array)
                .map(|arr| {
                    arr.iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default(),
            image_url: snap
                .get_str(FIELD_IMAGE_URL)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            created_at: read_millis(snap.get(FIELD_CREATED_AT)),
            updated_at: read_millis(snap.get(FIELD_UPDATED_AT)),
        }
    }
}

fn status_value(active: bool) -> &'static str {
    if active { STATUS_ON } else { STATUS_OFF }
}

/// `"on"` or a legacy boolean `true`
fn is_active_value(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) => s == STATUS_ON,
        Some(Value::Bool(b)) => *b,
        _ => false,
    }
}

fn has_numeric_stock_fields(snap: &Snapshot) -> bool {
    [FIELD_STOCK, FIELD_LEGACY_STOCK]
        .iter()
        .all(|field| snap.get(field).is_some_and(Value::is_number))
}

/// First present of `quantidade`, then `quantidadeEstoque`, else 0.
/// Negative values clamp to 0.
fn canonical_stock(snap: &Snapshot) -> u32 {
    let raw = snap
        .get(FIELD_STOCK)
        .or_else(|| snap.get(FIELD_LEGACY_STOCK));
    let Some(raw) = raw else {
        return 0;
    };
    match read_count(Some(raw)) {
        Some(n) if n < 0 => {
            tracing::warn!(product_id = %snap.id, stock = n, "Negative stock, clamping to 0");
            0
        }
        Some(n) => u32::try_from(n).unwrap_or(u32::MAX),
        None => {
            tracing::warn!(product_id = %snap.id, value = %raw, "Unreadable stock, using 0");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::db::store::Document;
    use rust_decimal::Decimal;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn draft(name: &str, stock: u32) -> ProductDraft {
        ProductDraft {
            name: name.into(),
            description: "Frango".into(),
            price: Decimal::new(650, 2),
            stock,
            category: "comida".into(),
            is_active: true,
            kind: ProductKind::Normal,
            addon_categories: vec!["bebida".into()],
            image_url: None,
        }
    }

    fn snap(value: Value) -> Snapshot {
        Snapshot {
            id: "p1".into(),
            data: doc(value),
        }
    }

    #[test]
    fn test_canonical_stock_prefers_quantidade() {
        assert_eq!(
            canonical_stock(&snap(json!({"quantidade": 4, "quantidadeEstoque": 9}))),
            4
        );
        assert_eq!(canonical_stock(&snap(json!({"quantidadeEstoque": 9}))), 9);
        assert_eq!(canonical_stock(&snap(json!({"quantidade": "7"}))), 7);
        assert_eq!(canonical_stock(&snap(json!({"quantidade": -3}))), 0);
        assert_eq!(canonical_stock(&snap(json!({}))), 0);
    }

    #[test]
    fn test_from_snapshot_accepts_legacy_status() {
        let p = ProductRepository::from_snapshot(&snap(json!({
            "nome": "Suco",
            "preco": "4,50",
            "status": true,
            "categoria": "bebida",
        })));
        assert!(p.is_active);
        assert_eq!(p.price, Decimal::new(450, 2));
        assert_eq!(p.kind, ProductKind::Normal);

        let off = ProductRepository::from_snapshot(&snap(json!({"status": "off"})));
        assert!(!off.is_active);
        assert_eq!(off.category, "outro");
    }

    #[tokio::test]
    async fn test_create_writes_both_stock_fields() {
        let store = Arc::new(MemoryStore::new());
        let repo = ProductRepository::new(store.clone());

        let id = repo.create(&draft("Coxinha", 12)).await.unwrap();
        let raw = store.get(PRODUCT_COLLECTION, &id).await.unwrap().unwrap();
        assert_eq!(raw.get(FIELD_STOCK), Some(&json!(12)));
        assert_eq!(raw.get(FIELD_LEGACY_STOCK), Some(&json!(12)));
        assert_eq!(raw.get(FIELD_STATUS), Some(&json!("on")));
        // normal products carry no addon categories
        assert_eq!(raw.get(FIELD_ADDON_CATEGORIES), Some(&json!([])));

        let product = repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(product.stock, 12);
        assert!(product.created_at.is_some());
    }

    #[tokio::test]
    async fn test_adjust_stock_moves_both_fields() {
        let store = Arc::new(MemoryStore::new());
        store.insert_raw(
            PRODUCT_COLLECTION,
            "p1",
            doc(json!({"quantidade": 5, "quantidadeEstoque": 5})),
        );
        let repo = ProductRepository::new(store.clone());

        let mut batch = WriteBatch::new();
        repo.queue_stock_adjustment(&mut batch, "p1", -2).await.unwrap();
        store.commit(batch).await.unwrap();

        let raw = store.get(PRODUCT_COLLECTION, "p1").await.unwrap().unwrap();
        assert_eq!(raw.get(FIELD_STOCK), Some(&json!(3)));
        assert_eq!(raw.get(FIELD_LEGACY_STOCK), Some(&json!(3)));
    }

    #[tokio::test]
    async fn test_adjust_stock_fills_missing_field() {
        let store = Arc::new(MemoryStore::new());
        store.insert_raw(PRODUCT_COLLECTION, "old", doc(json!({"quantidadeEstoque": 8})));
        store.insert_raw(PRODUCT_COLLECTION, "text", doc(json!({"quantidade": "4"})));
        let repo = ProductRepository::new(store.clone());

        let mut batch = WriteBatch::new();
        repo.queue_stock_adjustment(&mut batch, "old", -2).await.unwrap();
        repo.queue_stock_adjustment(&mut batch, "text", 1).await.unwrap();
        store.commit(batch).await.unwrap();

        let old = store.get(PRODUCT_COLLECTION, "old").await.unwrap().unwrap();
        assert_eq!(old.get(FIELD_STOCK), Some(&json!(6)));
        assert_eq!(old.get(FIELD_LEGACY_STOCK), Some(&json!(6)));
        assert_eq!(ProductRepository::from_snapshot(&old).stock, 6);

        let text = store.get(PRODUCT_COLLECTION, "text").await.unwrap().unwrap();
        assert_eq!(text.get(FIELD_STOCK), Some(&json!(5)));
        assert_eq!(text.get(FIELD_LEGACY_STOCK), Some(&json!(5)));
    }

    #[tokio::test]
    async fn test_update_missing_product_is_not_found() {
        let repo = ProductRepository::new(Arc::new(MemoryStore::new()));
        let err = repo.update("nope", &draft("X", 1)).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_migrate_legacy_stock() {
        let store = Arc::new(MemoryStore::new());
        store.insert_raw(PRODUCT_COLLECTION, "old", doc(json!({"quantidadeEstoque": 8})));
        store.insert_raw(
            PRODUCT_COLLECTION,
            "new",
            doc(json!({"quantidade": 2, "quantidadeEstoque": 2})),
        );
        let repo = ProductRepository::new(store.clone());

        assert_eq!(repo.migrate_legacy_stock().await.unwrap(), 1);
        let raw = store.get(PRODUCT_COLLECTION, "old").await.unwrap().unwrap();
        assert_eq!(raw.get(FIELD_STOCK), Some(&json!(8)));

        assert_eq!(repo.migrate_legacy_stock().await.unwrap(), 0);
    }
}
