//! Cart Manager
//!
//! The customer's cart, persisted to client storage after every mutation.
//! Quantities are bounded by the most recently known stock at the time of
//! the change; stock moving afterwards is only caught at checkout.

use std::collections::HashMap;
use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{CartItem, CartTotals, Product};
use thiserror::Error;

use crate::confirm::ConfirmationProvider;
use crate::storage::{KEY_CART, LocalStorage, LocalStorageExt, StorageError};

pub const CLEAR_CONFIRM: &str = "Limpar carrinho?";

/// Latest known products, by id
pub trait ProductLookup {
    fn find_product(&self, id: &str) -> Option<&Product>;
}

impl ProductLookup for HashMap<String, Product> {
    fn find_product(&self, id: &str) -> Option<&Product> {
        self.get(id)
    }
}

impl ProductLookup for [Product] {
    fn find_product(&self, id: &str) -> Option<&Product> {
        self.iter().find(|p| p.id == id)
    }
}

impl ProductLookup for Vec<Product> {
    fn find_product(&self, id: &str) -> Option<&Product> {
        self.as_slice().find_product(id)
    }
}

#[derive(Debug, Error)]
pub enum CartError {
    #[error("Produto não encontrado")]
    UnknownProduct(String),

    #[error("Produto esgotado")]
    OutOfStock(String),

    #[error("Estoque insuficiente")]
    InsufficientStock { product_id: String, available: u32 },

    #[error("Quantidade máxima disponível")]
    MaxQuantity { index: usize, available: u32 },

    #[error("Item não encontrado no carrinho")]
    LineNotFound(usize),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        let message = err.to_string();
        match err {
            CartError::UnknownProduct(id) => {
                AppError::with_message(ErrorCode::ProductNotFound, message).with_detail("product_id", id)
            }
            CartError::OutOfStock(id) => {
                AppError::with_message(ErrorCode::ProductOutOfStock, message).with_detail("product_id", id)
            }
            CartError::InsufficientStock {
                product_id,
                available,
            } => AppError::with_message(ErrorCode::ProductInsufficientStock, message)
                .with_detail("product_id", product_id)
                .with_detail("available", available),
            CartError::MaxQuantity { index, available } => {
                AppError::with_message(ErrorCode::ProductInsufficientStock, message)
                    .with_detail("index", index)
                    .with_detail("available", available)
            }
            CartError::LineNotFound(index) => {
                AppError::with_message(ErrorCode::CartItemNotFound, message).with_detail("index", index)
            }
            CartError::Storage(e) => e.into(),
        }
    }
}

pub type CartResult<T> = Result<T, CartError>;

/// What a quantity change did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    Updated(u32),
    Removed,
}

pub struct CartManager {
    items: Vec<CartItem>,
    storage: Arc<dyn LocalStorage>,
}

impl std::fmt::Debug for CartManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartManager")
            .field("items", &self.items)
            .finish()
    }
}

impl CartManager {
    /// Restores the persisted cart. A missing or unreadable entry starts empty.
    pub fn load(storage: Arc<dyn LocalStorage>) -> Self {
        let items = match storage.get_json::<Vec<CartItem>>(KEY_CART) {
            Ok(Some(items)) => items.into_iter().filter(|i| i.quantity >= 1).collect(),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Persisted cart unreadable, starting empty");
                Vec::new()
            }
        };
        Self { items, storage }
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::of(&self.items)
    }

    /// Adds one unit of a product
    pub fn add(&mut self, product_id: &str, catalog: &(impl ProductLookup + ?Sized)) -> CartResult<&CartItem> {
        let product = catalog
            .find_product(product_id)
            .ok_or_else(|| CartError::UnknownProduct(product_id.to_string()))?;
        let available = product.stock;
        if available == 0 {
            return Err(CartError::OutOfStock(product_id.to_string()));
        }

        let mut items = self.items.clone();
        let index = match items.iter().position(|i| i.product_id == product_id) {
            Some(index) => {
                let item = &mut items[index];
                if item.quantity >= available {
                    return Err(CartError::InsufficientStock {
                        product_id: product_id.to_string(),
                        available,
                    });
                }
                item.quantity += 1;
                index
            }
            None => {
                items.push(CartItem {
                    product_id: product.id.clone(),
                    name: product.name.clone(),
                    price: product.price,
                    quantity: 1,
                    image_url: product.image_url.clone(),
                    max_quantity: available,
                });
                items.len() - 1
            }
        };

        self.commit(items)?;
        tracing::debug!(product_id, quantity = self.items[index].quantity, "Added to cart");
        Ok(&self.items[index])
    }

    /// Changes the quantity of line `index` by `delta`. Dropping below 1
    /// removes the line; going above the known stock is rejected.
    pub fn set_quantity(
        &mut self,
        index: usize,
        delta: i64,
        catalog: &(impl ProductLookup + ?Sized),
    ) -> CartResult<QuantityChange> {
        let item = self.items.get(index).ok_or(CartError::LineNotFound(index))?;

        let next = i64::from(item.quantity).saturating_add(delta);
        if next < 1 {
            self.remove(index)?;
            return Ok(QuantityChange::Removed);
        }

        // A product that vanished from the catalog has no stock
        let available = catalog
            .find_product(&item.product_id)
            .map(|p| p.stock)
            .unwrap_or(0);
        let next = match u32::try_from(next) {
            Ok(next) if next <= available => next,
            _ => return Err(CartError::MaxQuantity { index, available }),
        };

        let mut items = self.items.clone();
        items[index].quantity = next;
        items[index].max_quantity = available;
        self.commit(items)?;
        Ok(QuantityChange::Updated(next))
    }

    pub fn remove(&mut self, index: usize) -> CartResult<CartItem> {
        if index >= self.items.len() {
            return Err(CartError::LineNotFound(index));
        }
        let mut items = self.items.clone();
        let removed = items.remove(index);
        self.commit(items)?;
        Ok(removed)
    }

    /// Empties the cart after asking. Returns whether anything was cleared.
    pub fn clear(&mut self, confirm: &dyn ConfirmationProvider) -> CartResult<bool> {
        if self.items.is_empty() {
            return Ok(false);
        }
        if !confirm.confirm(CLEAR_CONFIRM) {
            return Ok(false);
        }
        self.commit(Vec::new())?;
        Ok(true)
    }

    /// Empties the cart without asking (after a successful checkout).
    /// Memory is emptied even when storage fails: the order is already in.
    pub(crate) fn reset(&mut self) -> CartResult<()> {
        self.items.clear();
        self.storage.set_json(KEY_CART, &self.items)?;
        Ok(())
    }

    /// Persists the new lines first; memory only changes once storage did
    fn commit(&mut self, items: Vec<CartItem>) -> CartResult<()> {
        self.storage.set_json(KEY_CART, &items)?;
        self.items = items;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::{AlwaysConfirm, NeverConfirm};
    use crate::storage::{MemoryStorage, StorageResult};
    use rust_decimal::Decimal;
    use shared::models::ProductKind;

    fn product(id: &str, price: Decimal, stock: u32) -> Product {
        Product {
            id: id.into(),
            name: format!("Produto {id}"),
            description: String::new(),
            price,
            stock,
            category: "comida".into(),
            is_active: true,
            kind: ProductKind::Normal,
            addon_categories: Vec::new(),
            image_url: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("p1", Decimal::new(1000, 2), 2),
            product("p2", Decimal::new(350, 2), 10),
            product("p3", Decimal::new(500, 2), 0),
        ]
    }

    fn cart() -> (CartManager, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (CartManager::load(storage.clone()), storage)
    }

    #[test]
    fn test_add_new_and_existing() {
        let (mut cart, _) = cart();
        let catalog = catalog();

        cart.add("p1", &catalog).unwrap();
        cart.add("p1", &catalog).unwrap();
        cart.add("p2", &catalog).unwrap();

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.items()[0].max_quantity, 2);

        let totals = cart.totals();
        assert_eq!(totals.item_count, 3);
        assert_eq!(totals.items_value, Decimal::new(2350, 2));
    }

    #[test]
    fn test_add_out_of_stock_never_succeeds() {
        let (mut cart, _) = cart();
        let err = cart.add("p3", &catalog()).unwrap_err();
        assert!(matches!(err, CartError::OutOfStock(_)));
        assert_eq!(err.to_string(), "Produto esgotado");
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_beyond_stock_keeps_quantity() {
        let (mut cart, _) = cart();
        let catalog = catalog();
        cart.add("p1", &catalog).unwrap();
        cart.add("p1", &catalog).unwrap();

        let err = cart.add("p1", &catalog).unwrap_err();
        assert!(matches!(err, CartError::InsufficientStock { available: 2, .. }));
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn test_add_unknown_product() {
        let (mut cart, _) = cart();
        assert!(matches!(
            cart.add("ghost", &catalog()).unwrap_err(),
            CartError::UnknownProduct(_)
        ));
    }

    #[test]
    fn test_set_quantity_bounds() {
        let (mut cart, _) = cart();
        let mut catalog = catalog();
        cart.add("p2", &catalog).unwrap();

        assert_eq!(
            cart.set_quantity(0, 4, &catalog).unwrap(),
            QuantityChange::Updated(5)
        );

        let err = cart.set_quantity(0, 6, &catalog).unwrap_err();
        assert!(matches!(err, CartError::MaxQuantity { available: 10, .. }));
        assert_eq!(cart.items()[0].quantity, 5);

        // stock dropped since the line was added: the snapshot follows it
        catalog[1].stock = 6;
        cart.set_quantity(0, 1, &catalog).unwrap();
        assert_eq!(cart.items()[0].max_quantity, 6);

        assert_eq!(
            cart.set_quantity(0, -6, &catalog).unwrap(),
            QuantityChange::Removed
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_bad_index() {
        let (mut cart, _) = cart();
        assert!(matches!(
            cart.set_quantity(3, 1, &catalog()).unwrap_err(),
            CartError::LineNotFound(3)
        ));
    }

    #[test]
    fn test_clear_requires_confirmation() {
        let (mut cart, _) = cart();
        cart.add("p2", &catalog()).unwrap();

        assert!(!cart.clear(&NeverConfirm).unwrap());
        assert_eq!(cart.items().len(), 1);

        assert!(cart.clear(&AlwaysConfirm).unwrap());
        assert!(cart.is_empty());

        // empty cart: no-op, no dialog
        assert!(!cart.clear(&AlwaysConfirm).unwrap());
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let (mut cart, storage) = cart();
        let catalog = catalog();
        cart.add("p2", &catalog).unwrap();
        cart.set_quantity(0, 2, &catalog).unwrap();

        let restored = CartManager::load(storage.clone());
        assert_eq!(restored.items(), cart.items());
        assert_eq!(restored.items()[0].quantity, 3);

        let raw = storage.get_item(KEY_CART).unwrap().unwrap();
        assert!(raw.contains("\"quantidade\":3"));
    }

    #[test]
    fn test_huge_delta_is_rejected_not_wrapped() {
        let (mut cart, _) = cart();
        let catalog = catalog();
        cart.add("p2", &catalog).unwrap();

        let err = cart.set_quantity(0, i64::MAX, &catalog).unwrap_err();
        assert!(matches!(err, CartError::MaxQuantity { available: 10, .. }));
        assert_eq!(cart.items()[0].quantity, 1);

        assert_eq!(
            cart.set_quantity(0, i64::MIN, &catalog).unwrap(),
            QuantityChange::Removed
        );
        assert!(cart.is_empty());
    }

    /// Storage whose writes can be switched off
    #[derive(Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        broken: std::sync::atomic::AtomicBool,
    }

    impl LocalStorage for FlakyStorage {
        fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
            self.inner.get_item(key)
        }

        fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
            if self.broken.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(std::io::Error::other("disk full").into());
            }
            self.inner.set_item(key, value)
        }

        fn remove_item(&self, key: &str) -> StorageResult<()> {
            self.inner.remove_item(key)
        }
    }

    #[test]
    fn test_failed_persist_leaves_cart_unchanged() {
        let storage = Arc::new(FlakyStorage::default());
        let mut cart = CartManager::load(storage.clone());
        let catalog = catalog();
        cart.add("p2", &catalog).unwrap();

        storage.broken.store(true, std::sync::atomic::Ordering::SeqCst);
        assert!(matches!(cart.add("p2", &catalog), Err(CartError::Storage(_))));
        assert!(matches!(cart.add("p1", &catalog), Err(CartError::Storage(_))));
        assert!(cart.set_quantity(0, 3, &catalog).is_err());
        assert!(cart.remove(0).is_err());
        assert!(cart.clear(&AlwaysConfirm).is_err());

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 1);

        storage.broken.store(false, std::sync::atomic::Ordering::SeqCst);
        let reloaded = CartManager::load(storage);
        assert_eq!(reloaded.items(), cart.items());
    }
}
