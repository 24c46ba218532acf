//! Repository Module
//!
//! Maps typed domain models onto store documents. Field names in the store
//! are the ones the web client has always written (`nome`, `preco`, ...).

pub mod order;
pub mod product;

pub use order::OrderRepository;
pub use product::ProductRepository;

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde_json::Value;
use thiserror::Error;

use crate::db::store::{DocumentStore, StoreError};
use crate::utils::format::round_money;

/// Repository error types
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<StoreError> for RepoError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => {
                RepoError::NotFound(format!("{collection}/{id}"))
            }
            StoreError::AlreadyExists { collection, id } => {
                RepoError::Duplicate(format!("{collection}/{id}"))
            }
            StoreError::FailedPrecondition(msg) => RepoError::Conflict(msg),
            other => RepoError::Database(other.to_string()),
        }
    }
}

impl From<RepoError> for shared::error::AppError {
    fn from(err: RepoError) -> Self {
        use shared::error::AppError;
        match err {
            RepoError::NotFound(what) => AppError::not_found(what),
            RepoError::Duplicate(what) => AppError::conflict(format!("{what} already exists")),
            RepoError::Conflict(what) => AppError::conflict(what),
            RepoError::Database(msg) => AppError::database(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Shared store handle
#[derive(Clone)]
pub struct BaseRepository {
    store: Arc<dyn DocumentStore>,
}

impl BaseRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }
}

// =============================================================================
// Lenient field readers
// =============================================================================
// Older clients wrote numbers as strings and prices as floats; reads accept
// both and never fail a whole document over one field.

/// Money value: number or numeric string (`"12,50"` too), rounded to cents
pub(crate) fn read_money(value: Option<&Value>) -> Option<Decimal> {
    let parsed = match value? {
        Value::Number(n) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Value::String(s) => Decimal::from_str(&s.trim().replace(',', ".")).ok(),
        _ => None,
    };
    parsed.map(round_money)
}

/// Integer count: number (fractions truncated) or numeric string
pub(crate) fn read_count(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.trunc() as i64))
        }
        _ => None,
    }
}

pub(crate) fn read_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn read_millis(value: Option<&Value>) -> Option<i64> {
    value?.as_i64()
}

/// Stored documents keep money as JSON numbers (`25.0`, never `"25.00"`)
pub(crate) fn money_value(value: Decimal) -> Value {
    round_money(value)
        .to_f64()
        .map(Value::from)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_money() {
        assert_eq!(read_money(Some(&json!(12.5))), Some(Decimal::new(1250, 2)));
        assert_eq!(read_money(Some(&json!(7))), Some(Decimal::new(7, 0)));
        assert_eq!(read_money(Some(&json!("12,50"))), Some(Decimal::new(1250, 2)));
        assert_eq!(read_money(Some(&json!(true))), None);
        assert_eq!(read_money(None), None);
    }

    #[test]
    fn test_read_count() {
        assert_eq!(read_count(Some(&json!(5))), Some(5));
        assert_eq!(read_count(Some(&json!("8"))), Some(8));
        assert_eq!(read_count(Some(&json!(3.9))), Some(3));
        assert_eq!(read_count(Some(&json!("abc"))), None);
    }

    #[test]
    fn test_money_value_is_a_json_number() {
        let v = money_value(Decimal::new(2500, 2));
        assert_eq!(v.as_f64(), Some(25.0));
    }
}
