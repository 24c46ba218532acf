//! Document store abstraction
//!
//! Collections of schemaless JSON documents keyed by string id, with
//! equality queries, atomic write batches and live query subscriptions.
//! Field transforms (`Increment`, `ServerTimestamp`) are resolved by the
//! store when a write is applied.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use super::subscription::Subscription;

/// Raw document body
pub type Document = Map<String, Value>;

/// A document as read from the store
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub id: String,
    pub data: Document,
}

impl Snapshot {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Document already exists: {collection}/{id}")]
    AlreadyExists { collection: String, id: String },

    #[error("Precondition failed: {0}")]
    FailedPrecondition(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Store error: {0}")]
    Internal(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for shared::error::AppError {
    fn from(err: StoreError) -> Self {
        use shared::error::{AppError, ErrorCode};
        match err {
            StoreError::NotFound { collection, id } => {
                AppError::not_found(format!("{collection}/{id}"))
            }
            StoreError::AlreadyExists { collection, id } => {
                AppError::conflict(format!("{collection}/{id} already exists"))
            }
            StoreError::FailedPrecondition(msg) => AppError::conflict(msg),
            StoreError::Unavailable(msg) => AppError::with_message(ErrorCode::NetworkError, msg),
            StoreError::PermissionDenied(msg) => {
                AppError::with_message(ErrorCode::NotAuthenticated, msg)
            }
            StoreError::Internal(msg) => AppError::database(msg),
        }
    }
}

// ========== Writes ==========

/// Value written to a single field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Set(Value),
    /// Atomic numeric add. A missing or non-numeric field is treated as 0.
    Increment(i64),
    /// Replaced by the store's clock (Unix millis)
    ServerTimestamp,
    Delete,
}

/// Ordered list of field writes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    pub fields: Vec<(String, FieldValue)>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((field.into(), FieldValue::Set(value.into())));
        self
    }

    pub fn increment(mut self, field: impl Into<String>, by: i64) -> Self {
        self.fields.push((field.into(), FieldValue::Increment(by)));
        self
    }

    pub fn server_timestamp(mut self, field: impl Into<String>) -> Self {
        self.fields.push((field.into(), FieldValue::ServerTimestamp));
        self
    }

    pub fn delete(mut self, field: impl Into<String>) -> Self {
        self.fields.push((field.into(), FieldValue::Delete));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Condition checked against the current document before an update
#[derive(Debug, Clone, PartialEq)]
pub enum Precondition {
    FieldEquals(String, Value),
    /// Passes when the field is missing or holds none of the values
    FieldNotIn(String, Vec<Value>),
}

impl Precondition {
    pub fn holds(&self, doc: &Document) -> bool {
        match self {
            Self::FieldEquals(field, expected) => doc.get(field) == Some(expected),
            Self::FieldNotIn(field, values) => match doc.get(field) {
                Some(current) => !values.contains(current),
                None => true,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Fails with `AlreadyExists` when the id is taken
    Create {
        collection: String,
        id: String,
        patch: Patch,
    },
    /// Creates or fully replaces
    Set {
        collection: String,
        id: String,
        patch: Patch,
    },
    /// Merges into an existing document; fails with `NotFound` otherwise
    Update {
        collection: String,
        id: String,
        patch: Patch,
        precondition: Option<Precondition>,
    },
    Delete { collection: String, id: String },
}

/// All-or-nothing group of writes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, collection: &str, id: &str, patch: Patch) -> &mut Self {
        self.ops.push(WriteOp::Create {
            collection: collection.to_string(),
            id: id.to_string(),
            patch,
        });
        self
    }

    pub fn set(&mut self, collection: &str, id: &str, patch: Patch) -> &mut Self {
        self.ops.push(WriteOp::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            patch,
        });
        self
    }

    pub fn update(&mut self, collection: &str, id: &str, patch: Patch) -> &mut Self {
        self.ops.push(WriteOp::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            patch,
            precondition: None,
        });
        self
    }

    pub fn update_if(
        &mut self,
        collection: &str,
        id: &str,
        patch: Patch,
        precondition: Precondition,
    ) -> &mut Self {
        self.ops.push(WriteOp::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            patch,
            precondition: Some(precondition),
        });
        self
    }

    pub fn delete(&mut self, collection: &str, id: &str) -> &mut Self {
        self.ops.push(WriteOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

// ========== Queries ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    /// Equality filters, all must match
    pub filters: Vec<(String, Value)>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn collection(name: &str) -> Self {
        Self {
            collection: name.to_string(),
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.filters
            .iter()
            .all(|(field, value)| doc.get(field) == Some(value))
    }
}

// ========== Store trait ==========

/// Hosted document database
///
/// Single-document writes are expressed as one-op batches so that every
/// implementation only has to get `commit` right.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Snapshot>>;

    async fn query(&self, query: &Query) -> StoreResult<Vec<Snapshot>>;

    /// Applies every op or none
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;

    /// Live query: the first event is the current result set, then a full
    /// result set after every change to the collection
    async fn subscribe(&self, query: Query) -> StoreResult<Subscription>;

    /// Store-assigned id
    fn new_id(&self) -> String;

    async fn add(&self, collection: &str, patch: Patch) -> StoreResult<String> {
        let id = self.new_id();
        let mut batch = WriteBatch::new();
        batch.create(collection, &id, patch);
        self.commit(batch).await?;
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, patch: Patch) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.set(collection, id, patch);
        self.commit(batch).await
    }

    async fn update(&self, collection: &str, id: &str, patch: Patch) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.update(collection, id, patch);
        self.commit(batch).await
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.delete(collection, id);
        self.commit(batch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_precondition_field_not_in() {
        let cond = Precondition::FieldNotIn(
            "status".into(),
            vec![json!("finalizada"), json!("cancelada")],
        );
        let mut doc = Document::new();
        assert!(cond.holds(&doc));
        doc.insert("status".into(), json!("pendente"));
        assert!(cond.holds(&doc));
        doc.insert("status".into(), json!("cancelada"));
        assert!(!cond.holds(&doc));
    }

    #[test]
    fn test_query_matches_all_filters() {
        let q = Query::collection("pedidos")
            .where_eq("data", "2024-06-01")
            .where_eq("status", "pendente");
        let mut doc = Document::new();
        doc.insert("data".into(), json!("2024-06-01"));
        assert!(!q.matches(&doc));
        doc.insert("status".into(), json!("pendente"));
        assert!(q.matches(&doc));
    }
}
