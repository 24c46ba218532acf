//! In-process document store
//!
//! Backs development runs and tests. Batches are validated against a staged
//! copy and only then applied, so a failing op leaves every document as it
//! was. Every committed batch notifies the live queries of the collections it
//! touched.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Number, Value};
use tokio::sync::{broadcast, mpsc};

use super::store::{
    Direction, Document, DocumentStore, FieldValue, Patch, Query, Snapshot, StoreError,
    StoreResult, WriteBatch, WriteOp,
};
use super::subscription::{QueryEvent, Subscription};

const CHANGE_CHANNEL_CAPACITY: usize = 256;
pub const DEFAULT_SUBSCRIPTION_BUFFER: usize = 16;

type Collections = HashMap<String, BTreeMap<String, Document>>;

struct Inner {
    collections: RwLock<Collections>,
    /// Name of each collection touched by a committed batch
    changes: broadcast::Sender<String>,
    offline: AtomicBool,
    last_timestamp: AtomicI64,
    subscription_buffer: usize,
}

#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let collections = self.inner.collections.read();
        f.debug_struct("MemoryStore")
            .field("collections", &collections.len())
            .field("offline", &self.inner.offline.load(AtomicOrdering::Relaxed))
            .finish()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_subscription_buffer(DEFAULT_SUBSCRIPTION_BUFFER)
    }

    pub fn with_subscription_buffer(buffer: usize) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                collections: RwLock::new(HashMap::new()),
                changes,
                offline: AtomicBool::new(false),
                last_timestamp: AtomicI64::new(0),
                subscription_buffer: buffer.max(1),
            }),
        }
    }

    /// Simulates losing the connection: every call fails with `Unavailable`
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, AtomicOrdering::SeqCst);
    }

    /// Writes a document verbatim, bypassing field transforms. Used to load
    /// data written by older clients.
    pub fn insert_raw(&self, collection: &str, id: &str, data: Document) {
        self.inner
            .collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
        let _ = self.inner.changes.send(collection.to_string());
    }

    pub fn len(&self, collection: &str) -> usize {
        self.inner
            .collections
            .read()
            .get(collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if self.inner.offline.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Unavailable("store is offline".into()));
        }
        Ok(())
    }

    /// Monotonic millisecond clock so that creation order survives
    /// same-millisecond writes
    fn server_timestamp(&self) -> i64 {
        let now = shared::util::now_millis();
        let mut last = self.inner.last_timestamp.load(AtomicOrdering::SeqCst);
        loop {
            let next = now.max(last + 1);
            match self.inner.last_timestamp.compare_exchange(
                last,
                next,
                AtomicOrdering::SeqCst,
                AtomicOrdering::SeqCst,
            ) {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }

    fn run_query(&self, query: &Query) -> Vec<Snapshot> {
        let collections = self.inner.collections.read();
        let Some(docs) = collections.get(&query.collection) else {
            return Vec::new();
        };

        let mut hits: Vec<Snapshot> = docs
            .iter()
            .filter(|(_, doc)| query.matches(doc))
            .map(|(id, doc)| Snapshot {
                id: id.clone(),
                data: doc.clone(),
            })
            .collect();

        if let Some((field, direction)) = &query.order_by {
            hits.sort_by(|a, b| {
                let ord = compare_values(a.data.get(field), b.data.get(field))
                    .then_with(|| a.id.cmp(&b.id));
                match direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            hits.truncate(limit);
        }
        hits
    }

    async fn push_result(&self, query: &Query, tx: &mpsc::Sender<QueryEvent>) -> bool {
        let event = self.ensure_online().map(|_| self.run_query(query));
        let failed = event.is_err();
        tx.send(event).await.is_ok() && !failed
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None => 0,
        Some(Value::Null) => 1,
        Some(Value::Bool(_)) => 2,
        Some(Value::Number(_)) => 3,
        Some(Value::String(_)) => 4,
        Some(Value::Array(_)) => 5,
        Some(Value::Object(_)) => 6,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn increment_value(current: Option<&Value>, by: i64) -> Value {
    match current {
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Value::from(i.saturating_add(by))
            } else {
                let f = n.as_f64().unwrap_or(0.0) + by as f64;
                Number::from_f64(f).map(Value::Number).unwrap_or(Value::from(by))
            }
        }
        _ => Value::from(by),
    }
}

fn apply_patch(doc: &mut Document, patch: &Patch, timestamp: i64) {
    for (field, value) in &patch.fields {
        match value {
            FieldValue::Set(v) => {
                doc.insert(field.clone(), v.clone());
            }
            FieldValue::Increment(by) => {
                let next = increment_value(doc.get(field), *by);
                doc.insert(field.clone(), next);
            }
            FieldValue::ServerTimestamp => {
                doc.insert(field.clone(), Value::from(timestamp));
            }
            FieldValue::Delete => {
                doc.remove(field);
            }
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Snapshot>> {
        self.ensure_online()?;
        let collections = self.inner.collections.read();
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Snapshot {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn query(&self, query: &Query) -> StoreResult<Vec<Snapshot>> {
        self.ensure_online()?;
        Ok(self.run_query(query))
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        self.ensure_online()?;
        if batch.is_empty() {
            return Ok(());
        }

        let timestamp = self.server_timestamp();
        let mut collections = self.inner.collections.write();

        // Stage: (collection, id) -> resulting document (None = deleted)
        let mut staged: BTreeMap<(String, String), Option<Document>> = BTreeMap::new();

        for op in batch.ops() {
            match op {
                WriteOp::Create {
                    collection,
                    id,
                    patch,
                } => {
                    let key = (collection.clone(), id.clone());
                    if current(&collections, &staged, &key).is_some() {
                        return Err(StoreError::AlreadyExists {
                            collection: collection.clone(),
                            id: id.clone(),
                        });
                    }
                    let mut doc = Document::new();
                    apply_patch(&mut doc, patch, timestamp);
                    staged.insert(key, Some(doc));
                }
                WriteOp::Set {
                    collection,
                    id,
                    patch,
                } => {
                    let mut doc = Document::new();
                    apply_patch(&mut doc, patch, timestamp);
                    staged.insert((collection.clone(), id.clone()), Some(doc));
                }
                WriteOp::Update {
                    collection,
                    id,
                    patch,
                    precondition,
                } => {
                    let key = (collection.clone(), id.clone());
                    let Some(mut doc) = current(&collections, &staged, &key) else {
                        return Err(StoreError::NotFound {
                            collection: collection.clone(),
                            id: id.clone(),
                        });
                    };
                    if let Some(cond) = precondition
                        && !cond.holds(&doc)
                    {
                        return Err(StoreError::FailedPrecondition(format!(
                            "{collection}/{id}"
                        )));
                    }
                    apply_patch(&mut doc, patch, timestamp);
                    staged.insert(key, Some(doc));
                }
                WriteOp::Delete { collection, id } => {
                    staged.insert((collection.clone(), id.clone()), None);
                }
            }
        }

        let mut touched = BTreeSet::new();
        for ((collection, id), doc) in staged {
            let docs = collections.entry(collection.clone()).or_default();
            match doc {
                Some(doc) => {
                    docs.insert(id, doc);
                }
                None => {
                    docs.remove(&id);
                }
            }
            touched.insert(collection);
        }
        drop(collections);

        for collection in touched {
            // No receivers is fine: nobody is listening yet
            let _ = self.inner.changes.send(collection);
        }
        Ok(())
    }

    async fn subscribe(&self, query: Query) -> StoreResult<Subscription> {
        self.ensure_online()?;

        let (subscription, tx, cancel) = Subscription::channel(self.inner.subscription_buffer);
        // Subscribe before the first read so no change slips in between
        let mut changes = self.inner.changes.subscribe();
        let store = self.clone();

        tokio::spawn(async move {
            if !store.push_result(&query, &tx).await {
                return;
            }
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    change = changes.recv() => match change {
                        Ok(collection) if collection != query.collection => continue,
                        Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                            if !store.push_result(&query, &tx).await {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            tracing::debug!(collection = %query.collection, "Live query closed");
        });

        Ok(subscription)
    }

    fn new_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

fn current(
    collections: &Collections,
    staged: &BTreeMap<(String, String), Option<Document>>,
    key: &(String, String),
) -> Option<Document> {
    match staged.get(key) {
        Some(doc) => doc.clone(),
        None => collections
            .get(&key.0)
            .and_then(|docs| docs.get(&key.1))
            .cloned(),
    }
}
