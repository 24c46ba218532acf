//! Live query feeds
//!
//! Binds a store [`Subscription`] to a shared view-model. Every snapshot
//! replaces the view's data wholesale; there is no incremental diffing.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::db::{Snapshot, StoreError, StoreResult, Subscription};

/// Running feed. Dropping it stops the feed.
#[derive(Debug)]
pub struct LiveFeed {
    name: &'static str,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl LiveFeed {
    /// Applies the first snapshot before returning, so the view is populated
    /// by the time the caller reads it. Later snapshots are applied from a
    /// background task until the feed is cancelled or the store reports an
    /// error.
    pub async fn attach<V, F>(
        name: &'static str,
        mut subscription: Subscription,
        target: Arc<RwLock<V>>,
        apply: F,
    ) -> StoreResult<Self>
    where
        V: Send + Sync + 'static,
        F: Fn(&mut V, Vec<Snapshot>) + Send + Sync + 'static,
    {
        match subscription.next().await {
            Some(Ok(snaps)) => {
                let mut view = target.write();
                apply(&mut *view, snaps);
            }
            Some(Err(e)) => return Err(e),
            None => return Err(StoreError::Unavailable(format!("{name} feed closed"))),
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    event = subscription.next() => match event {
                        Some(Ok(snaps)) => {
                            tracing::debug!(feed = name, docs = snaps.len(), "Live snapshot");
                            let mut view = target.write();
                            apply(&mut *view, snaps);
                        }
                        Some(Err(e)) => {
                            tracing::error!(feed = name, error = %e, "Live feed failed");
                            break;
                        }
                        None => break,
                    }
                }
            }
            subscription.cancel();
            tracing::debug!(feed = name, "Live feed stopped");
        });

        tracing::info!(feed = name, "Live feed attached");
        Ok(Self {
            name,
            cancel,
            handle,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DocumentStore, MemoryStore, Patch, Query};
    use std::time::Duration;

    async fn wait_for(view: &Arc<RwLock<usize>>, expected: usize) {
        for _ in 0..100 {
            if *view.read() == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("view never reached {expected}, got {}", *view.read());
    }

    #[tokio::test]
    async fn test_first_snapshot_applied_before_return() {
        let store = MemoryStore::new();
        store.add("produtos", Patch::new().set("nome", "Coxinha")).await.unwrap();

        let sub = store.subscribe(Query::collection("produtos")).await.unwrap();
        let view = Arc::new(RwLock::new(0usize));
        let feed = LiveFeed::attach("test", sub, view.clone(), |v, snaps| *v = snaps.len())
            .await
            .unwrap();
        assert_eq!(*view.read(), 1);
        assert!(feed.is_running());

        store.add("produtos", Patch::new().set("nome", "Pastel")).await.unwrap();
        wait_for(&view, 2).await;
    }

    #[tokio::test]
    async fn test_dropped_feed_stops_updating() {
        let store = MemoryStore::new();
        let sub = store.subscribe(Query::collection("produtos")).await.unwrap();
        let view = Arc::new(RwLock::new(0usize));
        let feed = LiveFeed::attach("test", sub, view.clone(), |v, snaps| *v = snaps.len())
            .await
            .unwrap();
        drop(feed);
        tokio::time::sleep(Duration::from_millis(20)).await;

        store.add("produtos", Patch::new().set("nome", "Pastel")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*view.read(), 0);
    }
}
