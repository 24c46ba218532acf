//! Live query subscriptions
//!
//! A [`Subscription`] receives full result sets, never deltas. Consumers
//! replace their whole view on every event. Dropping the handle cancels the
//! listener task.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::store::{Snapshot, StoreResult};

/// One delivery: the complete current result set, or the error that ended it
pub type QueryEvent = StoreResult<Vec<Snapshot>>;

#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::Receiver<QueryEvent>,
    cancel: CancellationToken,
}

impl Subscription {
    pub fn new(rx: mpsc::Receiver<QueryEvent>, cancel: CancellationToken) -> Self {
        Self { rx, cancel }
    }

    /// Creates a connected handle and sender; the sender side should stop
    /// when `cancel` fires.
    pub fn channel(buffer: usize) -> (Self, mpsc::Sender<QueryEvent>, CancellationToken) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let cancel = CancellationToken::new();
        (Self::new(rx, cancel.clone()), tx, cancel)
    }

    /// Next result set. `None` once the subscription is closed.
    pub async fn next(&mut self) -> Option<QueryEvent> {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            event = self.rx.recv() => event,
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
