// # Memory Field State Store
//
// In-memory holder of the current FieldState.
//
// ## Purpose
//
// The store is the only mutator of the shared record. Every write merges a
// FieldPatch over the previous snapshot and publishes the result as a whole,
// so observers never see a half-applied update.
//
// ## Lifetime
//
// - State lives for one session and is never persisted
// - `reset()` returns the record to its initial empty value

use std::pin::Pin;

use tokio::sync::watch;
use tokio_stream::Stream;
use tokio_stream::wrappers::WatchStream;

use crate::state::field::{FieldPatch, FieldState};

/// In-memory field state store
///
/// Backed by a `tokio::sync::watch` channel: readers get cheap snapshots and
/// can await changes without polling.
///
/// # Example
///
/// ```rust
/// use plz_core::state::{FieldPatch, FieldStateStore};
///
/// let store = FieldStateStore::new();
/// store.apply(FieldPatch::new().locality("Berlin"));
///
/// assert_eq!(store.snapshot().locality, "Berlin");
/// ```
#[derive(Debug)]
pub struct FieldStateStore {
    inner: watch::Sender<FieldState>,
}

impl FieldStateStore {
    /// Create a store holding the initial empty state
    pub fn new() -> Self {
        let (inner, _) = watch::channel(FieldState::default());
        Self { inner }
    }

    /// Get a copy of the current state
    pub fn snapshot(&self) -> FieldState {
        self.inner.borrow().clone()
    }

    /// Merge a partial update over the current state
    ///
    /// Subscribers are only notified when the merged record differs from the
    /// previous one.
    ///
    /// # Returns
    ///
    /// The state after the merge
    pub fn apply(&self, patch: FieldPatch) -> FieldState {
        let mut next = None;
        self.inner.send_if_modified(|current| {
            let merged = patch.apply_to(current);
            let changed = merged != *current;
            if changed {
                *current = merged.clone();
            }
            next = Some(merged);
            changed
        });
        next.unwrap_or_default()
    }

    /// Restore the initial empty state
    pub fn reset(&self) -> FieldState {
        self.apply(FieldPatch::reset())
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<FieldState> {
        self.inner.subscribe()
    }

    /// Watch state changes as a stream of snapshots
    ///
    /// The stream yields the current state first, then every subsequent change.
    pub fn watch(&self) -> Pin<Box<dyn Stream<Item = FieldState> + Send + 'static>> {
        Box::pin(WatchStream::new(self.subscribe()))
    }
}

impl Default for FieldStateStore {
    fn default() -> Self {
        Self::new()
    }
}
