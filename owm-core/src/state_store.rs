//! Generic shared state with change notification.
//!
//! `StateStore<T>` wraps `Arc<RwLock<T>>` and provides a watch-based
//! notification mechanism so that consumers (typically the presentation
//! layer) can react to state changes without polling. The wallet session
//! state and the recent-alerts view both live in one.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, RwLockReadGuard, watch};

/// A shared, versioned state cell with change notification.
///
/// Wraps a value of type `T` behind `Arc<RwLock<T>>` and maintains an
/// incrementing version counter. Subscribers receive a [`StateWatcher`]
/// that can `await` the next change.
pub struct StateStore<T> {
    inner: Arc<StateStoreInner<T>>,
}

struct StateStoreInner<T> {
    data: RwLock<T>,
    version: AtomicU64,
    version_tx: watch::Sender<u64>,
}

/// Receives notifications when a [`StateStore`] is updated.
///
/// Call [`changed()`](StateWatcher::changed) to wait for the next update.
pub struct StateWatcher {
    version_rx: watch::Receiver<u64>,
}

// -- StateStore ---------------------------------------------------------

impl<T> StateStore<T> {
    /// Create a new `StateStore` with the given initial value.
    pub fn new(initial: T) -> Self {
        let (version_tx, _) = watch::channel(0u64);
        Self {
            inner: Arc::new(StateStoreInner {
                data: RwLock::new(initial),
                version: AtomicU64::new(0),
                version_tx,
            }),
        }
    }

    /// Replace the stored value and notify all watchers.
    pub async fn update(&self, value: T) {
        self.mutate(|current| *current = value).await;
    }

    /// Mutate the stored value under the write lock and notify all watchers.
    ///
    /// The closure runs while the lock is held, which makes check-and-set
    /// transitions atomic with respect to other mutators. Returns whatever
    /// the closure returns.
    pub async fn mutate<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.data.write().await;
        let result = f(&mut guard);
        let new_version = self.inner.version.fetch_add(1, Ordering::Relaxed) + 1;
        // Release the write guard before notifying so subscribers can
        // immediately acquire a read lock.
        drop(guard);
        let _ = self.inner.version_tx.send(new_version);
        result
    }

    /// Read the current value.
    pub async fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.data.read().await
    }

    /// Clone of the current value.
    pub async fn snapshot(&self) -> T
    where
        T: Clone,
    {
        self.inner.data.read().await.clone()
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> StateWatcher {
        StateWatcher {
            version_rx: self.inner.version_tx.subscribe(),
        }
    }
}

impl<T> Clone for StateStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

// -- StateWatcher -------------------------------------------------------

impl StateWatcher {
    /// Wait until the store is updated.
    ///
    /// Returns `Ok(())` when a new version is available, or `Err` if the
    /// [`StateStore`] has been dropped.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.version_rx.changed().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mutate_notifies_watchers() {
        let store = StateStore::new(0u32);
        let mut watcher = store.subscribe();

        store.mutate(|v| *v += 1).await;
        watcher.changed().await.unwrap();
        assert_eq!(store.snapshot().await, 1);
    }

    #[tokio::test]
    async fn mutate_returns_closure_result() {
        let store = StateStore::new(5u32);
        let claimed = store
            .mutate(|v| {
                if *v == 5 {
                    *v = 6;
                    true
                } else {
                    false
                }
            })
            .await;
        assert!(claimed);
        assert_eq!(store.snapshot().await, 6);
    }
}
