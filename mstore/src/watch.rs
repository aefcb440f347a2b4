//! Change subscriptions shared by the store backends.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::{DocumentPath, StoreError};

type Snapshot = Option<Value>;

#[derive(Debug, Default, Clone)]
pub(crate) struct WatchRegistry {
    inner: Arc<Mutex<WatchInner>>,
}

#[derive(Debug, Default)]
struct WatchInner {
    next_id: u64,
    watchers: HashMap<u64, Watcher>,
}

#[derive(Debug)]
struct Watcher {
    path: DocumentPath,
    sender: mpsc::UnboundedSender<Snapshot>,
}

impl WatchRegistry {
    /// Registers a watcher and delivers `initial` as its first snapshot.
    pub(crate) fn register(
        &self,
        path: DocumentPath,
        initial: Snapshot,
    ) -> Result<Subscription, StoreError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::storage("watch registry lock poisoned"))?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let _ = sender.send(initial);

        let id = inner.next_id;
        inner.next_id += 1;
        inner.watchers.insert(
            id,
            Watcher {
                path: path.clone(),
                sender,
            },
        );

        Ok(Subscription {
            id,
            path,
            receiver,
            registry: self.clone(),
        })
    }

    /// Sends a fresh snapshot to every watcher whose path overlaps a changed path.
    ///
    /// Must be called while the caller still holds its write lock so that
    /// watchers observe writes in commit order.
    pub(crate) fn notify<F>(&self, changed: &[DocumentPath], mut read: F) -> Result<(), StoreError>
    where
        F: FnMut(&DocumentPath) -> Result<Snapshot, StoreError>,
    {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::storage("watch registry lock poisoned"))?;

        let mut closed = Vec::new();
        for (id, watcher) in &inner.watchers {
            if !changed.iter().any(|path| path.overlaps(&watcher.path)) {
                continue;
            }

            let snapshot = read(&watcher.path)?;
            if watcher.sender.send(snapshot).is_err() {
                closed.push(*id);
            }
        }

        for id in closed {
            inner.watchers.remove(&id);
        }

        Ok(())
    }

    pub(crate) fn watcher_count(&self) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.watchers.len())
            .unwrap_or_default()
    }

    fn remove(&self, id: u64) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.watchers.remove(&id);
        }
    }
}

/// A live view of one document path.
///
/// The first snapshot is the value at subscribe time; every later snapshot
/// follows a write touching the path, an ancestor, or a descendant. Dropping
/// the subscription unregisters it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    path: DocumentPath,
    receiver: mpsc::UnboundedReceiver<Snapshot>,
    registry: WatchRegistry,
}

impl Subscription {
    pub fn path(&self) -> &DocumentPath {
        &self.path
    }

    /// Waits for the next snapshot. `None` means the store has gone away.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.receiver.recv().await
    }

    /// Returns a queued snapshot without waiting.
    pub fn try_next(&mut self) -> Option<Snapshot> {
        self.receiver.try_recv().ok()
    }

    pub fn unsubscribe(self) {}

    pub fn typed<T: DeserializeOwned>(self) -> TypedSubscription<T> {
        TypedSubscription {
            inner: self,
            _marker: PhantomData,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}

/// A subscription that decodes each snapshot into `T`.
#[derive(Debug)]
pub struct TypedSubscription<T> {
    inner: Subscription,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> TypedSubscription<T> {
    pub async fn next(&mut self) -> Option<Result<Option<T>, StoreError>> {
        let snapshot = self.inner.next().await?;
        Some(decode(snapshot))
    }

    pub fn path(&self) -> &DocumentPath {
        self.inner.path()
    }

    pub fn unsubscribe(self) {}
}

pub(crate) fn decode<T: DeserializeOwned>(snapshot: Snapshot) -> Result<Option<T>, StoreError> {
    snapshot
        .map(serde_json::from_value)
        .transpose()
        .map_err(StoreError::from)
}
