//! Document store trait, write batches, and the in-memory backend.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use mcommon::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::backends::sqlite::default_sqlite_path;
use crate::error::StoreError;
use crate::path::DocumentPath;
use crate::tree;
use crate::watch::{Subscription, TypedSubscription, WatchRegistry, decode};

pub use crate::backends::sqlite::SqliteDocumentStore;

/// A set of path writes applied together. Later writes to the same path win.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    writes: Vec<(DocumentPath, Value)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, path: DocumentPath, value: Value) -> Self {
        self.writes.push((path, value));
        self
    }

    pub fn remove(self, path: DocumentPath) -> Self {
        self.set(path, Value::Null)
    }

    pub fn push(&mut self, path: DocumentPath, value: Value) {
        self.writes.push((path, value));
    }

    pub fn writes(&self) -> &[(DocumentPath, Value)] {
        &self.writes
    }

    pub fn paths(&self) -> Vec<DocumentPath> {
        self.writes.iter().map(|(path, _)| path.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn into_writes(self) -> Vec<(DocumentPath, Value)> {
        self.writes
    }
}

/// Precondition checked atomically before a conditional write.
#[derive(Debug, Clone, PartialEq)]
pub enum Guard {
    /// The value at the path must equal the given value. `Null` means absent.
    Equals(DocumentPath, Value),
    /// Nothing may be stored at the path.
    Absent(DocumentPath),
}

impl Guard {
    pub fn equals(path: DocumentPath, value: impl Into<Value>) -> Self {
        Self::Equals(path, value.into())
    }

    pub fn absent(path: DocumentPath) -> Self {
        Self::Absent(path)
    }

    pub fn path(&self) -> &DocumentPath {
        match self {
            Self::Equals(path, _) | Self::Absent(path) => path,
        }
    }

    pub(crate) fn holds(&self, current: Option<&Value>) -> bool {
        match self {
            Self::Absent(_) => current.is_none(),
            Self::Equals(_, Value::Null) => current.is_none_or(Value::is_null),
            Self::Equals(_, expected) => current == Some(expected),
        }
    }
}

pub trait DocumentStore: Send + Sync {
    fn get<'a>(&'a self, path: &'a DocumentPath)
    -> BoxFuture<'a, Result<Option<Value>, StoreError>>;

    /// Applies every write in the batch atomically.
    fn update<'a>(&'a self, batch: WriteBatch) -> BoxFuture<'a, Result<(), StoreError>>;

    /// Applies the batch only when every guard holds. Returns whether it was applied.
    fn update_if<'a>(
        &'a self,
        guards: Vec<Guard>,
        batch: WriteBatch,
    ) -> BoxFuture<'a, Result<bool, StoreError>>;

    fn subscribe(&self, path: &DocumentPath) -> Result<Subscription, StoreError>;

    fn set<'a>(
        &'a self,
        path: &'a DocumentPath,
        value: Value,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        self.update(WriteBatch::new().set(path.clone(), value))
    }

    fn remove<'a>(&'a self, path: &'a DocumentPath) -> BoxFuture<'a, Result<(), StoreError>> {
        self.update(WriteBatch::new().remove(path.clone()))
    }

    /// Returns a fresh time-ordered child path under `parent`.
    fn push_key(&self, parent: &DocumentPath) -> Result<DocumentPath, StoreError> {
        parent.child(mcommon::push_id())
    }
}

/// Typed helpers layered over [`DocumentStore`].
pub trait DocumentStoreExt: DocumentStore {
    fn get_as<'a, T>(
        &'a self,
        path: &'a DocumentPath,
    ) -> BoxFuture<'a, Result<Option<T>, StoreError>>
    where
        T: DeserializeOwned + Send + 'a,
    {
        Box::pin(async move { decode(self.get(path).await?) })
    }

    fn set_as<'a, T>(
        &'a self,
        path: &'a DocumentPath,
        value: &'a T,
    ) -> BoxFuture<'a, Result<(), StoreError>>
    where
        T: Serialize + Sync,
    {
        Box::pin(async move {
            let value = serde_json::to_value(value)?;
            self.set(path, value).await
        })
    }

    fn subscribe_as<T: DeserializeOwned>(
        &self,
        path: &DocumentPath,
    ) -> Result<TypedSubscription<T>, StoreError> {
        Ok(self.subscribe(path)?.typed())
    }
}

impl<S: DocumentStore + ?Sized> DocumentStoreExt for S {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackendConfig {
    Sqlite { path: PathBuf },
    InMemory,
}

impl Default for StoreBackendConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

pub fn create_document_store(
    config: StoreBackendConfig,
) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match config {
        StoreBackendConfig::Sqlite { path } => Ok(Arc::new(SqliteDocumentStore::new(path)?)),
        StoreBackendConfig::InMemory => Ok(Arc::new(InMemoryDocumentStore::new())),
    }
}

pub fn create_default_document_store() -> Result<Arc<dyn DocumentStore>, StoreError> {
    create_document_store(StoreBackendConfig::default())
}

/// JSON tree kept in process memory.
#[derive(Debug)]
pub struct InMemoryDocumentStore {
    root: Mutex<Value>,
    watchers: WatchRegistry,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self {
            root: Mutex::new(Value::Object(Default::default())),
            watchers: WatchRegistry::default(),
        }
    }
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.watchers.watcher_count()
    }

    fn root(&self) -> Result<std::sync::MutexGuard<'_, Value>, StoreError> {
        self.root
            .lock()
            .map_err(|_| StoreError::storage("in-memory store lock poisoned"))
    }

    fn apply(&self, root: &mut Value, batch: WriteBatch) -> Result<(), StoreError> {
        let changed = batch.paths();
        for (path, value) in batch.into_writes() {
            tree::set_at(root, &path, value);
        }

        let snapshot = &*root;
        self.watchers
            .notify(&changed, |path| Ok(tree::get_at(snapshot, path)))
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn get<'a>(
        &'a self,
        path: &'a DocumentPath,
    ) -> BoxFuture<'a, Result<Option<Value>, StoreError>> {
        Box::pin(async move {
            let root = self.root()?;
            Ok(tree::get_at(&root, path))
        })
    }

    fn update<'a>(&'a self, batch: WriteBatch) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let mut root = self.root()?;
            self.apply(&mut root, batch)
        })
    }

    fn update_if<'a>(
        &'a self,
        guards: Vec<Guard>,
        batch: WriteBatch,
    ) -> BoxFuture<'a, Result<bool, StoreError>> {
        Box::pin(async move {
            let mut root = self.root()?;
            let satisfied = guards
                .iter()
                .all(|guard| guard.holds(tree::get_at(&root, guard.path()).as_ref()));
            if !satisfied {
                return Ok(false);
            }

            self.apply(&mut root, batch)?;
            Ok(true)
        })
    }

    fn subscribe(&self, path: &DocumentPath) -> Result<Subscription, StoreError> {
        let root = self.root()?;
        self.watchers
            .register(path.clone(), tree::get_at(&root, path))
    }
}
