use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use mcommon::BoxFuture;
use rusqlite::{Connection, Transaction, params};
use serde_json::Value;

use crate::backend::{DocumentStore, Guard, WriteBatch};
use crate::error::StoreError;
use crate::path::DocumentPath;
use crate::tree;
use crate::watch::{Subscription, WatchRegistry};

/// Document tree persisted as one row per leaf, keyed by its full path.
#[derive(Debug)]
pub struct SqliteDocumentStore {
    connection: Mutex<Connection>,
    watchers: WatchRegistry,
}

impl SqliteDocumentStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|error| {
                StoreError::storage(format!("failed to create sqlite parent directory: {error}"))
            })?;
        }

        let connection = Connection::open(path).map_err(|error| {
            StoreError::storage(format!("failed to open sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    pub fn new_in_memory() -> Result<Self, StoreError> {
        let connection = Connection::open_in_memory().map_err(|error| {
            StoreError::storage(format!("failed to open in-memory sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self, StoreError> {
        connection
            .busy_timeout(Duration::from_secs(5))
            .map_err(|error| {
                StoreError::storage(format!("failed to configure sqlite busy timeout: {error}"))
            })?;
        let store = Self {
            connection: Mutex::new(connection),
            watchers: WatchRegistry::default(),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.connection
            .lock()
            .map_err(|_| StoreError::storage("sqlite store lock poisoned"))
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        let conn = self.connection()?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            CREATE TABLE IF NOT EXISTS nodes (
                path TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .map_err(|error| {
            StoreError::storage(format!("failed to initialize sqlite schema: {error}"))
        })?;

        Ok(())
    }

    fn read(conn: &Connection, path: &DocumentPath) -> Result<Option<Value>, StoreError> {
        let base = path.as_str();
        let mut statement = conn
            .prepare_cached(
                "
                SELECT path, value FROM nodes
                WHERE path = ?1 OR substr(path, 1, length(?1) + 1) = ?1 || '/'
                ORDER BY path
                ",
            )
            .map_err(|error| StoreError::storage(format!("failed to prepare read: {error}")))?;

        let rows = statement
            .query_map(params![base], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|error| StoreError::storage(format!("failed to read '{base}': {error}")))?;

        let mut leaves = Vec::new();
        for row in rows {
            let (row_path, raw) = row
                .map_err(|error| StoreError::storage(format!("failed to read row: {error}")))?;
            leaves.push((row_path, serde_json::from_str::<Value>(&raw)?));
        }

        if leaves.is_empty() {
            return Ok(None);
        }

        Ok(tree::unflatten(path, leaves))
    }

    fn write(tx: &Transaction<'_>, path: &DocumentPath, value: Value) -> Result<(), StoreError> {
        let base = path.as_str();

        tx.execute(
            "DELETE FROM nodes WHERE path = ?1 OR substr(path, 1, length(?1) + 1) = ?1 || '/'",
            params![base],
        )
        .map_err(|error| StoreError::storage(format!("failed to clear '{base}': {error}")))?;

        let Some(value) = tree::normalize(value) else {
            return Ok(());
        };

        // A leaf stored at an ancestor would shadow the new subtree.
        let mut ancestor = path.parent();
        while let Some(current) = ancestor {
            tx.execute("DELETE FROM nodes WHERE path = ?1", params![current.as_str()])
                .map_err(|error| {
                    StoreError::storage(format!("failed to clear ancestor leaf: {error}"))
                })?;
            ancestor = current.parent();
        }

        let mut rows = Vec::new();
        tree::flatten(path, &value, &mut rows);
        for (row_path, leaf) in rows {
            tx.execute(
                "INSERT INTO nodes (path, value) VALUES (?1, ?2)",
                params![row_path, serde_json::to_string(&leaf)?],
            )
            .map_err(|error| {
                StoreError::storage(format!("failed to write '{row_path}': {error}"))
            })?;
        }

        Ok(())
    }

    fn commit(
        &self,
        conn: &mut Connection,
        guards: &[Guard],
        batch: WriteBatch,
    ) -> Result<bool, StoreError> {
        let tx = conn.transaction().map_err(|error| {
            StoreError::storage(format!("failed to begin sqlite transaction: {error}"))
        })?;

        for guard in guards {
            let current = Self::read(&tx, guard.path())?;
            if !guard.holds(current.as_ref()) {
                return Ok(false);
            }
        }

        let changed = batch.paths();
        for (path, value) in batch.into_writes() {
            Self::write(&tx, &path, value)?;
        }

        tx.commit().map_err(|error| {
            StoreError::storage(format!("failed to commit sqlite transaction: {error}"))
        })?;

        let conn: &Connection = conn;
        self.watchers
            .notify(&changed, |path| Self::read(conn, path))?;
        Ok(true)
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn get<'a>(
        &'a self,
        path: &'a DocumentPath,
    ) -> BoxFuture<'a, Result<Option<Value>, StoreError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            Self::read(&conn, path)
        })
    }

    fn update<'a>(&'a self, batch: WriteBatch) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let mut conn = self.connection()?;
            self.commit(&mut conn, &[], batch)?;
            Ok(())
        })
    }

    fn update_if<'a>(
        &'a self,
        guards: Vec<Guard>,
        batch: WriteBatch,
    ) -> BoxFuture<'a, Result<bool, StoreError>> {
        Box::pin(async move {
            let mut conn = self.connection()?;
            self.commit(&mut conn, &guards, batch)
        })
    }

    fn subscribe(&self, path: &DocumentPath) -> Result<Subscription, StoreError> {
        let conn = self.connection()?;
        let initial = Self::read(&conn, path)?;
        self.watchers.register(path.clone(), initial)
    }
}

pub(crate) fn default_sqlite_path() -> PathBuf {
    if let Some(explicit) = std::env::var_os("MANAVAI_STORE_PATH") {
        return PathBuf::from(explicit);
    }

    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        return PathBuf::from(home).join(".manavai").join("store.sqlite3");
    }

    PathBuf::from("manavai-store.sqlite3")
}
