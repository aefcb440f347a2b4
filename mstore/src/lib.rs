//! Document-tree store with atomic multi-path writes and change subscriptions.
//!
//! ```rust
//! use mstore::{DocumentPath, DocumentStore, Guard, InMemoryDocumentStore, WriteBatch};
//! use serde_json::json;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let store = InMemoryDocumentStore::new();
//! let credits = DocumentPath::parse("users/uid-1/credits").unwrap();
//!
//! store.set(&credits, json!(50)).await.unwrap();
//!
//! let applied = store
//!     .update_if(
//!         vec![Guard::equals(credits.clone(), 50)],
//!         WriteBatch::new().set(credits.clone(), json!(47)),
//!     )
//!     .await
//!     .unwrap();
//!
//! assert!(applied);
//! assert_eq!(store.get(&credits).await.unwrap(), Some(json!(47)));
//! # });
//! ```

mod backend;
mod backends;
mod error;
mod path;
mod tree;
mod watch;

pub mod prelude {
    pub use crate::{
        DocumentPath, DocumentStore, DocumentStoreExt, Guard, InMemoryDocumentStore,
        SqliteDocumentStore, StoreBackendConfig, StoreError, StoreErrorKind, Subscription,
        TypedSubscription, WriteBatch, create_default_document_store, create_document_store,
    };
}

pub use backend::{
    DocumentStore, DocumentStoreExt, Guard, InMemoryDocumentStore, SqliteDocumentStore,
    StoreBackendConfig, WriteBatch, create_default_document_store, create_document_store,
};
pub use error::{StoreError, StoreErrorKind};
pub use path::DocumentPath;
pub use watch::{Subscription, TypedSubscription};
