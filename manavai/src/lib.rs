//! Unified facade over the manavai workspace crates.
//!
//! Most applications depend on this crate alone: it re-exports the store,
//! account, provider, and chat crates, reads configuration from the
//! environment, and assembles a ready-to-use [`RuntimeBundle`].
//!
//! ```rust
//! use manavai::prelude::*;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let config = AppConfig::default().with_store(StoreBackendConfig::InMemory);
//! let runtime = build_runtime(config).unwrap();
//!
//! let account = runtime
//!     .accounts
//!     .sign_up("Asha", "asha@example.com", "secret1")
//!     .await
//!     .unwrap();
//! assert_eq!(account.credits(), 50);
//! # });
//! ```

mod config;
mod error;
mod logging;
mod providers;

pub mod prelude;
pub mod runtime;

pub use maccount;
pub use mchat;
pub use mcommon;
pub use mobserve;
pub use mprovider;
pub use mstore;

pub use config::{
    ADMIN_EMAIL_VAR, AppConfig, CONNECT_TIMEOUT_VAR, GEMINI_API_KEY_VAR, IN_MEMORY_STORE, LOG_VAR,
    OPENAI_API_KEY_VAR, PREMIUM_COST_VAR, STORE_PATH_VAR, SUPPORT_EMAIL_VAR, UPI_ID_VAR,
};
pub use error::{ManavaiError, ManavaiErrorKind};
pub use logging::init_tracing;
pub use providers::{ProviderStack, build_providers};
pub use runtime::{
    RuntimeBundle, build_runtime, build_runtime_with, build_runtime_with_providers,
    tracing_chat_hooks, tracing_fallback_hooks,
};

pub use maccount::{
    Account, AccountError, AccountErrorKind, AccountService, AdminConsole, AuthIdentity,
    AuthProvider, Coupon, CreditLedger, InMemoryAuthProvider, Inbox, InboxMessage, Plan,
    Redemption, SystemMessage, User,
};
pub use mchat::{
    ChatError, ChatErrorKind, ChatRuntimeHooks, ChatService, ChatServiceBuilder, ChatSession,
    RejectReason, SendOutcome, SendRequest, SessionRepository, TurnObserver, TurnSummary,
};
pub use mcommon::{BoxFuture, MessageId, SessionId, UserId};
pub use mobserve::{
    MetricsObservabilityHooks, SafeChatHooks, SafeFallbackHooks, TracingObservabilityHooks,
};
pub use mprovider::{
    Attachment, AttachmentKind, ChatMode, FallbackHooks, Fragment, GenerationRequest, Message,
    ProviderError, ProviderErrorKind, ProviderId, ResponseStreamer, Role, SecretString,
    SpeechSynthesizer, UnconfiguredStreamer,
};
pub use mstore::{
    DocumentPath, DocumentStore, DocumentStoreExt, InMemoryDocumentStore, SqliteDocumentStore,
    StoreBackendConfig, StoreError, StoreErrorKind,
};
