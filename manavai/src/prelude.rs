//! Common imports for most manavai applications.

pub use crate::{
    AppConfig, ManavaiError, ProviderStack, RuntimeBundle, build_providers, build_runtime,
    build_runtime_with, build_runtime_with_providers, init_tracing,
};
pub use crate::{
    Account, AccountService, Attachment, AuthProvider, ChatMode, ChatService, ChatSession,
    CreditLedger, DocumentStore, Fragment, InMemoryAuthProvider, InMemoryDocumentStore, Message,
    Plan, ProviderError, ProviderId, RejectReason, ResponseStreamer, Role, SendOutcome,
    SendRequest, SessionId, StoreBackendConfig, User, UserId,
};
