//! Chat turn orchestration and session persistence.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use maccount::{Account, User};
//! use mchat::{ChatService, ChatSession, SendOutcome, SendRequest};
//! use mprovider::{ChatMode, UnconfiguredStreamer};
//! use mstore::InMemoryDocumentStore;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let service = ChatService::new(
//!     Arc::new(UnconfiguredStreamer),
//!     Arc::new(InMemoryDocumentStore::new()),
//! );
//! let mut user = User::new("Asha", "asha@example.com");
//! user.plan = maccount::Plan::Premium;
//! let account = Account::new("uid-1".into(), user);
//!
//! let outcome = service
//!     .send_message(
//!         SendRequest::new("hello", ChatMode::Assistant),
//!         Some(&account),
//!         &|_: &ChatSession| {},
//!     )
//!     .await;
//!
//! let SendOutcome::Completed(turn) = outcome else { unreachable!() };
//! assert!(turn.is_error);
//! assert_eq!(
//!     turn.reply().unwrap().content,
//!     "**Error:** No AI Service configured."
//! );
//! # });
//! ```

mod error;
mod hooks;
mod service;
mod store;
mod types;

pub mod prelude {
    pub use crate::{
        ChatError, ChatErrorKind, ChatRuntimeHooks, ChatService, ChatServiceBuilder, ChatSession,
        NoopChatRuntimeHooks, RejectReason, SendOutcome, SendRequest, SessionRepository,
        TurnObserver, TurnSummary,
    };
}

pub use error::{ChatError, ChatErrorKind};
pub use hooks::{ChatRuntimeHooks, NoopChatRuntimeHooks};
pub use service::{ChatService, ChatServiceBuilder, TurnObserver};
pub use store::SessionRepository;
pub use types::{
    ATTACHMENT_ONLY_TITLE, ChatSession, DEFAULT_TITLE, RejectReason, SendOutcome, SendRequest,
    TURN_COST, TurnSummary, title_for,
};
