//! Runtime hook contracts for chat turn observability.
//!
//! ```rust
//! use mchat::{ChatRuntimeHooks, NoopChatRuntimeHooks};
//!
//! fn accepts_hooks(_hooks: &dyn ChatRuntimeHooks) {}
//!
//! let hooks = NoopChatRuntimeHooks;
//! accepts_hooks(&hooks);
//! ```

use std::time::Duration;

use mcommon::{SessionId, UserId};
use mprovider::{ChatMode, ProviderId};

use crate::RejectReason;

pub trait ChatRuntimeHooks: Send + Sync {
    fn on_turn_rejected(&self, _reason: RejectReason) {}

    fn on_purchase_required(&self, _uid: &UserId, _credits: u32) {}

    fn on_turn_start(&self, _uid: &UserId, _session_id: &SessionId, _mode: ChatMode) {}

    fn on_credits_deducted(&self, _uid: &UserId, _amount: u32, _remaining: u32) {}

    fn on_turn_success(
        &self,
        _session_id: &SessionId,
        _provider: ProviderId,
        _fragments: u32,
        _elapsed: Duration,
    ) {
    }

    fn on_turn_failure(
        &self,
        _session_id: &SessionId,
        _provider: ProviderId,
        _message: &str,
        _elapsed: Duration,
    ) {
    }

    fn on_persist_failure(&self, _session_id: &SessionId, _message: &str) {}
}

#[derive(Debug, Default)]
pub struct NoopChatRuntimeHooks;

impl ChatRuntimeHooks for NoopChatRuntimeHooks {}
