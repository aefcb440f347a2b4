//! Tracing-based observability hooks for the fallback ladder and chat turns.
//!
//! ```rust
//! use mchat::ChatRuntimeHooks;
//! use mobserve::TracingObservabilityHooks;
//!
//! fn accepts_chat_hooks(_hooks: &dyn ChatRuntimeHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_chat_hooks(&hooks);
//! ```

use std::time::Duration;

use mchat::{ChatRuntimeHooks, RejectReason};
use mcommon::{SessionId, UserId};
use mprovider::{ChatMode, FallbackHooks, ProviderError, ProviderId};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl FallbackHooks for TracingObservabilityHooks {
    fn on_attempt_start(&self, provider: ProviderId, model: &str, attempt: u32) {
        tracing::info!(
            phase = "provider",
            event = "attempt_start",
            provider = %provider,
            model,
            attempt
        );
    }

    fn on_fallback(&self, provider: ProviderId, model: &str, attempt: u32, error: &ProviderError) {
        tracing::warn!(
            phase = "provider",
            event = "fallback",
            provider = %provider,
            model,
            attempt,
            error_kind = ?error.kind,
            error = %error
        );
    }

    fn on_success(&self, provider: ProviderId, model: &str, attempts: u32) {
        tracing::info!(
            phase = "provider",
            event = "success",
            provider = %provider,
            model,
            attempts
        );
    }

    fn on_failure(&self, provider: ProviderId, attempts: u32, error: Option<&ProviderError>) {
        tracing::error!(
            phase = "provider",
            event = "failure",
            provider = %provider,
            attempts,
            error_kind = error.map(|error| tracing::field::debug(error.kind)),
            error = error.map(tracing::field::display)
        );
    }
}

impl ChatRuntimeHooks for TracingObservabilityHooks {
    fn on_turn_rejected(&self, reason: RejectReason) {
        tracing::debug!(phase = "chat", event = "turn_rejected", reason = ?reason);
    }

    fn on_purchase_required(&self, uid: &UserId, credits: u32) {
        tracing::info!(
            phase = "chat",
            event = "purchase_required",
            uid = %uid,
            credits
        );
    }

    fn on_turn_start(&self, uid: &UserId, session_id: &SessionId, mode: ChatMode) {
        tracing::info!(
            phase = "chat",
            event = "turn_start",
            uid = %uid,
            session_id = %session_id,
            mode = %mode
        );
    }

    fn on_credits_deducted(&self, uid: &UserId, amount: u32, remaining: u32) {
        tracing::info!(
            phase = "ledger",
            event = "credits_deducted",
            uid = %uid,
            amount,
            remaining
        );
    }

    fn on_turn_success(
        &self,
        session_id: &SessionId,
        provider: ProviderId,
        fragments: u32,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "chat",
            event = "turn_success",
            session_id = %session_id,
            provider = %provider,
            fragments,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_turn_failure(
        &self,
        session_id: &SessionId,
        provider: ProviderId,
        message: &str,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "chat",
            event = "turn_failure",
            session_id = %session_id,
            provider = %provider,
            elapsed_ms = elapsed.as_millis() as u64,
            error = message
        );
    }

    fn on_persist_failure(&self, session_id: &SessionId, message: &str) {
        tracing::error!(
            phase = "store",
            event = "persist_failure",
            session_id = %session_id,
            error = message
        );
    }
}
