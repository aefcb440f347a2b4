use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use mchat::{ChatRuntimeHooks, RejectReason};
use mcommon::{SessionId, UserId};
use mprovider::{ChatMode, FallbackHooks, ProviderError, ProviderId};

pub struct SafeFallbackHooks<H> {
    inner: H,
}

impl<H> SafeFallbackHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> FallbackHooks for SafeFallbackHooks<H>
where
    H: FallbackHooks,
{
    fn on_attempt_start(&self, provider: ProviderId, model: &str, attempt: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_attempt_start(provider, model, attempt)
        }));
    }

    fn on_fallback(&self, provider: ProviderId, model: &str, attempt: u32, error: &ProviderError) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_fallback(provider, model, attempt, error)
        }));
    }

    fn on_success(&self, provider: ProviderId, model: &str, attempts: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_success(provider, model, attempts)
        }));
    }

    fn on_failure(&self, provider: ProviderId, attempts: u32, error: Option<&ProviderError>) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_failure(provider, attempts, error)
        }));
    }
}

pub struct SafeChatHooks<H> {
    inner: H,
}

impl<H> SafeChatHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ChatRuntimeHooks for SafeChatHooks<H>
where
    H: ChatRuntimeHooks,
{
    fn on_turn_rejected(&self, reason: RejectReason) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_turn_rejected(reason)));
    }

    fn on_purchase_required(&self, uid: &UserId, credits: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_purchase_required(uid, credits)
        }));
    }

    fn on_turn_start(&self, uid: &UserId, session_id: &SessionId, mode: ChatMode) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_turn_start(uid, session_id, mode)
        }));
    }

    fn on_credits_deducted(&self, uid: &UserId, amount: u32, remaining: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_credits_deducted(uid, amount, remaining)
        }));
    }

    fn on_turn_success(
        &self,
        session_id: &SessionId,
        provider: ProviderId,
        fragments: u32,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_turn_success(session_id, provider, fragments, elapsed)
        }));
    }

    fn on_turn_failure(
        &self,
        session_id: &SessionId,
        provider: ProviderId,
        message: &str,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_turn_failure(session_id, provider, message, elapsed)
        }));
    }

    fn on_persist_failure(&self, session_id: &SessionId, message: &str) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_persist_failure(session_id, message)
        }));
    }
}
