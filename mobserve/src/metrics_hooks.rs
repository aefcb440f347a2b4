//! Metrics-based observability hooks for the fallback ladder and chat turns.
//!
//! ```rust
//! use mobserve::MetricsObservabilityHooks;
//! use mprovider::FallbackHooks;
//!
//! fn accepts_fallback_hooks(_hooks: &dyn FallbackHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_fallback_hooks(&hooks);
//! ```

use std::time::Duration;

use mchat::{ChatRuntimeHooks, RejectReason};
use mcommon::{SessionId, UserId};
use mprovider::{ChatMode, FallbackHooks, ProviderError, ProviderId};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl FallbackHooks for MetricsObservabilityHooks {
    fn on_attempt_start(&self, provider: ProviderId, model: &str, _attempt: u32) {
        metrics::counter!(
            "manavai_provider_attempt_start_total",
            "provider" => provider.to_string(),
            "model" => model.to_string()
        )
        .increment(1);
    }

    fn on_fallback(&self, provider: ProviderId, model: &str, _attempt: u32, error: &ProviderError) {
        metrics::counter!(
            "manavai_provider_fallback_total",
            "provider" => provider.to_string(),
            "model" => model.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
    }

    fn on_success(&self, provider: ProviderId, model: &str, attempts: u32) {
        metrics::counter!(
            "manavai_provider_success_total",
            "provider" => provider.to_string(),
            "model" => model.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "manavai_provider_attempts_per_success",
            "provider" => provider.to_string()
        )
        .record(attempts as f64);
    }

    fn on_failure(&self, provider: ProviderId, attempts: u32, error: Option<&ProviderError>) {
        let error_kind = error
            .map(|error| format!("{:?}", error.kind))
            .unwrap_or_else(|| "Exhausted".to_string());
        metrics::counter!(
            "manavai_provider_failure_total",
            "provider" => provider.to_string(),
            "error_kind" => error_kind
        )
        .increment(1);
        metrics::histogram!(
            "manavai_provider_attempts_per_failure",
            "provider" => provider.to_string()
        )
        .record(attempts as f64);
    }
}

impl ChatRuntimeHooks for MetricsObservabilityHooks {
    fn on_turn_rejected(&self, reason: RejectReason) {
        metrics::counter!("manavai_chat_turn_rejected_total", "reason" => format!("{:?}", reason))
            .increment(1);
    }

    fn on_purchase_required(&self, _uid: &UserId, _credits: u32) {
        metrics::counter!("manavai_chat_purchase_required_total").increment(1);
    }

    fn on_turn_start(&self, _uid: &UserId, _session_id: &SessionId, mode: ChatMode) {
        metrics::counter!("manavai_chat_turn_start_total", "mode" => mode.as_str()).increment(1);
    }

    fn on_credits_deducted(&self, _uid: &UserId, amount: u32, _remaining: u32) {
        metrics::counter!("manavai_ledger_credits_deducted_total").increment(u64::from(amount));
    }

    fn on_turn_success(
        &self,
        _session_id: &SessionId,
        provider: ProviderId,
        fragments: u32,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "manavai_chat_turn_success_total",
            "provider" => provider.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "manavai_chat_turn_duration_seconds",
            "provider" => provider.to_string(),
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
        metrics::histogram!(
            "manavai_chat_fragments_per_turn",
            "provider" => provider.to_string()
        )
        .record(fragments as f64);
    }

    fn on_turn_failure(
        &self,
        _session_id: &SessionId,
        provider: ProviderId,
        _message: &str,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "manavai_chat_turn_failure_total",
            "provider" => provider.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "manavai_chat_turn_duration_seconds",
            "provider" => provider.to_string(),
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_persist_failure(&self, _session_id: &SessionId, _message: &str) {
        metrics::counter!("manavai_store_persist_failure_total").increment(1);
    }
}
