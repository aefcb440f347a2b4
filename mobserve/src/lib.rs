//! Observability hooks for the model fallback ladder and chat turns.
//!
//! ```rust
//! use mobserve::{MetricsObservabilityHooks, SafeChatHooks, SafeFallbackHooks, TracingObservabilityHooks};
//!
//! let _fallback_hooks = SafeFallbackHooks::new(TracingObservabilityHooks);
//! let _chat_hooks = SafeChatHooks::new(MetricsObservabilityHooks);
//! ```

mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use metrics_hooks::MetricsObservabilityHooks;
pub use safe_hooks::{SafeChatHooks, SafeFallbackHooks};
pub use tracing_hooks::TracingObservabilityHooks;

pub mod prelude {
    pub use crate::{
        MetricsObservabilityHooks, SafeChatHooks, SafeFallbackHooks, TracingObservabilityHooks,
    };
}
