//! Shared provider error kinds and error value helpers.
//!
//! ```rust
//! use mprovider::ProviderError;
//!
//! let missing = ProviderError::not_found("models/gemini-x is not found");
//! assert!(missing.falls_back());
//!
//! let quota = ProviderError::rate_limited("quota exceeded");
//! assert!(!quota.falls_back());
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Authentication,
    RateLimited,
    NotFound,
    InvalidRequest,
    Timeout,
    Transport,
    Decode,
    Unavailable,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Authentication, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::RateLimited, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::NotFound, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidRequest, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transport, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Decode, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unavailable, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Other, message)
    }

    /// Model-not-found and bad-request errors move the ladder to the next model.
    /// Everything else (quota, credentials, transport) stops it.
    pub fn falls_back(&self) -> bool {
        matches!(
            self.kind,
            ProviderErrorKind::NotFound | ProviderErrorKind::InvalidRequest
        )
    }

    /// Short text shown inside the chat bubble when generation gives up.
    pub fn user_facing(&self) -> String {
        match self.kind {
            ProviderErrorKind::RateLimited => {
                "Server is busy (Quota Exceeded). Please wait a moment.".to_string()
            }
            ProviderErrorKind::Authentication => "Invalid API Key.".to_string(),
            _ => format!("System Error: {}", self.message),
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ProviderError {}
