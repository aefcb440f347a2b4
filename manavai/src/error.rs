use std::error::Error;
use std::fmt::{Display, Formatter};

use mprovider::ProviderError;
use mstore::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManavaiErrorKind {
    Config,
    Provider,
    Store,
    Logging,
}

/// Failure while assembling a runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManavaiError {
    pub kind: ManavaiErrorKind,
    pub message: String,
}

impl ManavaiError {
    pub fn new(kind: ManavaiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ManavaiErrorKind::Config, message)
    }

    pub fn logging(message: impl Into<String>) -> Self {
        Self::new(ManavaiErrorKind::Logging, message)
    }
}

impl Display for ManavaiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ManavaiError {}

impl From<ProviderError> for ManavaiError {
    fn from(value: ProviderError) -> Self {
        Self::new(ManavaiErrorKind::Provider, value.to_string())
    }
}

impl From<StoreError> for ManavaiError {
    fn from(value: StoreError) -> Self {
        Self::new(ManavaiErrorKind::Store, value.to_string())
    }
}
