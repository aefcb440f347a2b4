use std::error::Error;
use std::fmt::{Display, Formatter};

use mstore::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountErrorKind {
    Authentication,
    NotFound,
    InvalidInput,
    Unauthorized,
    InsufficientCredits,
    InvalidCoupon,
    CouponLimitReached,
    CouponAlreadyUsed,
    Conflict,
    Storage,
}

/// Account and ledger failure. `message` is safe to show to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountError {
    pub kind: AccountErrorKind,
    pub message: String,
}

impl AccountError {
    pub fn new(kind: AccountErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(AccountErrorKind::Authentication, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(AccountErrorKind::NotFound, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(AccountErrorKind::InvalidInput, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(AccountErrorKind::Unauthorized, message)
    }

    pub fn insufficient_credits() -> Self {
        Self::new(AccountErrorKind::InsufficientCredits, "Insufficient credits")
    }

    pub fn invalid_coupon() -> Self {
        Self::new(AccountErrorKind::InvalidCoupon, "Invalid coupon code.")
    }

    pub fn coupon_limit_reached() -> Self {
        Self::new(
            AccountErrorKind::CouponLimitReached,
            "This coupon has reached its usage limit.",
        )
    }

    pub fn coupon_already_used() -> Self {
        Self::new(
            AccountErrorKind::CouponAlreadyUsed,
            "You have already used this coupon.",
        )
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(AccountErrorKind::Conflict, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(AccountErrorKind::Storage, message)
    }
}

impl Display for AccountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for AccountError {}

impl From<StoreError> for AccountError {
    fn from(value: StoreError) -> Self {
        Self::storage(value.message)
    }
}
