//! Store locations for account data.

use mcommon::UserId;
use mstore::{DocumentPath, StoreError};

pub(crate) fn users() -> Result<DocumentPath, StoreError> {
    DocumentPath::parse("users")
}

pub(crate) fn user(uid: &UserId) -> Result<DocumentPath, StoreError> {
    users()?.child(uid.as_str())
}

pub(crate) fn credits(uid: &UserId) -> Result<DocumentPath, StoreError> {
    user(uid)?.child("credits")
}

pub(crate) fn coupons() -> Result<DocumentPath, StoreError> {
    DocumentPath::parse("coupons")
}

pub(crate) fn coupon(code: &str) -> Result<DocumentPath, StoreError> {
    coupons()?.child(code)
}

pub(crate) fn coupon_used_count(code: &str) -> Result<DocumentPath, StoreError> {
    coupon(code)?.child("usedCount")
}

pub(crate) fn redemption(uid: &UserId, code: &str) -> Result<DocumentPath, StoreError> {
    DocumentPath::from_segments(["redemptions", uid.as_str(), code])
}

pub(crate) fn inbox(uid: &UserId) -> Result<DocumentPath, StoreError> {
    DocumentPath::from_segments(["inbox", uid.as_str()])
}

pub(crate) fn price_per_credit() -> Result<DocumentPath, StoreError> {
    DocumentPath::parse("config/pricePerCredit")
}
