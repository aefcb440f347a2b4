//! Accounts, the credit ledger, coupons, the inbox, and the admin console.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use maccount::{AccountService, InMemoryAuthProvider, Plan};
//! use mstore::InMemoryDocumentStore;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let accounts = AccountService::new(
//!     Arc::new(InMemoryAuthProvider::new()),
//!     Arc::new(InMemoryDocumentStore::new()),
//! );
//!
//! let account = accounts.sign_up("Asha", "asha@example.com", "secret1").await.unwrap();
//! assert_eq!(account.user.credits, 50);
//! assert_eq!(account.user.plan, Plan::Free);
//!
//! let balance = accounts
//!     .ledger()
//!     .deduct(&account.uid, account.credits(), account.plan(), 3)
//!     .await
//!     .unwrap();
//! assert_eq!(balance, 47);
//! # });
//! ```

mod account;
mod admin;
mod auth;
mod coupon;
mod error;
mod inbox;
mod ledger;
mod paths;
pub mod purchase;
mod user;

pub mod prelude {
    pub use crate::{
        Account, AccountError, AccountErrorKind, AccountService, AdminConsole, AuthIdentity,
        AuthProvider, Coupon, CreditLedger, InMemoryAuthProvider, Inbox, InboxMessage, Plan,
        Redemption, SystemMessage, User,
    };
}

pub use account::{AccountService, WELCOME_CODE, WELCOME_TITLE};
pub use admin::{
    AdminConsole, CouponRecord, DEFAULT_PRICE_PER_CREDIT, UserRecord, read_price_per_credit,
};
pub use auth::{AuthIdentity, AuthProvider, InMemoryAuthProvider};
pub use coupon::{Coupon, builtin_amount, normalize_code};
pub use error::{AccountError, AccountErrorKind};
pub use inbox::{Inbox, InboxMessage, InboxSubscription, SystemMessage};
pub use ledger::{CAS_ATTEMPTS, CreditLedger, Redemption};
pub use user::{ACCOUNT_ID_LEN, Account, Plan, SIGN_UP_CREDITS, User};
