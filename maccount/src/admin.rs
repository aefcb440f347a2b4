//! Operations reserved for the configured admin account.

use std::sync::Arc;

use mcommon::UserId;
use mstore::{DocumentStore, DocumentStoreExt};
use serde_json::Value;

use crate::coupon::{Coupon, normalize_code};
use crate::error::AccountError;
use crate::inbox::{Inbox, InboxMessage, SystemMessage};
use crate::ledger::CreditLedger;
use crate::paths;
use crate::user::User;

pub const DEFAULT_PRICE_PER_CREDIT: f64 = 11.99;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub uid: UserId,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponRecord {
    pub code: String,
    pub coupon: Coupon,
}

pub struct AdminConsole {
    store: Arc<dyn DocumentStore>,
    inbox: Inbox,
    ledger: CreditLedger,
}

impl AdminConsole {
    pub(crate) fn new(store: Arc<dyn DocumentStore>, inbox: Inbox, ledger: CreditLedger) -> Self {
        Self {
            store,
            inbox,
            ledger,
        }
    }

    pub async fn list_users(&self) -> Result<Vec<UserRecord>, AccountError> {
        let entries = self.entries(&paths::users()?).await?;
        Ok(entries
            .into_iter()
            .filter_map(|(uid, value)| {
                serde_json::from_value::<User>(value)
                    .ok()
                    .map(|user| UserRecord {
                        uid: UserId::new(uid),
                        user,
                    })
            })
            .collect())
    }

    /// Adds credits and notifies the recipient. Returns the new balance.
    pub async fn grant_credits(&self, uid: &UserId, amount: u32) -> Result<u32, AccountError> {
        if amount == 0 {
            return Err(AccountError::invalid_input("Credit amount must be positive."));
        }

        let user = self
            .store
            .get_as::<User>(&paths::user(uid)?)
            .await?
            .ok_or_else(|| AccountError::not_found("User data not found in database"))?;

        let balance = self.ledger.grant(uid, amount).await?;
        self.inbox
            .send_system_message(
                uid,
                SystemMessage::new(
                    "Credits Received",
                    format!(
                        "Admin has added {amount} credits to your account (ID: {}).",
                        user.id
                    ),
                ),
            )
            .await?;

        tracing::info!(
            target: "maccount::admin",
            uid = uid.as_str(),
            amount,
            balance,
            "credits granted"
        );
        Ok(balance)
    }

    pub async fn send_message(
        &self,
        uid: &UserId,
        message: SystemMessage,
    ) -> Result<InboxMessage, AccountError> {
        if message.title.trim().is_empty() || message.body.trim().is_empty() {
            return Err(AccountError::invalid_input(
                "Message subject and body are required.",
            ));
        }

        self.inbox.send_system_message(uid, message).await
    }

    /// Stores a coupon under its uppercased code, replacing any existing one.
    pub async fn create_coupon(
        &self,
        code: &str,
        amount: u32,
        max_redemptions: u32,
    ) -> Result<CouponRecord, AccountError> {
        let code = normalize_code(code);
        if code.is_empty() {
            return Err(AccountError::invalid_input("Coupon code is required."));
        }
        let path = paths::coupon(&code)
            .map_err(|error| AccountError::invalid_input(error.message))?;

        let coupon = Coupon::new(amount, max_redemptions);
        self.store.set_as(&path, &coupon).await?;
        Ok(CouponRecord { code, coupon })
    }

    pub async fn list_coupons(&self) -> Result<Vec<CouponRecord>, AccountError> {
        let entries = self.entries(&paths::coupons()?).await?;
        Ok(entries
            .into_iter()
            .filter_map(|(code, value)| {
                serde_json::from_value::<Coupon>(value)
                    .ok()
                    .map(|coupon| CouponRecord { code, coupon })
            })
            .collect())
    }

    pub async fn delete_coupon(&self, code: &str) -> Result<(), AccountError> {
        let path = paths::coupon(code)
            .map_err(|error| AccountError::invalid_input(error.message))?;
        self.store.remove(&path).await?;
        Ok(())
    }

    pub async fn price_per_credit(&self) -> Result<f64, AccountError> {
        read_price_per_credit(self.store.as_ref()).await
    }

    /// Stores the price as entered. It must parse as a positive number.
    pub async fn set_price_per_credit(&self, price: &str) -> Result<(), AccountError> {
        let price = price.trim();
        match price.parse::<f64>() {
            Ok(value) if value.is_finite() && value > 0.0 => {}
            _ => {
                return Err(AccountError::invalid_input(
                    "Price per credit must be a positive number.",
                ));
            }
        }

        self.store
            .set(&paths::price_per_credit()?, Value::String(price.to_string()))
            .await?;
        Ok(())
    }

    async fn entries(
        &self,
        path: &mstore::DocumentPath,
    ) -> Result<Vec<(String, Value)>, AccountError> {
        match self.store.get(path).await? {
            Some(Value::Object(map)) => Ok(map.into_iter().collect()),
            _ => Ok(Vec::new()),
        }
    }
}

/// Current credit price. Stored as a string or a number; unreadable values fall back to the default.
pub async fn read_price_per_credit(store: &dyn DocumentStore) -> Result<f64, AccountError> {
    let stored = store.get(&paths::price_per_credit()?).await?;
    let price = match stored {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    Ok(price
        .filter(|price| price.is_finite())
        .unwrap_or(DEFAULT_PRICE_PER_CREDIT))
}
