//! Credit balance changes as compare-and-swap writes.
//!
//! Every mutation is guarded on the balance the caller observed. When another
//! writer got there first the ledger re-reads and tries again, up to
//! [`CAS_ATTEMPTS`] times.

use std::sync::Arc;

use mcommon::UserId;
use mstore::{DocumentPath, DocumentStore, DocumentStoreExt, Guard, WriteBatch};
use serde_json::{Value, json};

use crate::coupon::{Coupon, builtin_amount, normalize_code};
use crate::error::AccountError;
use crate::paths;
use crate::user::Plan;

pub const CAS_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redemption {
    pub code: String,
    pub amount: u32,
    pub balance: u32,
}

impl Redemption {
    pub fn message(&self) -> String {
        format!("Successfully added {} credits!", self.amount)
    }
}

#[derive(Clone)]
pub struct CreditLedger {
    store: Arc<dyn DocumentStore>,
}

impl CreditLedger {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn balance(&self, uid: &UserId) -> Result<u32, AccountError> {
        let credits = self
            .store
            .get_as::<u32>(&paths::credits(uid)?)
            .await?
            .unwrap_or_default();
        Ok(credits)
    }

    /// Removes `amount` credits from a Free account. Premium accounts are untouched.
    ///
    /// Returns the balance after the write.
    pub async fn deduct(
        &self,
        uid: &UserId,
        observed_balance: u32,
        plan: Plan,
        amount: u32,
    ) -> Result<u32, AccountError> {
        if plan == Plan::Premium {
            return Ok(observed_balance);
        }

        let path = paths::credits(uid)?;
        let (mut expected, mut observed) = (json!(observed_balance), observed_balance);
        for attempt in 1..=CAS_ATTEMPTS {
            if observed < amount {
                return Err(AccountError::insufficient_credits());
            }

            let remaining = observed - amount;
            let applied = self
                .store
                .update_if(
                    vec![Guard::equals(path.clone(), expected)],
                    WriteBatch::new().set(path.clone(), json!(remaining)),
                )
                .await?;
            if applied {
                return Ok(remaining);
            }

            tracing::debug!(
                target: "maccount::ledger",
                uid = uid.as_str(),
                attempt,
                "balance changed during deduction; retrying"
            );
            (expected, observed) = self.raw_balance(&path).await?;
        }

        Err(contention(uid))
    }

    /// Applies a coupon code. Stored coupons win over built-in codes.
    pub async fn redeem(
        &self,
        uid: &UserId,
        observed_balance: u32,
        code: &str,
    ) -> Result<Redemption, AccountError> {
        let code = normalize_code(code);
        if code.is_empty() {
            return Err(AccountError::invalid_coupon());
        }

        // Codes that cannot be stored as a path segment cannot name a coupon.
        let (Ok(coupon_path), Ok(used_path), Ok(marker_path)) = (
            paths::coupon(&code),
            paths::coupon_used_count(&code),
            paths::redemption(uid, &code),
        ) else {
            return Err(AccountError::invalid_coupon());
        };
        let credits_path = paths::credits(uid)?;

        let (mut expected, mut observed) = (json!(observed_balance), observed_balance);
        for attempt in 1..=CAS_ATTEMPTS {
            let stored = self.store.get_as::<Coupon>(&coupon_path).await?;

            let amount = match &stored {
                Some(coupon) if coupon.is_exhausted() => {
                    return Err(AccountError::coupon_limit_reached());
                }
                Some(coupon) => coupon.amount,
                None => builtin_amount(&code).unwrap_or_default(),
            };
            if amount == 0 {
                return Err(AccountError::invalid_coupon());
            }

            if self.store.get(&marker_path).await?.is_some() {
                return Err(AccountError::coupon_already_used());
            }

            let balance = observed.saturating_add(amount);
            let mut guards = vec![
                Guard::equals(credits_path.clone(), expected),
                Guard::absent(marker_path.clone()),
            ];
            let mut batch = WriteBatch::new()
                .set(credits_path.clone(), json!(balance))
                .set(marker_path.clone(), Value::Bool(true));

            if let Some(coupon) = &stored {
                let observed_used = self.store.get(&used_path).await?.unwrap_or(Value::Null);
                guards.push(Guard::equals(used_path.clone(), observed_used));
                batch.push(used_path.clone(), json!(coupon.used_count + 1));
            }

            if self.store.update_if(guards, batch).await? {
                tracing::info!(
                    target: "maccount::ledger",
                    uid = uid.as_str(),
                    code = code.as_str(),
                    amount,
                    "coupon redeemed"
                );
                return Ok(Redemption {
                    code,
                    amount,
                    balance,
                });
            }

            tracing::debug!(
                target: "maccount::ledger",
                uid = uid.as_str(),
                attempt,
                "redemption guards failed; retrying"
            );
            (expected, observed) = self.raw_balance(&credits_path).await?;
        }

        Err(contention(uid))
    }

    /// Adds `amount` credits regardless of plan. Returns the new balance.
    pub async fn grant(&self, uid: &UserId, amount: u32) -> Result<u32, AccountError> {
        let path = paths::credits(uid)?;
        for _ in 0..CAS_ATTEMPTS {
            let (observed, current) = self.raw_balance(&path).await?;
            let balance = current.saturating_add(amount);

            let applied = self
                .store
                .update_if(
                    vec![Guard::equals(path.clone(), observed)],
                    WriteBatch::new().set(path.clone(), json!(balance)),
                )
                .await?;
            if applied {
                return Ok(balance);
            }
        }

        Err(contention(uid))
    }

    /// Stored balance as written, for guards, plus its numeric reading.
    async fn raw_balance(&self, path: &DocumentPath) -> Result<(Value, u32), AccountError> {
        let raw = self.store.get(path).await?.unwrap_or(Value::Null);
        let credits = raw
            .as_u64()
            .and_then(|credits| u32::try_from(credits).ok())
            .unwrap_or_default();
        Ok((raw, credits))
    }
}

fn contention(uid: &UserId) -> AccountError {
    tracing::warn!(
        target: "maccount::ledger",
        uid = uid.as_str(),
        attempts = CAS_ATTEMPTS,
        "credit update abandoned after repeated conflicts"
    );
    AccountError::conflict("Your balance changed while updating. Please try again.")
}
