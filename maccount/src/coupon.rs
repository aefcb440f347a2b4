//! Coupon records and code resolution.

use serde::{Deserialize, Serialize};

/// Code prefix whose third `-` segment encodes the credit amount.
pub const CREDIT_CODE_PREFIX: &str = "MANAVAI-CREDIT-";

/// Literal promotional code worth [`PROMO_CODE_CREDITS`].
pub const PROMO_CODE: &str = "MANAVAI50";
pub const PROMO_CODE_CREDITS: u32 = 50;

/// Stored coupon at `coupons/{CODE}`. A `max_redemptions` of zero means unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    #[serde(default)]
    pub amount: u32,
    #[serde(default)]
    pub max_redemptions: u32,
    #[serde(default)]
    pub used_count: u32,
    #[serde(default)]
    pub created_at: i64,
}

impl Coupon {
    pub fn new(amount: u32, max_redemptions: u32) -> Self {
        Self {
            amount,
            max_redemptions,
            used_count: 0,
            created_at: mcommon::now_millis(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.max_redemptions != 0 && self.used_count >= self.max_redemptions
    }
}

/// Trims and uppercases a user-entered code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Amount for codes that need no stored coupon. `None` when the code is not built in.
pub fn builtin_amount(normalized: &str) -> Option<u32> {
    if normalized.starts_with(CREDIT_CODE_PREFIX) {
        let segment = normalized.split('-').nth(2).unwrap_or_default();
        let digits = segment
            .chars()
            .take_while(char::is_ascii_digit)
            .collect::<String>();
        return digits.parse::<u32>().ok();
    }

    (normalized == PROMO_CODE).then_some(PROMO_CODE_CREDITS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_trimmed_and_uppercased() {
        assert_eq!(normalize_code("  manavai50 \n"), "MANAVAI50");
    }

    #[test]
    fn credit_codes_take_leading_digits_of_third_segment() {
        assert_eq!(builtin_amount("MANAVAI-CREDIT-100"), Some(100));
        assert_eq!(builtin_amount("MANAVAI-CREDIT-25XYZ"), Some(25));
        assert_eq!(builtin_amount("MANAVAI-CREDIT-0"), Some(0));
        assert_eq!(builtin_amount("MANAVAI-CREDIT-ABC"), None);
        assert_eq!(builtin_amount("MANAVAI-CREDIT-"), None);
        assert_eq!(builtin_amount("MANAVAI50"), Some(50));
        assert_eq!(builtin_amount("MANAVAI51"), None);
    }

    #[test]
    fn zero_limit_means_unlimited() {
        let unlimited = Coupon {
            amount: 5,
            max_redemptions: 0,
            used_count: 1_000,
            created_at: 0,
        };
        assert!(!unlimited.is_exhausted());

        let capped = Coupon {
            max_redemptions: 2,
            used_count: 2,
            ..unlimited
        };
        assert!(capped.is_exhausted());
    }
}
