//! `mailto:` links for manual UPI payment confirmation.
//!
//! ```rust
//! use chrono::NaiveDate;
//! use maccount::purchase::{PaymentConfig, credit_purchase_mailto};
//!
//! let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
//! let link = credit_purchase_mailto(&PaymentConfig::default(), None, 100, 11.99, date);
//!
//! assert!(link.starts_with("mailto:support@manavai.example?subject=Manavai%20Credits%20Purchase&body="));
//! assert!(link.contains("Total%3A%20%E2%82%B91199.00"));
//! ```

use chrono::NaiveDate;

use crate::user::User;

pub const DEFAULT_UPI_ID: &str = "manavai@upi";
pub const DEFAULT_SUPPORT_EMAIL: &str = "support@manavai.example";
pub const DEFAULT_PREMIUM_COST: &str = "₹499/month";

const PREMIUM_SUBJECT: &str = "Manavai Subscription — Payment Confirmation";
const CREDITS_SUBJECT: &str = "Manavai Credits Purchase";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfig {
    pub upi_id: String,
    pub support_email: String,
    pub premium_cost: String,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            upi_id: DEFAULT_UPI_ID.to_string(),
            support_email: DEFAULT_SUPPORT_EMAIL.to_string(),
            premium_cost: DEFAULT_PREMIUM_COST.to_string(),
        }
    }
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Price for `credits` at `price_per_credit`, with two decimals.
pub fn total_cost(credits: u32, price_per_credit: f64) -> String {
    format!("{:.2}", f64::from(credits) * price_per_credit)
}

pub fn premium_confirmation_mailto(
    config: &PaymentConfig,
    user: Option<&User>,
    date: NaiveDate,
) -> String {
    let body = [
        format!("Full name: {}", user.map(|user| user.name.as_str()).unwrap_or_default()),
        format!("Manavai User ID: {}", public_id(user)),
        format!(
            "Manavai account email: {}",
            user.map(|user| user.email.as_str()).unwrap_or_default()
        ),
        format!("Chosen plan: Premium ({})", config.premium_cost),
        format!("Payment date (DD-MM-YYYY): {}", date.format("%d-%m-%Y")),
        "UTR / Reference number: ".to_string(),
        String::new(),
        "[PLEASE ATTACH SCREENSHOT OF PAYMENT BEFORE SENDING]".to_string(),
    ]
    .join("\n");

    mailto(&config.support_email, PREMIUM_SUBJECT, &body)
}

pub fn credit_purchase_mailto(
    config: &PaymentConfig,
    user: Option<&User>,
    credits: u32,
    price_per_credit: f64,
    date: NaiveDate,
) -> String {
    let body = [
        format!("Manavai User ID: {}", public_id(user)),
        format!(
            "Manavai Account: {}",
            user.map(|user| user.email.as_str()).unwrap_or_default()
        ),
        format!("Credits: {credits}"),
        format!("Total: ₹{}", total_cost(credits, price_per_credit)),
        format!("Date: {}", date.format("%d-%m-%Y")),
        "UTR: ".to_string(),
        String::new(),
        "[PLEASE ATTACH PAYMENT SCREENSHOT]".to_string(),
    ]
    .join("\n");

    mailto(&config.support_email, CREDITS_SUBJECT, &body)
}

fn public_id(user: Option<&User>) -> &str {
    user.map(|user| user.id.as_str()).unwrap_or("N/A")
}

fn mailto(address: &str, subject: &str, body: &str) -> String {
    format!(
        "mailto:{address}?subject={}&body={}",
        urlencoding::encode(subject),
        urlencoding::encode(body)
    )
}
