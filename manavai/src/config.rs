//! Environment-driven application configuration.
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::time::Duration;
//!
//! use manavai::AppConfig;
//!
//! let vars = HashMap::from([
//!     ("MANAVAI_GEMINI_API_KEY", "gm-test"),
//!     ("MANAVAI_ADMIN_EMAIL", "admin@example.com"),
//!     ("MANAVAI_CONNECT_TIMEOUT_SECS", "10"),
//! ]);
//! let config = AppConfig::from_lookup(|key| vars.get(key).map(|value| value.to_string())).unwrap();
//!
//! assert!(config.gemini_api_key.is_some());
//! assert_eq!(config.admin_email.as_deref(), Some("admin@example.com"));
//! assert_eq!(config.connect_timeout, Duration::from_secs(10));
//! ```

use std::path::PathBuf;
use std::time::Duration;

use maccount::purchase::PaymentConfig;
use mprovider::SecretString;
use mstore::StoreBackendConfig;

use crate::ManavaiError;

pub const GEMINI_API_KEY_VAR: &str = "MANAVAI_GEMINI_API_KEY";
pub const OPENAI_API_KEY_VAR: &str = "MANAVAI_OPENAI_API_KEY";
pub const ADMIN_EMAIL_VAR: &str = "MANAVAI_ADMIN_EMAIL";
pub const SUPPORT_EMAIL_VAR: &str = "MANAVAI_SUPPORT_EMAIL";
pub const UPI_ID_VAR: &str = "MANAVAI_UPI_ID";
pub const PREMIUM_COST_VAR: &str = "MANAVAI_PREMIUM_COST";
pub const STORE_PATH_VAR: &str = "MANAVAI_STORE_PATH";
pub const CONNECT_TIMEOUT_VAR: &str = "MANAVAI_CONNECT_TIMEOUT_SECS";
pub const LOG_VAR: &str = "MANAVAI_LOG";

/// `MANAVAI_STORE_PATH` value selecting the in-memory store.
pub const IN_MEMORY_STORE: &str = ":memory:";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini_api_key: Option<SecretString>,
    pub openai_api_key: Option<SecretString>,
    pub admin_email: Option<String>,
    pub payment: PaymentConfig,
    pub store: StoreBackendConfig,
    pub connect_timeout: Duration,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            openai_api_key: None,
            admin_email: None,
            payment: PaymentConfig::default(),
            store: StoreBackendConfig::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    /// Reads the process environment after loading `.env` if one is present.
    pub fn from_env() -> Result<Self, ManavaiError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ManavaiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();
        let mut payment = defaults.payment;
        if let Some(upi_id) = read(UPI_ID_VAR) {
            payment.upi_id = upi_id;
        }
        if let Some(support_email) = read(SUPPORT_EMAIL_VAR) {
            payment.support_email = support_email;
        }
        if let Some(premium_cost) = read(PREMIUM_COST_VAR) {
            payment.premium_cost = premium_cost;
        }

        let store = match read(STORE_PATH_VAR) {
            Some(path) if path == IN_MEMORY_STORE => StoreBackendConfig::InMemory,
            Some(path) => StoreBackendConfig::Sqlite {
                path: PathBuf::from(path),
            },
            None => defaults.store,
        };

        let connect_timeout = match read(CONNECT_TIMEOUT_VAR) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(seconds) if seconds > 0 => Duration::from_secs(seconds),
                _ => {
                    return Err(ManavaiError::config(format!(
                        "{CONNECT_TIMEOUT_VAR} must be a positive number of seconds, got '{raw}'"
                    )));
                }
            },
            None => defaults.connect_timeout,
        };

        Ok(Self {
            gemini_api_key: read(GEMINI_API_KEY_VAR).map(SecretString::new),
            openai_api_key: read(OPENAI_API_KEY_VAR).map(SecretString::new),
            admin_email: read(ADMIN_EMAIL_VAR),
            payment,
            store,
            connect_timeout,
            log_filter: read(LOG_VAR).unwrap_or(defaults.log_filter),
        })
    }

    pub fn with_store(mut self, store: StoreBackendConfig) -> Self {
        self.store = store;
        self
    }

    pub fn with_admin_email(mut self, email: impl Into<String>) -> Self {
        self.admin_email = Some(email.into());
        self
    }
}
