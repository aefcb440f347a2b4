//! Process-wide tracing subscriber setup.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::ManavaiError;

/// Installs a formatted subscriber filtered by `RUST_LOG` when set, else `directives`.
///
/// Fails if the filter does not parse or a global subscriber is already set.
pub fn init_tracing(directives: &str) -> Result<(), ManavaiError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(directives).map_err(|error| {
            ManavaiError::logging(format!("invalid log filter '{directives}': {error}"))
        })?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|error| ManavaiError::logging(error.to_string()))
}
