//! Logging initialization

use std::str::FromStr;
use std::sync::Once;

use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

use crate::errors::OrmError;

/// Environment variable selecting the logging profile
pub const ENV_LOG_PROFILE: &str = "ORMRT_LOG_PROFILE";

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output for development
    Development,
    /// JSON structured output for production
    Production,
    /// Bare registry; tests attach their own capture layer
    Test,
}

impl Profile {
    /// Profile named by `ORMRT_LOG_PROFILE`, if set
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the variable names no profile.
    pub fn from_env() -> Result<Option<Self>, OrmError> {
        match std::env::var(ENV_LOG_PROFILE) {
            Ok(raw) => raw.parse().map(Some),
            Err(_) => Ok(None),
        }
    }
}

impl FromStr for Profile {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Profile::Development),
            "production" | "prod" => Ok(Profile::Production),
            "test" => Ok(Profile::Test),
            other => Err(OrmError::InvalidInput {
                reason: format!("unknown logging profile '{}'", other),
            }),
        }
    }
}

static INIT_ONCE: Once = Once::new();

/// Initialize the logging facility
///
/// Only the first call has an effect. If another global subscriber is
/// already installed, it is left in place.
///
/// # Profiles
///
/// - **Development**: human-readable logs, `ormrt_core=debug` unless `RUST_LOG` says otherwise
/// - **Production**: JSON logs, `ormrt_core=info` unless `RUST_LOG` says otherwise
/// - **Test**: bare registry
///
/// # Example
///
/// ```
/// use ormrt_core::logging_facility::{init, Profile};
///
/// init(Profile::Development);
/// ```
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| match profile {
        Profile::Development => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("ormrt_core=debug")),
                )
                .try_init();
        }
        Profile::Production => {
            let _ = tracing_subscriber::fmt()
                .json()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("ormrt_core=info")),
                )
                .try_init();
        }
        Profile::Test => {
            let _ = tracing_subscriber::registry().try_init();
        }
    });
}
