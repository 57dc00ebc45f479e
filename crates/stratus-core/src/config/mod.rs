//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod catalog;
pub mod compute;
pub mod logging;
pub mod session;

use serde::{Deserialize, Serialize};

use self::catalog::CatalogConfig;
use self::compute::ComputeConfig;
use self::logging::LoggingConfig;
use self::session::SessionConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Virtual clock settings.
    #[serde(default)]
    pub clock: ClockConfig,
    /// Session store settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Compute simulator settings.
    #[serde(default)]
    pub compute: ComputeConfig,
    /// Service catalog settings.
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Virtual clock configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    /// RFC 3339 timestamp the simulated world starts at.
    #[serde(default = "default_epoch")]
    pub epoch: String,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            epoch: default_epoch(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `STRATUS_`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("STRATUS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

fn default_epoch() -> String {
    "2024-01-01T00:00:00Z".to_string()
}
