//! Application configuration module
//!
//! Typed configuration loaded from environment variables with the `config`
//! and `dotenvy` crates. Variables use the `SAPIENS` prefix and `__` between
//! nesting levels.
//!
//! # Example
//!
//! ```no_run
//! use sapiens::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod ai;
mod database;
mod error;
mod journey;
mod server;

pub use ai::AiConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use journey::JourneyConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root configuration for the Sapiens service.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Absent means the in-memory journey store
    pub database: Option<DatabaseConfig>,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub journey: JourneyConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Reads `.env` first when present, then `SAPIENS__*` variables:
    ///
    /// - `SAPIENS__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `SAPIENS__AI__OPENAI_API_KEY=...` -> `ai.openai_api_key = ...`
    /// - `SAPIENS__DATABASE__URL=...` -> enables PostgreSQL
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SAPIENS")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.ai.validate()?;
        self.journey.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
