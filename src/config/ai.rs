//! Oracle (OpenAI-compatible) configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Settings for the chat-completions endpoint the workers call.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// API key; without one the service cannot reach the oracle
    pub openai_api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    /// Point at a compatible gateway instead of api.openai.com
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Completion budget per worker call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Applied only to requests that carry no temperature of their own
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Transport retries; workers themselves never retry
    #[serde(default)]
    pub max_retries: u32,
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn has_api_key(&self) -> bool {
        self.openai_api_key
            .as_ref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_api_key() {
            return Err(ValidationError::MissingRequired("OPENAI_API_KEY"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidBaseUrl(self.base_url.clone()));
        }
        if self.max_tokens == 0 {
            return Err(ValidationError::InvalidMaxTokens);
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidTemperature);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout(),
            max_retries: 0,
        }
    }
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout() -> u64 {
    120
}
