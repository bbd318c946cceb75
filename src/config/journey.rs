//! Journey behaviour settings
//!
//! Thresholds (pass scores, milestone and bullet counts) are fixed in the
//! domain and deliberately absent here.

use serde::Deserialize;

use super::error::ValidationError;
use crate::application::workers::DEFAULT_SKIP_TOKEN;

#[derive(Debug, Clone, Deserialize)]
pub struct JourneyConfig {
    /// Literal answer that skips an optional onboarding question
    #[serde(default = "default_skip_token")]
    pub skip_token: String,

    /// Enrich proposals with the built-in knowledge base
    #[serde(default)]
    pub retrieval_enabled: bool,

    /// Passages appended to each proposal prompt
    #[serde(default = "default_retrieval_top_k")]
    pub retrieval_top_k: usize,
}

impl JourneyConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.skip_token.trim().is_empty() {
            return Err(ValidationError::BlankSkipToken);
        }
        Ok(())
    }
}

impl Default for JourneyConfig {
    fn default() -> Self {
        Self {
            skip_token: default_skip_token(),
            retrieval_enabled: false,
            retrieval_top_k: default_retrieval_top_k(),
        }
    }
}

fn default_skip_token() -> String {
    DEFAULT_SKIP_TOKEN.to_string()
}

fn default_retrieval_top_k() -> usize {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = JourneyConfig::default();
        assert_eq!(config.skip_token, "skip");
        assert!(!config.retrieval_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn blank_skip_token_is_rejected() {
        let config = JourneyConfig {
            skip_token: " ".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::BlankSkipToken));
    }
}
