//! Fetcher configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration for an annotation-backed power spec fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecFetcherConfig {
    /// Namespace prepended to every power annotation key, e.g. `power.example.io`.
    #[serde(rename = "annotationKeyPrefix")]
    pub annotation_key_prefix: String,
}

impl SpecFetcherConfig {
    /// Create a validated configuration.
    pub fn new(annotation_key_prefix: impl Into<String>) -> Result<Self> {
        let config = Self {
            annotation_key_prefix: annotation_key_prefix.into(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Decode and validate a configuration from JSON.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// The prefix is joined to each key suffix with a single `/`.
    pub fn validate(&self) -> Result<()> {
        let prefix = &self.annotation_key_prefix;
        if prefix.is_empty() {
            return Err(Error::Config("annotation key prefix is empty".into()));
        }
        if prefix.chars().any(char::is_whitespace) {
            return Err(Error::Config(format!(
                "annotation key prefix {prefix:?} contains whitespace"
            )));
        }
        if prefix.ends_with('/') {
            return Err(Error::Config(format!(
                "annotation key prefix {prefix:?} must not end with '/'"
            )));
        }
        Ok(())
    }
}
