//! Error types for the power-aware advisor.

use thiserror::Error;

/// Boxed error returned by external collaborators such as node fetchers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Node fetch error: {0}")]
    NodeFetch(#[source] BoxError),

    #[error("Node fetch cancelled")]
    Cancelled,

    #[error("Invalid power alert at {key}: {}", raw(.value))]
    InvalidAlert { key: String, value: Option<String> },

    #[error("Invalid power budget at {key}: {}: {reason}", raw(.value))]
    InvalidBudget {
        key: String,
        value: Option<String>,
        reason: String,
    },

    #[error("Invalid internal op at {key}: {}: {reason}", raw(.value))]
    InvalidInternalOp {
        key: String,
        value: Option<String>,
        reason: String,
    },

    #[error("Invalid alert time at {key}: {}: {reason}", raw(.value))]
    InvalidAlertTime {
        key: String,
        value: Option<String>,
        reason: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Annotation key the error refers to, if it came from a field parse.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::InvalidAlert { key, .. }
            | Self::InvalidBudget { key, .. }
            | Self::InvalidInternalOp { key, .. }
            | Self::InvalidAlertTime { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Raw annotation value that failed to parse. `None` when the key was absent.
    pub fn raw_value(&self) -> Option<&str> {
        match self {
            Self::InvalidAlert { value, .. }
            | Self::InvalidBudget { value, .. }
            | Self::InvalidInternalOp { value, .. }
            | Self::InvalidAlertTime { value, .. } => value.as_deref(),
            _ => None,
        }
    }
}

fn raw(value: &Option<String>) -> String {
    match value {
        Some(v) => format!("{v:?}"),
        None => "<missing>".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_key_and_value() {
        let err = Error::InvalidAlert {
            key: "foo/power-alert".into(),
            value: Some("s99".into()),
        };
        assert_eq!(err.to_string(), "Invalid power alert at foo/power-alert: \"s99\"");
        assert_eq!(err.key(), Some("foo/power-alert"));
        assert_eq!(err.raw_value(), Some("s99"));
    }

    #[test]
    fn test_display_missing_value() {
        let err = Error::InvalidBudget {
            key: "foo/power-budget".into(),
            value: None,
            reason: "annotation not present".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid power budget at foo/power-budget: <missing>: annotation not present"
        );
        assert_eq!(err.raw_value(), None);
    }

    #[test]
    fn test_node_fetch_keeps_source() {
        let source: BoxError = "connection refused".into();
        let err = Error::NodeFetch(source);
        assert_eq!(err.to_string(), "Node fetch error: connection refused");
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.key(), None);
    }
}
