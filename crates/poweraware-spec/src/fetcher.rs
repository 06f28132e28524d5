//! Power spec fetcher backed by node annotations.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use poweraware_core::{Error, Result, SpecFetcherConfig};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::node::{Node, NodeFetcher};
use crate::types::{InternalOp, PowerAlert, PowerSpec};

pub const ANNO_SUFFIX_POWER_ALERT: &str = "power-alert";
pub const ANNO_SUFFIX_POWER_BUDGET: &str = "power-budget";
pub const ANNO_SUFFIX_POWER_INTERNAL_OP: &str = "power-internal-op";
pub const ANNO_SUFFIX_POWER_ALERT_TIME: &str = "power-alert-time";

/// Capability that yields the node's current power spec.
#[async_trait]
pub trait SpecFetcher: Send + Sync {
    async fn get_power_spec(&self, cancel: &CancellationToken) -> Result<PowerSpec>;
}

/// Fully qualified annotation keys for one prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationKeys {
    pub alert: String,
    pub budget: String,
    pub internal_op: String,
    pub alert_time: String,
}

impl AnnotationKeys {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            alert: format!("{prefix}/{ANNO_SUFFIX_POWER_ALERT}"),
            budget: format!("{prefix}/{ANNO_SUFFIX_POWER_BUDGET}"),
            internal_op: format!("{prefix}/{ANNO_SUFFIX_POWER_INTERNAL_OP}"),
            alert_time: format!("{prefix}/{ANNO_SUFFIX_POWER_ALERT_TIME}"),
        }
    }
}

/// Reads the power spec from annotations under a fixed key prefix.
///
/// Holds no mutable state; concurrent calls are independent and each one
/// fetches a fresh node snapshot.
pub struct NodeAnnotationSpecFetcher {
    node_fetcher: Arc<dyn NodeFetcher>,
    prefix: String,
    keys: AnnotationKeys,
}

impl NodeAnnotationSpecFetcher {
    pub fn new(node_fetcher: Arc<dyn NodeFetcher>, config: SpecFetcherConfig) -> Self {
        let keys = AnnotationKeys::with_prefix(&config.annotation_key_prefix);
        Self {
            node_fetcher,
            prefix: config.annotation_key_prefix,
            keys,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn keys(&self) -> &AnnotationKeys {
        &self.keys
    }

    /// Decode a power spec from a node snapshot.
    ///
    /// Fields are checked in order alert, budget, internal op, alert time;
    /// the first bad or absent annotation is returned as the error.
    pub fn parse_node(&self, node: &Node) -> Result<PowerSpec> {
        let alert = parse_alert(&self.keys.alert, node.annotation(&self.keys.alert))?;
        let budget = parse_budget(&self.keys.budget, node.annotation(&self.keys.budget))?;
        let internal_op = parse_internal_op(
            &self.keys.internal_op,
            node.annotation(&self.keys.internal_op),
        )?;
        let alert_time = parse_alert_time(
            &self.keys.alert_time,
            node.annotation(&self.keys.alert_time),
        )?;
        Ok(PowerSpec::new(alert, budget, internal_op, alert_time))
    }
}

#[async_trait]
impl SpecFetcher for NodeAnnotationSpecFetcher {
    async fn get_power_spec(&self, cancel: &CancellationToken) -> Result<PowerSpec> {
        let node = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            res = self.node_fetcher.get_node(cancel) => res.map_err(Error::NodeFetch)?,
        };

        match self.parse_node(&node) {
            Ok(spec) => {
                debug!(
                    node = %node.name,
                    alert = %spec.alert(),
                    budget = spec.budget(),
                    internal_op = %spec.internal_op(),
                    "Fetched power spec"
                );
                Ok(spec)
            }
            Err(e) => {
                debug!(node = %node.name, error = %e, "Rejected power spec annotations");
                Err(e)
            }
        }
    }
}

const MISSING: &str = "annotation not present";

fn parse_alert(key: &str, value: Option<&str>) -> Result<PowerAlert> {
    value
        .and_then(|v| v.parse::<PowerAlert>().ok())
        .ok_or_else(|| Error::InvalidAlert {
            key: key.to_string(),
            value: value.map(str::to_string),
        })
}

fn parse_budget(key: &str, value: Option<&str>) -> Result<u64> {
    let invalid = |reason: String| Error::InvalidBudget {
        key: key.to_string(),
        value: value.map(str::to_string),
        reason,
    };
    let raw = value.ok_or_else(|| invalid(MISSING.to_string()))?;
    raw.parse::<u64>().map_err(|e| invalid(e.to_string()))
}

fn parse_internal_op(key: &str, value: Option<&str>) -> Result<InternalOp> {
    let invalid = |reason: String| Error::InvalidInternalOp {
        key: key.to_string(),
        value: value.map(str::to_string),
        reason,
    };
    let raw = value.ok_or_else(|| invalid(MISSING.to_string()))?;
    raw.parse::<InternalOp>().map_err(|e| invalid(e.to_string()))
}

fn parse_alert_time(key: &str, value: Option<&str>) -> Result<DateTime<Utc>> {
    let invalid = |reason: String| Error::InvalidAlertTime {
        key: key.to_string(),
        value: value.map(str::to_string),
        reason,
    };
    let raw = value.ok_or_else(|| invalid(MISSING.to_string()))?;
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::StaticNodeFetcher;
    use chrono::TimeZone;

    fn fetcher_for(node: Node) -> NodeAnnotationSpecFetcher {
        NodeAnnotationSpecFetcher::new(
            Arc::new(StaticNodeFetcher::new(node)),
            SpecFetcherConfig::new("foo").unwrap(),
        )
    }

    #[test]
    fn test_keys_with_prefix() {
        let keys = AnnotationKeys::with_prefix("power.example.io");
        assert_eq!(keys.alert, "power.example.io/power-alert");
        assert_eq!(keys.budget, "power.example.io/power-budget");
        assert_eq!(keys.internal_op, "power.example.io/power-internal-op");
        assert_eq!(keys.alert_time, "power.example.io/power-alert-time");
    }

    #[test]
    fn test_parse_budget() {
        assert_eq!(parse_budget("k", Some("128")).unwrap(), 128);
        assert_eq!(parse_budget("k", Some("0")).unwrap(), 0);
        assert!(matches!(
            parse_budget("k", Some("-1")),
            Err(Error::InvalidBudget { .. })
        ));
        assert!(matches!(
            parse_budget("k", Some("12.5")),
            Err(Error::InvalidBudget { .. })
        ));
        assert!(matches!(parse_budget("k", None), Err(Error::InvalidBudget { value: None, .. })));
    }

    #[test]
    fn test_parse_alert_time_normalizes_to_utc() {
        let t = parse_alert_time("k", Some("2024-06-02T03:15:58+08:00")).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 6, 1, 19, 15, 58).unwrap());

        let frac = parse_alert_time("k", Some("2024-06-01T19:15:58.250Z")).unwrap();
        assert_eq!(frac.timestamp_subsec_millis(), 250);

        assert!(matches!(
            parse_alert_time("k", Some("2024-06-01 19:15:58")),
            Err(Error::InvalidAlertTime { .. })
        ));
    }

    #[test]
    fn test_parse_node_reports_first_failure() {
        // Both alert and budget are bad; the alert error wins.
        let node = Node::new("n1")
            .with_annotation("foo/power-alert", "S0")
            .with_annotation("foo/power-budget", "lots")
            .with_annotation("foo/power-internal-op", "8")
            .with_annotation("foo/power-alert-time", "2024-06-01T19:15:58Z");
        let err = fetcher_for(node.clone()).parse_node(&node).unwrap_err();
        assert!(matches!(err, Error::InvalidAlert { .. }));
        assert_eq!(err.key(), Some("foo/power-alert"));
        assert_eq!(err.raw_value(), Some("S0"));
    }

    #[tokio::test]
    async fn test_cancelled_before_fetch() {
        let fetcher = fetcher_for(Node::new("n1"));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = fetcher.get_power_spec(&cancel).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
