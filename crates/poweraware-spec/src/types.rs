//! Power spec types decoded from node annotations.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Power alert level, ordered from no alert up to the most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerAlert {
    /// No power constraint.
    Ok,
    P2,
    P1,
    P0,
    /// Emergency: power must be shed immediately.
    S0,
}

impl PowerAlert {
    pub fn all() -> &'static [PowerAlert] {
        &[Self::S0, Self::P0, Self::P1, Self::P2, Self::Ok]
    }

    /// Annotation token for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S0 => "s0",
            Self::P0 => "p0",
            Self::P1 => "p1",
            Self::P2 => "p2",
            Self::Ok => "ok",
        }
    }

    /// Whether an alert is asserted at all.
    pub fn is_alerting(&self) -> bool {
        *self != Self::Ok
    }

    /// Deadline for an advisor to act after the alert time.
    /// `None` when no alert is asserted.
    pub fn response_time_limit(&self) -> Option<Duration> {
        match self {
            Self::S0 => Some(Duration::from_secs(2 * 60)),
            Self::P0 => Some(Duration::from_secs(30 * 60)),
            Self::P1 => Some(Duration::from_secs(60 * 60)),
            Self::P2 => Some(Duration::from_secs(4 * 60 * 60)),
            Self::Ok => None,
        }
    }
}

impl std::fmt::Display for PowerAlert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown alert token. Matching is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPowerAlert(pub String);

impl FromStr for PowerAlert {
    type Err = UnknownPowerAlert;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|alert| alert.as_str() == s)
            .ok_or_else(|| UnknownPowerAlert(s.to_string()))
    }
}

/// Remediation operation requested alongside an alert.
///
/// Wire codes are fixed: 0 auto, 1 throttle, 2 evict, 4 freq-cap, 8 noop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InternalOp {
    /// Let the advisor pick the remediation.
    Auto,
    Throttle,
    Evict,
    FreqCap,
    /// No operation requested.
    Noop,
}

impl InternalOp {
    pub fn all() -> &'static [InternalOp] {
        &[Self::Auto, Self::Throttle, Self::Evict, Self::FreqCap, Self::Noop]
    }

    /// Integer code carried in the annotation.
    pub fn code(&self) -> i64 {
        match self {
            Self::Auto => 0,
            Self::Throttle => 1,
            Self::Evict => 2,
            Self::FreqCap => 4,
            Self::Noop => 8,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::all().iter().copied().find(|op| op.code() == code)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Throttle => "throttle",
            Self::Evict => "evict",
            Self::FreqCap => "freqCap",
            Self::Noop => "noop",
        }
    }
}

impl std::fmt::Display for InternalOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an internal op string was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidInternalOp {
    NotAnInteger(String),
    UnknownCode(i64),
}

impl std::fmt::Display for InvalidInternalOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnInteger(reason) => write!(f, "not an integer: {reason}"),
            Self::UnknownCode(code) => write!(f, "unknown op code {code}"),
        }
    }
}

impl FromStr for InternalOp {
    type Err = InvalidInternalOp;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code: i64 = s
            .parse()
            .map_err(|e: std::num::ParseIntError| InvalidInternalOp::NotAnInteger(e.to_string()))?;
        Self::from_code(code).ok_or(InvalidInternalOp::UnknownCode(code))
    }
}

/// Typed snapshot of a node's power-management intent.
///
/// Built only by the fetcher with all four fields set; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerSpec {
    alert: PowerAlert,
    budget: u64,
    #[serde(rename = "internalOp")]
    internal_op: InternalOp,
    #[serde(rename = "alertTime")]
    alert_time: DateTime<Utc>,
}

impl PowerSpec {
    pub fn new(
        alert: PowerAlert,
        budget: u64,
        internal_op: InternalOp,
        alert_time: DateTime<Utc>,
    ) -> Self {
        Self {
            alert,
            budget,
            internal_op,
            alert_time,
        }
    }

    pub fn alert(&self) -> PowerAlert {
        self.alert
    }

    /// Power budget ceiling in watts.
    pub fn budget(&self) -> u64 {
        self.budget
    }

    pub fn internal_op(&self) -> InternalOp {
        self.internal_op
    }

    pub fn alert_time(&self) -> DateTime<Utc> {
        self.alert_time
    }

    /// Latest instant by which the alert must be handled, if one is asserted.
    pub fn response_deadline(&self) -> Option<DateTime<Utc>> {
        let limit = self.alert.response_time_limit()?;
        let limit = chrono::Duration::from_std(limit).ok()?;
        self.alert_time.checked_add_signed(limit)
    }
}
