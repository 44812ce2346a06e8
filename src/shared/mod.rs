//! Shared newtypes and utilities used across all domain modules.
//!
//! These types are serialization-transparent: they serialize/deserialize identically
//! to the raw format the broker sends, so they can be used directly in wire types
//! without conversion overhead.

pub mod envelope;

pub use envelope::{EventObserver, OperationEvent, OperationResult};

use crate::error::{ConfigError, ValidationError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ─── Mode ────────────────────────────────────────────────────────────────────

/// Trading environment: paper (`demo`) or real funds (`live`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Demo,
    Live,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Demo, Mode::Live];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Demo => "demo",
            Mode::Live => "live",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Mode::Demo => crate::network::DEMO_API_URL,
            Mode::Live => crate::network::LIVE_API_URL,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "demo" => Ok(Mode::Demo),
            "live" => Ok(Mode::Live),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }
}

// ─── Direction ───────────────────────────────────────────────────────────────

/// Deal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Case-insensitive: `"buy"`, `"Buy"` and `"BUY"` all parse.
impl FromStr for Direction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Direction::Buy),
            "SELL" => Ok(Direction::Sell),
            _ => Err(ValidationError::InvalidDirection(s.to_string())),
        }
    }
}

// ─── RequestId ───────────────────────────────────────────────────────────────

/// Correlation id attached to outbound requests as `X-Request-ID`.
///
/// Format: `{PREFIX}-{uuid-v4-simple}`, e.g. `ORDER-3f2a...`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(prefix: &str) -> Self {
        Self(format!("{}-{}", prefix, uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<RequestId> for String {
    fn from(id: RequestId) -> Self {
        id.0
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Round to two decimal places (money and percent figures in reports).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Instrument codes: letters, digits, `.`, `_`, `-`.
pub fn is_valid_epic(epic: &str) -> bool {
    !epic.is_empty()
        && epic
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}
