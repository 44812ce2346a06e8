//! Account domain — account info, connectivity ping and the two-mode health
//! report.

pub mod client;

use crate::shared::{Mode, OperationResult};
use serde::{Deserialize, Serialize};

/// Result of an authenticated round trip to the broker's ping endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingReport {
    pub mode: Mode,
    pub latency_ms: u64,
    /// Broker payload, passed through.
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Both modes answered.
    Healthy,
    /// Exactly one mode answered.
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn from_pings(demo_ok: bool, live_ok: bool) -> Self {
        match (demo_ok, live_ok) {
            (true, true) => HealthStatus::Healthy,
            (false, false) => HealthStatus::Unhealthy,
            _ => HealthStatus::Degraded,
        }
    }

    pub fn is_reachable(&self) -> bool {
        !matches!(self, HealthStatus::Unhealthy)
    }
}

/// Which modes have an API key configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentReport {
    pub demo_configured: bool,
    pub live_configured: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    pub demo: OperationResult<PingReport>,
    pub live: OperationResult<PingReport>,
    pub environment: EnvironmentReport,
}
