//! Wire types for order submission.

use crate::shared::Direction;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/positions/otc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePositionBody {
    pub direction: Direction,
    pub epic: String,
    pub size: f64,
    pub guaranteed_stop: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_distance: Option<f64>,
}
