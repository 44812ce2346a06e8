//! Wire types for position requests and responses (REST).

use crate::shared::Direction;
use serde::{Deserialize, Serialize};

/// `GET /api/v1/positions` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionsResponse {
    #[serde(default)]
    pub positions: Vec<PositionEntry>,
}

/// One open position: the deal plus a market snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionEntry {
    pub position: PositionData,
    pub market: MarketData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionData {
    pub deal_id: String,
    #[serde(default)]
    pub deal_reference: Option<String>,
    pub direction: Direction,
    pub size: f64,
    pub level: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub upl: Option<f64>,
    #[serde(default)]
    pub stop_level: Option<f64>,
    #[serde(default)]
    pub profit_level: Option<f64>,
    #[serde(default)]
    pub guaranteed_stop: Option<bool>,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default, rename = "createdDateUTC")]
    pub created_date_utc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    pub epic: String,
    #[serde(default)]
    pub instrument_name: Option<String>,
    #[serde(default)]
    pub bid: Option<f64>,
    #[serde(default)]
    pub offer: Option<f64>,
}

/// Body of `PUT /api/v1/positions/{dealId}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePositionBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_stop: Option<f64>,
}

/// Body of `DELETE /api/v1/positions/{dealId}` for a partial close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialCloseBody {
    pub size: f64,
}
