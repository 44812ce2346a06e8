//! Order domain — validated market orders.

pub mod client;
pub mod wire;

use crate::error::ValidationError;
use crate::shared::{is_valid_epic, Direction};
use serde::{Deserialize, Serialize};

pub use wire::CreatePositionBody;

// ─── OrderOptions ────────────────────────────────────────────────────────────

/// Optional protective levels for a new position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guaranteed_stop: Option<bool>,
}

impl OrderOptions {
    pub fn stop_level(mut self, level: f64) -> Self {
        self.stop_level = Some(level);
        self
    }

    pub fn profit_level(mut self, level: f64) -> Self {
        self.profit_level = Some(level);
        self
    }

    pub fn stop_distance(mut self, distance: f64) -> Self {
        self.stop_distance = Some(distance);
        self
    }

    pub fn profit_distance(mut self, distance: f64) -> Self {
        self.profit_distance = Some(distance);
        self
    }

    pub fn guaranteed_stop(mut self, guaranteed: bool) -> Self {
        self.guaranteed_stop = Some(guaranteed);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let numeric = [
            ("stopLevel", self.stop_level),
            ("profitLevel", self.profit_level),
            ("stopDistance", self.stop_distance),
            ("profitDistance", self.profit_distance),
        ];
        for (field, value) in numeric {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(ValidationError::NonFiniteOption { field, value: v });
                }
            }
        }
        Ok(())
    }
}

// ─── OrderRequest ────────────────────────────────────────────────────────────

/// A market order that has passed validation. Only constructible through
/// [`OrderRequest::new`] / [`OrderRequest::from_parts`].
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    direction: Direction,
    epic: String,
    size: f64,
    options: OrderOptions,
}

impl OrderRequest {
    /// Validate raw caller input. `direction` is case-insensitive.
    pub fn new(
        direction: &str,
        epic: &str,
        size: f64,
        options: OrderOptions,
    ) -> Result<Self, ValidationError> {
        let direction: Direction = direction.parse()?;
        Self::from_parts(direction, epic, size, options)
    }

    pub fn from_parts(
        direction: Direction,
        epic: &str,
        size: f64,
        options: OrderOptions,
    ) -> Result<Self, ValidationError> {
        let epic = epic.trim();
        if !is_valid_epic(epic) {
            return Err(ValidationError::InvalidEpic(epic.to_string()));
        }
        if !size.is_finite() || size <= 0.0 {
            return Err(ValidationError::InvalidSize(size));
        }
        options.validate()?;

        Ok(Self {
            direction,
            epic: epic.to_string(),
            size,
            options,
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn epic(&self) -> &str {
        &self.epic
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn options(&self) -> &OrderOptions {
        &self.options
    }

    /// Broker request body: optional fields only when supplied.
    pub fn to_body(&self) -> CreatePositionBody {
        CreatePositionBody {
            direction: self.direction,
            epic: self.epic.clone(),
            size: self.size,
            guaranteed_stop: self.options.guaranteed_stop.unwrap_or(false),
            stop_level: self.options.stop_level,
            profit_level: self.options.profit_level,
            stop_distance: self.options.stop_distance,
            profit_distance: self.options.profit_distance,
        }
    }
}
