//! Position domain — open positions, updates, bulk close reports, summaries.
//!
//! Positions are never cached: every operation that needs them lists the
//! live set first. Bulk operations therefore act on a snapshot, and a position
//! closed elsewhere between list and close shows up as a per-position failure
//! in the report rather than being hidden.

pub mod client;
mod convert;
pub mod wire;

use crate::error::ValidationError;
use crate::shared::{round2, Direction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use wire::{PositionsResponse, UpdatePositionBody};

// ─── Position ────────────────────────────────────────────────────────────────

/// An open position, decoded from the broker's `{position, market}` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub deal_id: String,
    pub epic: String,
    pub instrument_name: Option<String>,
    pub direction: Direction,
    pub size: f64,
    pub open_level: f64,
    pub current_level: f64,
    pub profit: f64,
    pub stop_level: Option<f64>,
    pub profit_level: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
    pub currency: String,
}

impl Position {
    /// `profit / (open_level * size) * 100`; a zero or non-finite
    /// denominator yields 0.
    pub fn percent_change(&self) -> f64 {
        let notional = self.open_level * self.size;
        if notional == 0.0 || !notional.is_finite() {
            return 0.0;
        }
        let pct = self.profit / notional * 100.0;
        if pct.is_finite() {
            pct
        } else {
            0.0
        }
    }
}

// ─── PositionUpdate ──────────────────────────────────────────────────────────

/// Fields to modify on an open position. Unset fields are left untouched
/// on the broker side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_stop: Option<f64>,
}

impl PositionUpdate {
    pub fn stop_level(mut self, level: f64) -> Self {
        self.stop_level = Some(level);
        self
    }

    pub fn profit_level(mut self, level: f64) -> Self {
        self.profit_level = Some(level);
        self
    }

    pub fn trailing_stop(mut self, distance: f64) -> Self {
        self.trailing_stop = Some(distance);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("stopLevel", self.stop_level),
            ("profitLevel", self.profit_level),
            ("trailingStop", self.trailing_stop),
        ];
        if fields.iter().all(|(_, v)| v.is_none()) {
            return Err(ValidationError::EmptyUpdate);
        }
        for (field, value) in fields {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(ValidationError::NonFiniteOption { field, value: v });
                }
            }
        }
        Ok(())
    }

    pub fn to_body(&self) -> UpdatePositionBody {
        UpdatePositionBody {
            stop_level: self.stop_level,
            profit_level: self.profit_level,
            trailing_stop: self.trailing_stop,
        }
    }
}

// ─── Validation helpers ──────────────────────────────────────────────────────

pub(crate) fn validate_deal_id(deal_id: &str) -> Result<&str, ValidationError> {
    let trimmed = deal_id.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyDealId);
    }
    Ok(trimmed)
}

pub(crate) fn validate_close_size(size: Option<f64>) -> Result<(), ValidationError> {
    match size {
        Some(s) if !s.is_finite() || s <= 0.0 => Err(ValidationError::InvalidSize(s)),
        _ => Ok(()),
    }
}

// ─── Bulk close ──────────────────────────────────────────────────────────────

/// Which positions a sweep closes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CloseFilter {
    All,
    /// Percent change at or below the (negative) threshold.
    LosingAtMost(f64),
    /// Percent change at or above the (non-negative) threshold.
    ProfitAtLeast(f64),
}

impl CloseFilter {
    pub fn losing(max_loss_percent: f64) -> Result<Self, ValidationError> {
        if !max_loss_percent.is_finite() || max_loss_percent >= 0.0 {
            return Err(ValidationError::InvalidThreshold {
                value: max_loss_percent,
                expected: "maxLossPercent must be a negative number (e.g. -2)",
            });
        }
        Ok(CloseFilter::LosingAtMost(max_loss_percent))
    }

    pub fn profit(min_profit_percent: f64) -> Result<Self, ValidationError> {
        if !min_profit_percent.is_finite() || min_profit_percent < 0.0 {
            return Err(ValidationError::InvalidThreshold {
                value: min_profit_percent,
                expected: "minProfitPercent must be zero or positive (e.g. 3)",
            });
        }
        Ok(CloseFilter::ProfitAtLeast(min_profit_percent))
    }

    pub fn matches(&self, position: &Position) -> bool {
        match *self {
            CloseFilter::All => true,
            CloseFilter::LosingAtMost(t) => position.percent_change() <= t,
            CloseFilter::ProfitAtLeast(t) => position.percent_change() >= t,
        }
    }

    pub fn threshold(&self) -> Option<f64> {
        match *self {
            CloseFilter::All => None,
            CloseFilter::LosingAtMost(t) | CloseFilter::ProfitAtLeast(t) => Some(t),
        }
    }

    /// Positions selected by this filter, in list order.
    pub fn select<'p>(&self, positions: &'p [Position]) -> Vec<&'p Position> {
        positions.iter().filter(|p| self.matches(p)).collect()
    }
}

/// A position the sweep tried and failed to close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedClose {
    pub deal_id: String,
    pub error: String,
}

/// Outcome of a best-effort bulk close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCloseReport {
    /// Positions closed successfully.
    pub closed: usize,
    /// Positions selected for closing.
    pub total: usize,
    /// Positions in the listed snapshot.
    pub analyzed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    pub failed: Vec<FailedClose>,
    pub message: String,
}

impl BulkCloseReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

// ─── Summary ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionDetail {
    pub deal_id: String,
    pub epic: String,
    pub direction: Direction,
    pub size: f64,
    pub profit: f64,
    pub profit_percent: f64,
}

/// Aggregate P/L over the open positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSummary {
    pub total: usize,
    pub winning: usize,
    pub losing: usize,
    pub neutral: usize,
    pub total_profit: f64,
    pub average_profit: f64,
    pub details: Vec<PositionDetail>,
}

impl PositionSummary {
    pub fn from_positions(positions: &[Position]) -> Self {
        if positions.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total: positions.len(),
            ..Self::default()
        };
        let mut total_profit = 0.0;

        for p in positions {
            total_profit += p.profit;
            if p.profit > 0.0 {
                summary.winning += 1;
            } else if p.profit < 0.0 {
                summary.losing += 1;
            }
            summary.details.push(PositionDetail {
                deal_id: p.deal_id.clone(),
                epic: p.epic.clone(),
                direction: p.direction,
                size: p.size,
                profit: round2(p.profit),
                profit_percent: round2(p.percent_change()),
            });
        }

        summary.neutral = summary.total - summary.winning - summary.losing;
        summary.total_profit = round2(total_profit);
        summary.average_profit = round2(total_profit / positions.len() as f64);
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn position(deal_id: &str, open_level: f64, size: f64, profit: f64) -> Position {
        Position {
            deal_id: deal_id.to_string(),
            epic: "US500".to_string(),
            instrument_name: None,
            direction: Direction::Buy,
            size,
            open_level,
            current_level: open_level,
            profit,
            stop_level: None,
            profit_level: None,
            created_at: None,
            currency: "USD".to_string(),
        }
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(position("a", 100.0, 2.0, -10.0).percent_change(), -5.0);
        assert_eq!(position("b", 50.0, 1.0, 1.5).percent_change(), 3.0);
    }

    #[test]
    fn test_percent_change_zero_denominator() {
        assert_eq!(position("a", 0.0, 2.0, -10.0).percent_change(), 0.0);
        assert_eq!(position("b", 100.0, 0.0, 5.0).percent_change(), 0.0);
    }

    #[test]
    fn test_losing_filter_selects_at_or_below_threshold() {
        // percent changes: -5, -1, -3, 2, -2
        let positions = vec![
            position("p0", 100.0, 1.0, -5.0),
            position("p1", 100.0, 1.0, -1.0),
            position("p2", 100.0, 1.0, -3.0),
            position("p3", 100.0, 1.0, 2.0),
            position("p4", 100.0, 1.0, -2.0),
        ];
        let filter = CloseFilter::losing(-2.0).unwrap();
        let ids: Vec<_> = filter.select(&positions).iter().map(|p| p.deal_id.as_str()).collect();
        assert_eq!(ids, vec!["p0", "p2", "p4"]);
    }

    #[test]
    fn test_profit_filter_selects_at_or_above_threshold() {
        let positions = vec![
            position("p0", 100.0, 1.0, 5.0),
            position("p1", 100.0, 1.0, 2.9),
            position("p2", 100.0, 1.0, 3.0),
        ];
        let filter = CloseFilter::profit(3.0).unwrap();
        let ids: Vec<_> = filter.select(&positions).iter().map(|p| p.deal_id.as_str()).collect();
        assert_eq!(ids, vec!["p0", "p2"]);
    }

    #[test]
    fn test_threshold_sign_validation() {
        assert!(CloseFilter::losing(0.0).is_err());
        assert!(CloseFilter::losing(2.0).is_err());
        assert!(CloseFilter::losing(f64::NAN).is_err());
        assert!(CloseFilter::profit(-0.5).is_err());
        assert!(CloseFilter::profit(f64::INFINITY).is_err());
        assert!(CloseFilter::profit(0.0).is_ok());
        assert_eq!(CloseFilter::All.threshold(), None);
    }

    #[test]
    fn test_update_validation() {
        assert_eq!(
            PositionUpdate::default().validate(),
            Err(ValidationError::EmptyUpdate)
        );
        assert!(PositionUpdate::default().stop_level(1.0).validate().is_ok());
        assert!(matches!(
            PositionUpdate::default().trailing_stop(f64::NAN).validate(),
            Err(ValidationError::NonFiniteOption {
                field: "trailingStop",
                ..
            })
        ));
    }

    #[test]
    fn test_update_body_only_sets_supplied_fields() {
        let body = PositionUpdate::default().profit_level(1.2).to_body();
        let json = serde_json::to_value(body).unwrap();
        assert_eq!(json, serde_json::json!({ "profitLevel": 1.2 }));
    }

    #[test]
    fn test_deal_id_and_size_validation() {
        assert_eq!(validate_deal_id("  "), Err(ValidationError::EmptyDealId));
        assert_eq!(validate_deal_id(" DIAAAA1 "), Ok("DIAAAA1"));
        assert!(validate_close_size(None).is_ok());
        assert!(validate_close_size(Some(0.5)).is_ok());
        assert!(validate_close_size(Some(0.0)).is_err());
        assert!(validate_close_size(Some(f64::NAN)).is_err());
    }

    #[test]
    fn test_summary_empty() {
        let summary = PositionSummary::from_positions(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.winning, 0);
        assert_eq!(summary.losing, 0);
        assert_eq!(summary.total_profit, 0.0);
        assert_eq!(summary.average_profit, 0.0);
    }

    #[test]
    fn test_summary_counts_and_rounding() {
        let positions = vec![
            position("p0", 100.0, 1.0, 10.456),
            position("p1", 100.0, 2.0, -4.0),
            position("p2", 100.0, 1.0, 0.0),
        ];
        let summary = PositionSummary::from_positions(&positions);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.winning, 1);
        assert_eq!(summary.losing, 1);
        assert_eq!(summary.neutral, 1);
        assert_eq!(summary.total_profit, 6.46);
        assert_eq!(summary.average_profit, 2.15);
        assert_eq!(summary.details[0].profit, 10.46);
        assert_eq!(summary.details[1].profit_percent, -2.0);
    }

    #[test]
    fn test_bulk_close_envelope_round_trip() {
        let report = BulkCloseReport {
            closed: 1,
            total: 2,
            analyzed: 4,
            threshold: Some(-2.0),
            failed: vec![FailedClose {
                deal_id: "P2".to_string(),
                error: "HTTP error: Not found: ".to_string(),
            }],
            message: "Closed 1 of 2 positions".to_string(),
        };
        let envelope = crate::shared::OperationResult::ok(
            report.clone(),
            Some(crate::shared::Mode::Demo),
            &crate::shared::RequestId::new("CLOSELOSS"),
            7,
        );

        let json = serde_json::to_string(&envelope).unwrap();
        let decoded: crate::shared::OperationResult<BulkCloseReport> =
            serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.data, Some(report));

        let without_data = r#"{"success":false,"error":"boom","durationMs":1,"requestId":"X-1","timestamp":"2024-01-15T10:30:00Z"}"#;
        let decoded: crate::shared::OperationResult<BulkCloseReport> =
            serde_json::from_str(without_data).unwrap();
        assert!(decoded.data.is_none());
        assert!(!decoded.success);
    }
}
