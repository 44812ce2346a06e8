//! Positions sub-client — list, close, update, bulk sweeps and summaries.

use crate::client::CapitalClient;
use crate::domain::position::wire::{PartialCloseBody, PositionsResponse};
use crate::domain::position::{
    validate_close_size, validate_deal_id, BulkCloseReport, CloseFilter, FailedClose, Position,
    PositionSummary, PositionUpdate,
};
use crate::error::SdkError;
use crate::http::{Method, RetryPolicy};
use crate::network::POSITIONS_PATH;
use crate::shared::{Mode, OperationResult, RequestId};
use futures_util::future::join_all;

pub struct Positions<'a> {
    pub(crate) client: &'a CapitalClient,
}

impl<'a> Positions<'a> {
    // ── Single-position operations ───────────────────────────────────────

    /// All open positions for `mode`. An account with nothing open yields
    /// an empty list.
    pub async fn list(&self, mode: Mode) -> OperationResult<Vec<Position>> {
        let request_id = RequestId::new("POS");
        self.client
            .run(
                "positions.list",
                Some(mode),
                request_id.clone(),
                self.fetch(mode, &request_id),
            )
            .await
    }

    /// Close a position. `size` closes part of it; `None` closes it fully.
    pub async fn close(
        &self,
        deal_id: &str,
        mode: Mode,
        size: Option<f64>,
    ) -> OperationResult<serde_json::Value> {
        let request_id = RequestId::new("CLOSE");
        self.client
            .run("positions.close", Some(mode), request_id.clone(), async {
                let deal_id = validate_deal_id(deal_id)?;
                validate_close_size(size)?;
                self.close_one(deal_id, mode, size, &request_id).await
            })
            .await
    }

    /// Modify stop / take-profit / trailing stop on an open position.
    pub async fn update(
        &self,
        deal_id: &str,
        update: PositionUpdate,
        mode: Mode,
    ) -> OperationResult<serde_json::Value> {
        let request_id = RequestId::new("UPDATE");
        self.client
            .run("positions.update", Some(mode), request_id.clone(), async {
                let deal_id = validate_deal_id(deal_id)?;
                update.validate()?;

                tracing::info!(
                    request_id = %request_id,
                    mode = %mode,
                    deal_id,
                    "Updating position"
                );

                let body = serde_json::to_value(update.to_body())?;
                let resp = self
                    .client
                    .send_authenticated(
                        mode,
                        Method::Put,
                        &deal_path(deal_id),
                        Some(body),
                        &request_id,
                        RetryPolicy::Standard,
                        None,
                    )
                    .await?;
                Ok(resp.json()?)
            })
            .await
    }

    // ── Bulk sweeps ──────────────────────────────────────────────────────

    /// Close every open position.
    pub async fn close_all(&self, mode: Mode) -> OperationResult<BulkCloseReport> {
        let request_id = RequestId::new("CLOSEALL");
        self.client
            .run(
                "positions.close_all",
                Some(mode),
                request_id.clone(),
                self.sweep(CloseFilter::All, mode, &request_id),
            )
            .await
    }

    /// Close positions whose percent change is at or below
    /// `max_loss_percent` (which must be negative).
    pub async fn close_losing(
        &self,
        max_loss_percent: f64,
        mode: Mode,
    ) -> OperationResult<BulkCloseReport> {
        let request_id = RequestId::new("CLOSELOSS");
        self.client
            .run("positions.close_losing", Some(mode), request_id.clone(), async {
                let filter = CloseFilter::losing(max_loss_percent)?;
                self.sweep(filter, mode, &request_id).await
            })
            .await
    }

    /// Close positions whose percent change is at or above
    /// `min_profit_percent` (which must be zero or positive).
    pub async fn take_profits(
        &self,
        min_profit_percent: f64,
        mode: Mode,
    ) -> OperationResult<BulkCloseReport> {
        let request_id = RequestId::new("TAKEPROFIT");
        self.client
            .run("positions.take_profits", Some(mode), request_id.clone(), async {
                let filter = CloseFilter::profit(min_profit_percent)?;
                self.sweep(filter, mode, &request_id).await
            })
            .await
    }

    /// Aggregate P/L over the open positions.
    pub async fn summary(&self, mode: Mode) -> OperationResult<PositionSummary> {
        let request_id = RequestId::new("SUMMARY");
        self.client
            .run("positions.summary", Some(mode), request_id.clone(), async {
                let positions = self.fetch(mode, &request_id).await?;
                Ok(PositionSummary::from_positions(&positions))
            })
            .await
    }

    // ── Internals ────────────────────────────────────────────────────────

    async fn fetch(&self, mode: Mode, request_id: &RequestId) -> Result<Vec<Position>, SdkError> {
        let resp = self
            .client
            .send_authenticated(
                mode,
                Method::Get,
                POSITIONS_PATH,
                None,
                request_id,
                RetryPolicy::Standard,
                None,
            )
            .await?;
        let body: PositionsResponse = resp.json()?;
        Ok(body.positions.into_iter().map(Position::from).collect())
    }

    async fn close_one(
        &self,
        deal_id: &str,
        mode: Mode,
        size: Option<f64>,
        request_id: &RequestId,
    ) -> Result<serde_json::Value, SdkError> {
        tracing::info!(
            request_id = %request_id,
            mode = %mode,
            deal_id,
            size,
            "Closing position"
        );

        let body = match size {
            Some(size) => Some(serde_json::to_value(PartialCloseBody { size })?),
            None => None,
        };
        let resp = self
            .client
            .send_authenticated(
                mode,
                Method::Delete,
                &deal_path(deal_id),
                body,
                request_id,
                RetryPolicy::Standard,
                None,
            )
            .await?;
        Ok(resp.json()?)
    }

    /// List, select, then close the selection concurrently. Individual close
    /// failures are collected into the report; only a failed listing fails
    /// the sweep as a whole.
    async fn sweep(
        &self,
        filter: CloseFilter,
        mode: Mode,
        request_id: &RequestId,
    ) -> Result<BulkCloseReport, SdkError> {
        let positions = self.fetch(mode, request_id).await?;
        let selected = filter.select(&positions);
        let analyzed = positions.len();
        let total = selected.len();

        if total == 0 {
            return Ok(BulkCloseReport {
                closed: 0,
                total: 0,
                analyzed,
                threshold: filter.threshold(),
                failed: Vec::new(),
                message: no_match_message(filter, analyzed),
            });
        }

        let outcomes = join_all(selected.iter().copied().map(|p| async move {
            let close_id = RequestId::new("CLOSE");
            tracing::debug!(
                sweep_id = %request_id,
                request_id = %close_id,
                deal_id = p.deal_id.as_str(),
                "Sweep closing position"
            );
            let outcome = self.close_one(&p.deal_id, mode, None, &close_id).await;
            (p.deal_id.as_str(), close_id, outcome)
        }))
        .await;

        let mut failed = Vec::new();
        for (deal_id, close_id, outcome) in outcomes {
            if let Err(e) = outcome {
                tracing::warn!(
                    sweep_id = %request_id,
                    request_id = %close_id,
                    mode = %mode,
                    deal_id,
                    error = %e,
                    "Failed to close position"
                );
                failed.push(FailedClose {
                    deal_id: deal_id.to_string(),
                    error: e.to_string(),
                });
            }
        }

        let closed = total - failed.len();
        Ok(BulkCloseReport {
            closed,
            total,
            analyzed,
            threshold: filter.threshold(),
            message: format!("Closed {closed} of {total} positions"),
            failed,
        })
    }
}

fn deal_path(deal_id: &str) -> String {
    format!("{}/{}", POSITIONS_PATH, urlencoding::encode(deal_id))
}

fn no_match_message(filter: CloseFilter, analyzed: usize) -> String {
    match filter {
        CloseFilter::All => "No open positions to close".to_string(),
        CloseFilter::LosingAtMost(t) => {
            format!("No positions with loss at or below {t}% ({analyzed} analyzed)")
        }
        CloseFilter::ProfitAtLeast(t) => {
            format!("No positions with profit at or above {t}% ({analyzed} analyzed)")
        }
    }
}
