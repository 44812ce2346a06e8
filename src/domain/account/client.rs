//! Account sub-client — account info, ping and health check.

use crate::client::CapitalClient;
use crate::domain::account::{EnvironmentReport, HealthReport, HealthStatus, PingReport};
use crate::error::{ErrorKind, HttpError, SdkError};
use crate::http::{Method, RetryPolicy};
use crate::network::{ACCOUNTS_PATH, PING_PATH};
use crate::shared::{Mode, OperationResult, RequestId};
use chrono::Utc;
use futures_timer::Delay;
use futures_util::future::{join, select, Either};
use std::time::Instant;

pub struct Account<'a> {
    pub(crate) client: &'a CapitalClient,
}

impl<'a> Account<'a> {
    /// Account list and balances for `mode`, as returned by the broker.
    pub async fn info(&self, mode: Mode) -> OperationResult<serde_json::Value> {
        let request_id = RequestId::new("ACCOUNT");
        self.client
            .run("account.info", Some(mode), request_id.clone(), async {
                let resp = self
                    .client
                    .send_authenticated(
                        mode,
                        Method::Get,
                        ACCOUNTS_PATH,
                        None,
                        &request_id,
                        RetryPolicy::Standard,
                        None,
                    )
                    .await?;
                Ok(resp.json()?)
            })
            .await
    }

    /// Authenticated ping. Logs in first when there is no usable session, so
    /// a success proves the whole credential chain for `mode`. Not retried.
    ///
    /// `ping_timeout` bounds the whole call, login included; `latency_ms`
    /// covers the ping round trip only.
    pub async fn ping(&self, mode: Mode) -> OperationResult<PingReport> {
        let request_id = RequestId::new("PING");
        let ping_timeout = self.client.ping_timeout;
        let deadline = Instant::now() + ping_timeout;

        let work = Box::pin(async {
            self.client.authenticator(mode).ensure_authenticated().await?;

            let started = Instant::now();
            let resp = self
                .client
                .send_authenticated(
                    mode,
                    Method::Get,
                    PING_PATH,
                    None,
                    &request_id,
                    RetryPolicy::None,
                    Some(deadline.saturating_duration_since(started)),
                )
                .await?;
            let latency_ms = started.elapsed().as_millis() as u64;
            tracing::debug!(request_id = %request_id, mode = %mode, latency_ms, "Ping ok");
            Ok::<_, SdkError>(PingReport {
                mode,
                latency_ms,
                data: resp.json()?,
            })
        });

        self.client
            .run("account.ping", Some(mode), request_id.clone(), async {
                match select(work, Delay::new(ping_timeout)).await {
                    Either::Left((result, _)) => result,
                    Either::Right(_) => Err(SdkError::from(HttpError::Timeout)),
                }
            })
            .await
    }

    /// Ping both modes concurrently. Succeeds if either mode answers; the
    /// per-mode outcomes are always reported.
    pub async fn health_check(&self) -> OperationResult<HealthReport> {
        let request_id = RequestId::new("HEALTH");
        let started = Instant::now();

        let (demo, live) = join(self.ping(Mode::Demo), self.ping(Mode::Live)).await;

        let resolver = self.client.resolver();
        let environment = EnvironmentReport {
            demo_configured: resolver.is_configured(Mode::Demo),
            live_configured: resolver.is_configured(Mode::Live),
        };
        let status = HealthStatus::from_pings(demo.success, live.success);
        let success = status.is_reachable();

        let (error, error_kind) = if success {
            (None, None)
        } else {
            (
                Some("Neither demo nor live responded to ping".to_string()),
                demo.error_kind.or(live.error_kind).or(Some(ErrorKind::TransientNetwork)),
            )
        };

        let result = OperationResult {
            success,
            data: Some(HealthReport {
                status,
                demo,
                live,
                environment,
            }),
            error,
            error_kind,
            mode: None,
            duration_ms: started.elapsed().as_millis() as u64,
            request_id: request_id.to_string(),
            timestamp: Utc::now(),
        };
        self.client.record("account.health_check", result)
    }
}
