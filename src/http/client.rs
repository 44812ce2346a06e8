//! Low-level HTTP client — `CapitalHttp`.
//!
//! Wraps a [`Transport`] with per-attempt timeouts, status mapping and the
//! retry loop. Knows nothing about sessions; the auth layer adds headers.

use crate::error::HttpError;
use crate::http::retry::{RetryConfig, RetryPolicy};
use crate::http::transport::{HttpRequest, HttpResponse, Transport};

use futures_util::future::{select, Either};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(10);

/// Low-level HTTP client for the Capital.com REST API.
pub struct CapitalHttp {
    transport: Arc<dyn Transport>,
    retry: RetryConfig,
    request_timeout: Duration,
}

impl CapitalHttp {
    pub fn new(transport: Arc<dyn Transport>, retry: RetryConfig, request_timeout: Duration) -> Self {
        Self {
            transport,
            retry,
            request_timeout,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Send `request`, retrying per `policy`. Returns only 2xx responses.
    pub async fn execute(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse, HttpError> {
        let config = match &policy {
            RetryPolicy::None => {
                return self.do_request(request).await;
            }
            RetryPolicy::Standard => self.retry.clone(),
            RetryPolicy::Custom(c) => c.clone(),
        };

        let mut last_error = None;

        for attempt in 0..=config.max_retries {
            match self.do_request(request.clone()).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if e.is_transient() && attempt < config.max_retries {
                        let delay = retry_delay(&config, attempt, &e);
                        tracing::warn!(
                            attempt = attempt + 1,
                            max = config.max_retries,
                            delay_ms = delay.as_millis() as u64,
                            status = e.status(),
                            error = %e,
                            "Retrying {} {}",
                            request.method,
                            request.url
                        );
                        futures_timer::Delay::new(delay).await;
                        last_error = Some(e);
                    } else if last_error.is_some() && e.is_transient() {
                        last_error = Some(e);
                        break;
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        Err(HttpError::MaxRetriesExceeded {
            attempts: config.max_retries + 1,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    /// A single attempt: timeout around the transport, then status mapping.
    async fn do_request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let started = Instant::now();
        let method = request.method;
        let url = request.url.clone();
        let timeout = request.timeout;

        let send = self.transport.send(request);
        let deadline = futures_timer::Delay::new(timeout);

        let result = match select(send, deadline).await {
            Either::Left((result, _)) => result,
            Either::Right(_) => Err(HttpError::Timeout),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;

        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                tracing::debug!(duration_ms = elapsed_ms, error = %e, "{} {} failed", method, url);
                return Err(e);
            }
        };

        tracing::debug!(
            status = resp.status,
            duration_ms = elapsed_ms,
            "{} {}",
            method,
            url
        );

        if resp.is_success() {
            return Ok(resp);
        }

        Err(error_for_status(resp))
    }
}

impl Clone for CapitalHttp {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            retry: self.retry.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

/// Backoff before the next attempt. A `Retry-After` hint raises the wait
/// but never past `max_delay`.
fn retry_delay(config: &RetryConfig, attempt: u32, error: &HttpError) -> Duration {
    let delay = config.delay_for_attempt(attempt);
    match error {
        HttpError::RateLimited {
            retry_after_ms: Some(ms),
        } => delay.max(Duration::from_millis(*ms).min(config.max_delay)),
        _ => delay,
    }
}

fn error_for_status(resp: HttpResponse) -> HttpError {
    match resp.status {
        401 | 403 => HttpError::Unauthorized(resp.status),
        404 => HttpError::NotFound(resp.body),
        429 => HttpError::RateLimited {
            retry_after_ms: resp
                .header("retry-after")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(|secs| secs.saturating_mul(1000)),
        },
        status @ 500..=599 => HttpError::ServerError {
            status,
            body: resp.body,
        },
        status => HttpError::BadRequest {
            status,
            body: resp.body,
        },
    }
}
