//! High-level client — `CapitalClient` with nested sub-client accessors.
//!
//! Each domain has its own sub-client in `domain/<name>/client.rs`.
//! This module keeps the builder, the per-mode authenticators, and the
//! helpers every sub-client uses: authenticated requests and the envelope
//! wrapper.

use crate::auth::client::{Auth, Authenticator};
use crate::auth::SessionConfig;
use crate::config::CredentialResolver;
use crate::domain::account::client::Account;
use crate::domain::order::client::Orders;
use crate::domain::position::client::Positions;
use crate::error::SdkError;
use crate::http::{
    CapitalHttp, HttpRequest, HttpResponse, Method, RetryConfig, RetryPolicy, Transport,
    DEFAULT_PING_TIMEOUT, DEFAULT_REQUEST_TIMEOUT,
};
use crate::network::{CST_HEADER, REQUEST_ID_HEADER, SECURITY_TOKEN_HEADER};
use crate::shared::{EventObserver, Mode, OperationEvent, OperationResult, RequestId};

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

// Re-export sub-client types for convenience.
pub use crate::auth::client::Auth as AuthClient;
pub use crate::domain::account::client::Account as AccountClient;
pub use crate::domain::order::client::Orders as OrdersClient;
pub use crate::domain::position::client::Positions as PositionsClient;

/// The primary entry point for the SDK.
///
/// Provides nested sub-client accessors for each domain:
/// `client.orders()`, `client.positions()`, etc.
pub struct CapitalClient {
    pub(crate) http: CapitalHttp,
    pub(crate) resolver: Arc<CredentialResolver>,
    pub(crate) demo_auth: Arc<Authenticator>,
    pub(crate) live_auth: Arc<Authenticator>,
    pub(crate) ping_timeout: Duration,
    pub(crate) observer: Option<EventObserver>,
}

impl CapitalClient {
    pub fn builder() -> CapitalClientBuilder {
        CapitalClientBuilder::default()
    }

    // ── Sub-client accessors ─────────────────────────────────────────────

    pub fn orders(&self) -> Orders<'_> {
        Orders { client: self }
    }

    pub fn positions(&self) -> Positions<'_> {
        Positions { client: self }
    }

    pub fn account(&self) -> Account<'_> {
        Account { client: self }
    }

    pub fn auth(&self) -> Auth<'_> {
        Auth { client: self }
    }

    pub fn resolver(&self) -> &CredentialResolver {
        &self.resolver
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    pub(crate) fn authenticator(&self, mode: Mode) -> &Authenticator {
        match mode {
            Mode::Demo => &self.demo_auth,
            Mode::Live => &self.live_auth,
        }
    }

    /// Send a request carrying the session headers for `mode`.
    pub(crate) async fn send_authenticated(
        &self,
        mode: Mode,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        request_id: &RequestId,
        policy: RetryPolicy,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, SdkError> {
        let session = self.authenticator(mode).ensure_authenticated().await?;

        let mut request = HttpRequest::new(method, format!("{}{}", session.base_url, path))
            .header(SECURITY_TOKEN_HEADER, session.token.as_str())
            .header(CST_HEADER, session.cst.as_str())
            .header(REQUEST_ID_HEADER, request_id.as_str())
            .timeout(timeout.unwrap_or_else(|| self.http.request_timeout()));
        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(self.http.execute(request, policy).await?)
    }

    /// Time `op`, convert its outcome into the envelope, log it and notify
    /// the observer. Every public operation funnels through here.
    pub(crate) async fn run<T, F>(
        &self,
        operation: &'static str,
        mode: Option<Mode>,
        request_id: RequestId,
        op: F,
    ) -> OperationResult<T>
    where
        F: Future<Output = Result<T, SdkError>>,
    {
        let started = Instant::now();
        let outcome = op.await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(data) => OperationResult::ok(data, mode, &request_id, duration_ms),
            Err(e) => OperationResult::failed(&e, mode, &request_id, duration_ms),
        };
        self.record(operation, result)
    }

    /// Log a finished envelope and notify the observer.
    pub(crate) fn record<T>(
        &self,
        operation: &'static str,
        result: OperationResult<T>,
    ) -> OperationResult<T> {
        let mode = result.mode.map(|m| m.as_str());
        if result.success {
            tracing::info!(
                operation,
                request_id = %result.request_id,
                mode,
                duration_ms = result.duration_ms,
                "Operation succeeded"
            );
        } else {
            tracing::error!(
                operation,
                request_id = %result.request_id,
                mode,
                duration_ms = result.duration_ms,
                kind = ?result.error_kind,
                error = result.error.as_deref().unwrap_or_default(),
                "Operation failed"
            );
        }

        if let Some(observer) = &self.observer {
            observer(&OperationEvent::from_result(operation, &result));
        }

        result
    }
}

impl Clone for CapitalClient {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            resolver: self.resolver.clone(),
            demo_auth: self.demo_auth.clone(),
            live_auth: self.live_auth.clone(),
            ping_timeout: self.ping_timeout,
            observer: self.observer.clone(),
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct CapitalClientBuilder {
    resolver: Option<CredentialResolver>,
    transport: Option<Arc<dyn Transport>>,
    retry: RetryConfig,
    request_timeout: Duration,
    ping_timeout: Duration,
    session_config: SessionConfig,
    observer: Option<EventObserver>,
}

impl Default for CapitalClientBuilder {
    fn default() -> Self {
        Self {
            resolver: None,
            transport: None,
            retry: RetryConfig::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            ping_timeout: DEFAULT_PING_TIMEOUT,
            session_config: SessionConfig::default(),
            observer: None,
        }
    }
}

impl CapitalClientBuilder {
    /// Credential source. Defaults to the process environment.
    pub fn resolver(mut self, resolver: CredentialResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// HTTP transport. Defaults to `ReqwestTransport` with the `http` feature.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Per-attempt timeout for broker calls.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn ping_timeout(mut self, timeout: Duration) -> Self {
        self.ping_timeout = timeout;
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Register a callback fired once per completed public operation.
    pub fn on_event(mut self, observer: impl Fn(&OperationEvent) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn build(self) -> Result<CapitalClient, SdkError> {
        let transport = match self.transport {
            Some(t) => t,
            None => default_transport()?,
        };
        let resolver = Arc::new(self.resolver.unwrap_or_else(CredentialResolver::from_env));
        let http = CapitalHttp::new(transport, self.retry, self.request_timeout);

        let authenticator = |mode| {
            Arc::new(Authenticator::new(
                mode,
                resolver.clone(),
                http.clone(),
                self.session_config,
            ))
        };
        let demo_auth = authenticator(Mode::Demo);
        let live_auth = authenticator(Mode::Live);

        Ok(CapitalClient {
            http,
            resolver,
            demo_auth,
            live_auth,
            ping_timeout: self.ping_timeout,
            observer: self.observer,
        })
    }
}

#[cfg(feature = "http")]
fn default_transport() -> Result<Arc<dyn Transport>, SdkError> {
    let transport = crate::http::ReqwestTransport::new()?;
    Ok(Arc::new(transport))
}

#[cfg(not(feature = "http"))]
fn default_transport() -> Result<Arc<dyn Transport>, SdkError> {
    Err(crate::error::ConfigError::MissingTransport.into())
}
