//! Per-mode session authenticator and the `Auth` sub-client.

use async_lock::Mutex;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::auth::{LoginRequest, Session, SessionConfig, SessionInfo, SessionState};
use crate::client::CapitalClient;
use crate::config::CredentialResolver;
use crate::error::{AuthError, SdkError};
use crate::http::{CapitalHttp, HttpRequest, Method, RetryPolicy};
use crate::network::{API_KEY_HEADER, CST_HEADER, REQUEST_ID_HEADER, SECURITY_TOKEN_HEADER, SESSION_PATH};
use crate::shared::{Mode, OperationResult, RequestId};

/// Owns the session for one mode.
///
/// The session mutex is held across the network login, so concurrent callers
/// that find the session stale queue behind the single in-flight login and
/// reuse its result instead of starting their own.
pub struct Authenticator {
    mode: Mode,
    resolver: Arc<CredentialResolver>,
    http: CapitalHttp,
    config: SessionConfig,
    session: Mutex<Option<Session>>,
    refreshing: AtomicBool,
    logins: AtomicU64,
}

/// Clears the `refreshing` flag even if the login future is dropped.
struct RefreshFlag<'a>(&'a AtomicBool);

impl<'a> RefreshFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for RefreshFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Authenticator {
    pub fn new(
        mode: Mode,
        resolver: Arc<CredentialResolver>,
        http: CapitalHttp,
        config: SessionConfig,
    ) -> Self {
        Self {
            mode,
            resolver,
            http,
            config,
            session: Mutex::new(None),
            refreshing: AtomicBool::new(false),
            logins: AtomicU64::new(0),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Return the current session, logging in first if there is none or it
    /// is inside the refresh margin.
    pub async fn ensure_authenticated(&self) -> Result<Session, SdkError> {
        let mut guard = self.session.lock().await;

        if let Some(session) = guard.as_ref() {
            if session.is_valid(self.config.refresh_margin) {
                return Ok(session.clone());
            }
            tracing::info!(
                mode = %self.mode,
                expires_at = %session.expires_at(),
                "Session expired, refreshing"
            );
        }

        let session = self.perform_login().await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    /// Unconditional login. On failure the previous session is kept.
    pub async fn login(&self) -> Result<Session, SdkError> {
        let mut guard = self.session.lock().await;
        let session = self.perform_login().await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    /// Drop the session; the next authenticated call logs in again.
    pub async fn invalidate(&self) {
        let mut guard = self.session.lock().await;
        if guard.take().is_some() {
            tracing::info!(mode = %self.mode, "Session invalidated");
        }
    }

    pub async fn state(&self) -> SessionState {
        if self.refreshing.load(Ordering::SeqCst) {
            return SessionState::Authenticating;
        }
        match self.session.lock().await.as_ref() {
            None => SessionState::Unauthenticated,
            Some(s) if s.is_valid(self.config.refresh_margin) => SessionState::Authenticated {
                expires_at: s.expires_at(),
            },
            Some(s) => SessionState::Expired {
                expired_at: s.expires_at(),
            },
        }
    }

    /// Number of network login attempts made so far.
    pub fn login_count(&self) -> u64 {
        self.logins.load(Ordering::SeqCst)
    }

    async fn perform_login(&self) -> Result<Session, SdkError> {
        let _flag = RefreshFlag::raise(&self.refreshing);

        let credentials = self.resolver.resolve_mode(self.mode)?;
        let request_id = RequestId::new("LOGIN");
        let body = LoginRequest {
            identifier: &credentials.identifier,
            password: credentials.password.expose(),
            encrypted_password: false,
        };

        let request = HttpRequest::new(
            Method::Post,
            format!("{}{}", credentials.base_url, SESSION_PATH),
        )
        .header(API_KEY_HEADER, credentials.api_key.expose())
        .header(REQUEST_ID_HEADER, request_id.as_str())
        .json(serde_json::to_value(&body)?)
        .timeout(self.http.request_timeout());

        tracing::info!(mode = %self.mode, request_id = %request_id, "Logging in");

        self.logins.fetch_add(1, Ordering::SeqCst);
        let started = Instant::now();
        let resp = self
            .http
            .execute(request, RetryPolicy::None)
            .await
            .map_err(|e| {
                tracing::error!(mode = %self.mode, request_id = %request_id, error = %e, "Login failed");
                AuthError::LoginFailed(e)
            })?;

        let token = non_empty_header(&resp, SECURITY_TOKEN_HEADER)?;
        let cst = non_empty_header(&resp, CST_HEADER)?;

        let session = Session::new(token, cst, credentials.base_url, self.config.ttl);
        tracing::info!(
            mode = %self.mode,
            request_id = %request_id,
            duration_ms = started.elapsed().as_millis() as u64,
            expires_at = %session.expires_at(),
            "Login succeeded"
        );
        Ok(session)
    }
}

fn non_empty_header(
    resp: &crate::http::HttpResponse,
    name: &'static str,
) -> Result<String, AuthError> {
    resp.header(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(AuthError::MissingHeader(name))
}

// ─── Sub-client ──────────────────────────────────────────────────────────────

/// Sub-client for session management.
pub struct Auth<'a> {
    pub(crate) client: &'a CapitalClient,
}

impl<'a> Auth<'a> {
    /// Force a fresh login for `mode`.
    pub async fn login(&self, mode: Mode) -> OperationResult<SessionInfo> {
        let request_id = RequestId::new("SESSION");
        self.client
            .run("auth.login", Some(mode), request_id, async {
                let session = self.client.authenticator(mode).login().await?;
                Ok(SessionInfo::from_session(mode, &session))
            })
            .await
    }

    /// Log in only if there is no usable session.
    pub async fn ensure(&self, mode: Mode) -> OperationResult<SessionInfo> {
        let request_id = RequestId::new("SESSION");
        self.client
            .run("auth.ensure", Some(mode), request_id, async {
                let session = self.client.authenticator(mode).ensure_authenticated().await?;
                Ok(SessionInfo::from_session(mode, &session))
            })
            .await
    }

    pub async fn invalidate(&self, mode: Mode) {
        self.client.authenticator(mode).invalidate().await;
    }

    pub async fn state(&self, mode: Mode) -> SessionState {
        self.client.authenticator(mode).state().await
    }

    /// Expiry of the cached session, if any.
    pub async fn expires_at(&self, mode: Mode) -> Option<DateTime<Utc>> {
        match self.client.authenticator(mode).state().await {
            SessionState::Authenticated { expires_at } => Some(expires_at),
            SessionState::Expired { expired_at } => Some(expired_at),
            SessionState::Authenticating | SessionState::Unauthenticated => None,
        }
    }

    pub fn login_count(&self, mode: Mode) -> u64 {
        self.client.authenticator(mode).login_count()
    }
}
