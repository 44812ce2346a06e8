//! Authentication — broker session, expiry tracking, transparent refresh.
//!
//! ## Security Model
//!
//! - The security token and CST live only inside [`Session`], which is owned by
//!   the per-mode [`client::Authenticator`]. There is no public accessor; they
//!   are injected as `X-SECURITY-TOKEN` / `CST` headers on authenticated calls.
//! - `Debug` output of sessions and credentials is redacted. The login
//!   password is never logged.
//!
//! ## Lifecycle
//!
//! `Unauthenticated → Authenticating → Authenticated → (expired) → Authenticating → …`
//!
//! A session is reused until `now >= expires_at - refresh_margin`. A 401 from
//! the broker does not trigger an automatic re-login; call
//! `client.auth().invalidate(mode)` to force one.

pub mod client;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::shared::Mode;

// ============================================================================
// Session types
// ============================================================================

/// Session lifetime settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Lifetime assumed for a fresh session.
    pub ttl: Duration,
    /// Refresh this long before `expires_at`.
    pub refresh_margin: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(6 * 60 * 60),
            refresh_margin: Duration::from_secs(10 * 60),
        }
    }
}

/// An authenticated broker session. Token and CST are NEVER exposed.
#[derive(Clone)]
pub struct Session {
    pub(crate) token: String,
    pub(crate) cst: String,
    pub(crate) base_url: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Session {
    pub(crate) fn new(token: String, cst: String, base_url: String, ttl: Duration) -> Self {
        let created_at = Utc::now();
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::hours(6));
        Self {
            token,
            cst,
            base_url,
            created_at,
            expires_at: created_at + ttl,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Still usable: `now < expires_at - margin`.
    pub fn is_valid(&self, refresh_margin: Duration) -> bool {
        let margin = chrono::Duration::from_std(refresh_margin).unwrap_or_else(|_| chrono::Duration::zero());
        Utc::now() + margin < self.expires_at
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"***")
            .field("cst", &"***")
            .field("base_url", &self.base_url)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Observable projection of the authenticator's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated { expires_at: DateTime<Utc> },
    Expired { expired_at: DateTime<Utc> },
}

/// Public, token-free view of a session returned by `client.auth().login()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub mode: Mode,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionInfo {
    pub(crate) fn from_session(mode: Mode, session: &Session) -> Self {
        Self {
            mode,
            created_at: session.created_at,
            expires_at: session.expires_at,
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// Login request body sent to `POST /api/v1/session`.
///
/// No `Debug`: it carries the password.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginRequest<'a> {
    pub identifier: &'a str,
    pub password: &'a str,
    pub encrypted_password: bool,
}
