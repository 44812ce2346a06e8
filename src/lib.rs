//! # Capital SDK
//!
//! An async Rust client for the Capital.com CFD broker REST API, covering
//! both the demo (paper) and live (real funds) environments.
//!
//! ## Architecture
//!
//! The SDK is organized in layers:
//!
//! 1. **Core** — Modes, directions, the result envelope, domain models
//! 2. **Config** — Per-mode credential resolution from the environment
//! 3. **HTTP** — `CapitalHttp` over a pluggable `Transport`, with retry policies
//! 4. **Auth** — Per-mode session with serialized refresh
//! 5. **High-Level Client** — `CapitalClient` with nested sub-clients
//!
//! Every public operation returns an [`OperationResult`](shared::OperationResult)
//! instead of `Err`, tagged with a request id and its duration.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use capital_sdk::prelude::*;
//!
//! let client = CapitalClient::builder().build()?;
//!
//! let order = client
//!     .orders()
//!     .place("BUY", "EURUSD", 1.0, Mode::Demo, OrderOptions::default().stop_distance(20.0))
//!     .await;
//! let summary = client.positions().summary(Mode::Demo).await;
//! let health = client.account().health_check().await;
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared types: mode, direction, request ids, the operation envelope.
pub mod shared;

/// Domain modules (vertical slices): types, wire types, conversions, sub-clients.
pub mod domain;

/// Unified SDK error types.
pub mod error;

/// Broker URL, endpoint and header constants.
pub mod network;

// ── Layer 2: Config ──────────────────────────────────────────────────────────

/// Credential resolution per mode.
pub mod config;

// ── Layer 3: HTTP ────────────────────────────────────────────────────────────

/// Transport abstraction, retry policies and the resilient HTTP client.
pub mod http;

// ── Layer 4: Auth ────────────────────────────────────────────────────────────

/// Session lifecycle: login, reuse, refresh.
pub mod auth;

// ── Layer 5: High-Level Client ───────────────────────────────────────────────

/// `CapitalClient` — the primary entry point.
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared types
    pub use crate::shared::{
        Direction, EventObserver, Mode, OperationEvent, OperationResult, RequestId,
    };

    // Domain types — order
    pub use crate::domain::order::{OrderOptions, OrderRequest};

    // Domain types — position
    pub use crate::domain::position::{
        BulkCloseReport, CloseFilter, FailedClose, Position, PositionDetail, PositionSummary,
        PositionUpdate,
    };

    // Domain types — account
    pub use crate::domain::account::{EnvironmentReport, HealthReport, HealthStatus, PingReport};

    // Errors
    pub use crate::error::{AuthError, ConfigError, ErrorKind, HttpError, SdkError, ValidationError};

    // Config
    pub use crate::config::{CredentialResolver, CredentialSource, Credentials, EnvSource, Secret};

    // Auth
    pub use crate::auth::{SessionConfig, SessionInfo, SessionState};

    // HTTP
    #[cfg(feature = "http")]
    pub use crate::http::ReqwestTransport;
    pub use crate::http::{HttpRequest, HttpResponse, Method, RetryConfig, RetryPolicy, Transport};

    // Client + sub-clients
    pub use crate::client::{
        AccountClient, AuthClient, CapitalClient, CapitalClientBuilder, OrdersClient,
        PositionsClient,
    };
}
