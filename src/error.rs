//! Unified SDK error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level SDK error.
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl SdkError {
    /// Coarse category exported in the operation envelope.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SdkError::Config(_) => ErrorKind::Config,
            SdkError::Validation(_) => ErrorKind::Validation,
            SdkError::Auth(_) => ErrorKind::Authentication,
            SdkError::Http(e) if e.is_transient() => ErrorKind::TransientNetwork,
            SdkError::Http(HttpError::Unauthorized(_)) => ErrorKind::Authentication,
            SdkError::Http(_) => ErrorKind::Broker,
            SdkError::Serde(_) => ErrorKind::Decode,
        }
    }
}

/// Error categories as seen by callers of the envelope API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Config,
    Validation,
    Authentication,
    TransientNetwork,
    Broker,
    Decode,
}

/// Bad or missing trading mode / credentials. Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid mode \"{0}\": expected \"demo\" or \"live\"")]
    InvalidMode(String),

    #[error("Missing credential for {mode} mode: environment variable {variable} is not set or empty")]
    MissingCredential {
        mode: &'static str,
        variable: &'static str,
    },

    #[error("Invalid base URL in {variable}: {value}")]
    InvalidBaseUrl {
        variable: &'static str,
        value: String,
    },

    #[error("No HTTP transport configured (enable the `http` feature or supply one)")]
    MissingTransport,
}

/// Caller input rejected before it reaches the network.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid direction \"{0}\": expected BUY or SELL")]
    InvalidDirection(String),

    #[error("Invalid epic \"{0}\": expected letters, digits, '.', '_' or '-'")]
    InvalidEpic(String),

    #[error("Invalid size {0}: expected a positive finite number")]
    InvalidSize(f64),

    #[error("Option {field} must be a finite number, got {value}")]
    NonFiniteOption { field: &'static str, value: f64 },

    #[error("dealId must be a non-empty string")]
    EmptyDealId,

    #[error("Invalid threshold {value}: {expected}")]
    InvalidThreshold { value: f64, expected: &'static str },

    #[error("Position update must set at least one of stopLevel, profitLevel, trailingStop")]
    EmptyUpdate,
}

/// Authentication errors.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Login failed: {0}")]
    LoginFailed(#[source] HttpError),

    #[error("Login response is missing the {0} header")]
    MissingHeader(&'static str),
}

/// HTTP-layer errors.
#[derive(Error, Debug)]
pub enum HttpError {
    #[cfg(feature = "http")]
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Server error {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Unauthorized ({0})")]
    Unauthorized(u16),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request {status}: {body}")]
    BadRequest { status: u16, body: String },

    #[error("Timeout")]
    Timeout,

    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

impl HttpError {
    /// Whether the error is a transient network condition eligible for retry.
    pub fn is_transient(&self) -> bool {
        match self {
            #[cfg(feature = "http")]
            HttpError::Reqwest(re) => re.is_connect() || re.is_timeout() || re.is_request(),
            HttpError::Connection(_)
            | HttpError::Timeout
            | HttpError::ServerError { .. }
            | HttpError::RateLimited { .. }
            | HttpError::MaxRetriesExceeded { .. } => true,
            _ => false,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::ServerError { status, .. } | HttpError::BadRequest { status, .. } => {
                Some(*status)
            }
            HttpError::Unauthorized(status) => Some(*status),
            HttpError::RateLimited { .. } => Some(429),
            HttpError::NotFound(_) => Some(404),
            _ => None,
        }
    }
}
