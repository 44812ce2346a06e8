//! The uniform result envelope returned by every public operation, and the
//! observer hook fired when an operation completes.

use crate::error::{ErrorKind, SdkError};
use crate::shared::{Mode, RequestId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Outcome of a public operation.
///
/// Serializes camelCase so a route layer can relay it to its own clients
/// verbatim. Operations never return `Err`: check `success`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    pub duration_ms: u64,
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

impl<T> OperationResult<T> {
    pub fn ok(data: T, mode: Option<Mode>, request_id: &RequestId, duration_ms: u64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_kind: None,
            mode,
            duration_ms,
            request_id: request_id.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn failed(
        error: &SdkError,
        mode: Option<Mode>,
        request_id: &RequestId,
        duration_ms: u64,
    ) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
            mode,
            duration_ms,
            request_id: request_id.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Collapse into a plain `Result`, e.g. for `?` in application code.
    pub fn into_result(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(self
                .error
                .unwrap_or_else(|| "operation failed without error detail".to_string())),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> OperationResult<U> {
        OperationResult {
            success: self.success,
            data: self.data.map(f),
            error: self.error,
            error_kind: self.error_kind,
            mode: self.mode,
            duration_ms: self.duration_ms,
            request_id: self.request_id,
            timestamp: self.timestamp,
        }
    }
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// Emitted once per completed public operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationEvent {
    pub operation: &'static str,
    pub request_id: String,
    pub mode: Option<Mode>,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

impl OperationEvent {
    pub(crate) fn from_result<T>(operation: &'static str, result: &OperationResult<T>) -> Self {
        Self {
            operation,
            request_id: result.request_id.clone(),
            mode: result.mode,
            success: result.success,
            duration_ms: result.duration_ms,
            error: result.error.clone(),
        }
    }
}

/// Callback registered through `CapitalClientBuilder::on_event`.
pub type EventObserver = Arc<dyn Fn(&OperationEvent) + Send + Sync>;
