//! HTTP client layer — `CapitalHttp` over a pluggable `Transport`, with retry policies.

pub mod client;
pub mod retry;
pub mod transport;

pub use client::{CapitalHttp, DEFAULT_PING_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};
pub use retry::{RetryConfig, RetryPolicy};
#[cfg(feature = "http")]
pub use transport::ReqwestTransport;
pub use transport::{HttpRequest, HttpResponse, Method, Transport};
