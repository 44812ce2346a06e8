//! Scripted in-memory transport and client fixtures for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use capital_sdk::auth::SessionConfig;
use capital_sdk::client::CapitalClient;
use capital_sdk::config::CredentialResolver;
use capital_sdk::error::HttpError;
use capital_sdk::http::{HttpRequest, HttpResponse, Method, RetryConfig, Transport};

pub const DEMO_BASE: &str = "http://demo.mock";
pub const LIVE_BASE: &str = "http://live.mock";

/// A scripted reply. The last reply queued for a route repeats forever.
#[derive(Debug, Clone)]
pub enum Reply {
    Response(HttpResponse),
    ConnectionError,
}

impl Reply {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Reply::Response(HttpResponse::new(status, body.to_string()))
    }

    pub fn status(status: u16) -> Self {
        Reply::Response(HttpResponse::new(status, ""))
    }
}

/// Transport answering from per-route queues keyed by method and URL path.
/// Unscripted routes answer 404. Logins answer `tok1` / `cst1` by default.
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    requests: Mutex<Vec<HttpRequest>>,
    calls: AtomicUsize,
    delay: Mutex<Option<Duration>>,
    route_delays: Mutex<HashMap<(Method, String), Duration>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        let mock = Self {
            routes: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: Mutex::new(None),
            route_delays: Mutex::new(HashMap::new()),
        };
        mock.script(Method::Post, "/api/v1/session", vec![login_reply("tok1", "cst1")]);
        Arc::new(mock)
    }

    /// Replace the queue for a route.
    pub fn script(&self, method: Method, path: &str, replies: Vec<Reply>) {
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), replies.into());
    }

    /// Delay every reply, to widen race windows.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Delay replies on one route only.
    pub fn set_route_delay(&self, method: Method, path: &str, delay: Duration) {
        self.route_delays
            .lock()
            .unwrap()
            .insert((method, path.to_string()), delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests whose method and path match.
    pub fn requests_to(&self, method: Method, path: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && path_of(&r.url) == path)
            .collect()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests_to(method, path).len()
    }

    fn next_reply(&self, method: Method, path: &str) -> Reply {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(&(method, path.to_string())) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or(Reply::status(404)),
            None => Reply::status(404),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let path = path_of(&request.url).to_string();
        let method = request.method;
        self.requests.lock().unwrap().push(request);

        let route_delay = self
            .route_delays
            .lock()
            .unwrap()
            .get(&(method, path.clone()))
            .copied();
        let delay = route_delay.or(*self.delay.lock().unwrap());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.next_reply(method, &path) {
            Reply::Response(resp) => Ok(resp),
            Reply::ConnectionError => Err(HttpError::Connection("connection reset".into())),
        }
    }
}

/// Path component of an absolute URL.
pub fn path_of(url: &str) -> &str {
    let after_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    match after_scheme.find('/') {
        Some(idx) => &after_scheme[idx..],
        None => "/",
    }
}

pub fn login_reply(token: &str, cst: &str) -> Reply {
    Reply::Response(
        HttpResponse::new(200, r#"{"accountType":"CFD","currencyIsoCode":"USD"}"#)
            .with_header("X-SECURITY-TOKEN", token)
            .with_header("CST", cst),
    )
}

/// Credentials for both modes, pointing at the mock hosts.
pub fn resolver() -> CredentialResolver {
    let vars: HashMap<String, String> = [
        ("CAPITAL_API_KEY_DEMO", "demo-key"),
        ("CAPITAL_IDENTIFIER_DEMO", "demo@example.com"),
        ("CAPITAL_PASSWORD_DEMO", "demo-pass"),
        ("CAPITAL_BASE_URL_DEMO", DEMO_BASE),
        ("CAPITAL_API_KEY_LIVE", "live-key"),
        ("CAPITAL_IDENTIFIER_LIVE", "live@example.com"),
        ("CAPITAL_PASSWORD_LIVE", "live-pass"),
        ("CAPITAL_BASE_URL_LIVE", LIVE_BASE),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    CredentialResolver::with_source(vars)
}

/// Demo credentials only.
pub fn demo_only_resolver() -> CredentialResolver {
    let vars: HashMap<String, String> = [
        ("CAPITAL_API_KEY_DEMO", "demo-key"),
        ("CAPITAL_IDENTIFIER_DEMO", "demo@example.com"),
        ("CAPITAL_PASSWORD_DEMO", "demo-pass"),
        ("CAPITAL_BASE_URL_DEMO", DEMO_BASE),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    CredentialResolver::with_source(vars)
}

/// Retries with no waiting.
pub fn fast_retry() -> RetryConfig {
    RetryConfig::new(3)
        .with_initial_delay(Duration::from_millis(1))
        .with_max_jitter(Duration::ZERO)
}

pub fn client(transport: Arc<MockTransport>) -> CapitalClient {
    client_with(transport, resolver(), SessionConfig::default())
}

pub fn client_with(
    transport: Arc<MockTransport>,
    resolver: CredentialResolver,
    session: SessionConfig,
) -> CapitalClient {
    CapitalClient::builder()
        .resolver(resolver)
        .transport(transport)
        .retry(fast_retry())
        .session_config(session)
        .build()
        .expect("client should build")
}

/// One broker position entry.
pub fn position_json(deal_id: &str, level: f64, size: f64, upl: f64) -> serde_json::Value {
    serde_json::json!({
        "position": {
            "dealId": deal_id,
            "direction": "BUY",
            "size": size,
            "level": level,
            "currency": "USD",
            "upl": upl,
            "createdDateUTC": "2024-01-15T10:30:00.000"
        },
        "market": {
            "epic": "US500",
            "instrumentName": "US 500",
            "bid": level,
            "offer": level + 0.5
        }
    })
}

pub fn positions_reply(entries: Vec<serde_json::Value>) -> Reply {
    Reply::json(200, serde_json::json!({ "positions": entries }))
}
