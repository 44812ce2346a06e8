//! Network URL, endpoint and header constants for the Capital.com API.

/// Demo (paper trading) REST API base URL.
pub const DEMO_API_URL: &str = "https://demo-api-capital.backend-capital.com";

/// Live (real funds) REST API base URL.
pub const LIVE_API_URL: &str = "https://api-capital.backend-capital.com";

pub const SESSION_PATH: &str = "/api/v1/session";
pub const PING_PATH: &str = "/api/v1/ping";
pub const ACCOUNTS_PATH: &str = "/api/v1/accounts";
pub const POSITIONS_PATH: &str = "/api/v1/positions";
pub const POSITIONS_OTC_PATH: &str = "/api/v1/positions/otc";

pub const API_KEY_HEADER: &str = "X-CAP-API-KEY";
pub const SECURITY_TOKEN_HEADER: &str = "X-SECURITY-TOKEN";
pub const CST_HEADER: &str = "CST";
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";
