//! Credential resolution — per-mode API key, login identity and base URL.
//!
//! Variables, per mode (`DEMO` / `LIVE`):
//!
//! | Variable | Required |
//! |---|---|
//! | `CAPITAL_API_KEY_{MODE}` | yes |
//! | `CAPITAL_IDENTIFIER_{MODE}` | yes |
//! | `CAPITAL_PASSWORD_{MODE}` | yes |
//! | `CAPITAL_BASE_URL_{MODE}` | no, defaults to the broker URL for the mode |
//!
//! Resolution is pure and uncached: the session layer re-resolves on every
//! login attempt so rotated credentials are picked up without a restart.

use crate::error::ConfigError;
use crate::shared::Mode;
use std::collections::HashMap;

/// A secret string. `Debug` and `Display` never print the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret(***)")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "***")
    }
}

/// Resolved credentials for one mode.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub mode: Mode,
    pub api_key: Secret,
    pub identifier: String,
    pub password: Secret,
    pub base_url: String,
}

/// Where credential values come from.
pub trait CredentialSource: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl CredentialSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl CredentialSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

struct VarNames {
    api_key: &'static str,
    identifier: &'static str,
    password: &'static str,
    base_url: &'static str,
}

fn var_names(mode: Mode) -> VarNames {
    match mode {
        Mode::Demo => VarNames {
            api_key: "CAPITAL_API_KEY_DEMO",
            identifier: "CAPITAL_IDENTIFIER_DEMO",
            password: "CAPITAL_PASSWORD_DEMO",
            base_url: "CAPITAL_BASE_URL_DEMO",
        },
        Mode::Live => VarNames {
            api_key: "CAPITAL_API_KEY_LIVE",
            identifier: "CAPITAL_IDENTIFIER_LIVE",
            password: "CAPITAL_PASSWORD_LIVE",
            base_url: "CAPITAL_BASE_URL_LIVE",
        },
    }
}

/// Resolves [`Credentials`] for a trading mode.
pub struct CredentialResolver {
    source: Box<dyn CredentialSource>,
}

impl CredentialResolver {
    pub fn from_env() -> Self {
        Self::with_source(EnvSource)
    }

    pub fn with_source(source: impl CredentialSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    /// Resolve from an untrusted mode string (e.g. a route parameter).
    pub fn resolve(&self, mode: &str) -> Result<Credentials, ConfigError> {
        let mode: Mode = mode.parse()?;
        self.resolve_mode(mode)
    }

    pub fn resolve_mode(&self, mode: Mode) -> Result<Credentials, ConfigError> {
        let names = var_names(mode);

        let api_key = self.required(mode, names.api_key)?;
        let identifier = self.required(mode, names.identifier)?;
        let password = self.required(mode, names.password)?;

        let base_url = match self.non_empty(names.base_url) {
            Some(url) => {
                if !(url.starts_with("https://") || url.starts_with("http://")) {
                    return Err(ConfigError::InvalidBaseUrl {
                        variable: names.base_url,
                        value: url,
                    });
                }
                url.trim_end_matches('/').to_string()
            }
            None => mode.default_base_url().to_string(),
        };

        tracing::debug!(mode = %mode, base_url = %base_url, "Credentials resolved");

        Ok(Credentials {
            mode,
            api_key: Secret::new(api_key),
            identifier,
            password: Secret::new(password),
            base_url,
        })
    }

    /// Whether the API key for `mode` is present. Does not validate the rest.
    pub fn is_configured(&self, mode: Mode) -> bool {
        self.non_empty(var_names(mode).api_key).is_some()
    }

    fn non_empty(&self, key: &str) -> Option<String> {
        self.source
            .get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, mode: Mode, key: &'static str) -> Result<String, ConfigError> {
        self.non_empty(key).ok_or(ConfigError::MissingCredential {
            mode: mode.as_str(),
            variable: key,
        })
    }
}

impl std::fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_vars() -> HashMap<String, String> {
        HashMap::from([
            ("CAPITAL_API_KEY_DEMO".to_string(), "demo-key".to_string()),
            ("CAPITAL_IDENTIFIER_DEMO".to_string(), "trader@example.com".to_string()),
            ("CAPITAL_PASSWORD_DEMO".to_string(), "hunter2".to_string()),
        ])
    }

    #[test]
    fn test_resolve_demo_defaults_base_url() {
        let resolver = CredentialResolver::with_source(demo_vars());
        let creds = resolver.resolve("demo").unwrap();
        assert_eq!(creds.mode, Mode::Demo);
        assert_eq!(creds.api_key.expose(), "demo-key");
        assert_eq!(creds.identifier, "trader@example.com");
        assert_eq!(creds.base_url, crate::network::DEMO_API_URL);
    }

    #[test]
    fn test_resolve_invalid_mode() {
        let resolver = CredentialResolver::with_source(demo_vars());
        for bad in ["real", "DEMO", "", "paper"] {
            assert!(matches!(
                resolver.resolve(bad),
                Err(ConfigError::InvalidMode(_))
            ));
        }
    }

    #[test]
    fn test_missing_key_names_variable() {
        let resolver = CredentialResolver::with_source(demo_vars());
        let err = resolver.resolve_mode(Mode::Live).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingCredential {
                mode: "live",
                variable: "CAPITAL_API_KEY_LIVE",
            }
        );
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let mut vars = demo_vars();
        vars.insert("CAPITAL_PASSWORD_DEMO".into(), "   ".into());
        let resolver = CredentialResolver::with_source(vars);
        let err = resolver.resolve_mode(Mode::Demo).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingCredential {
                variable: "CAPITAL_PASSWORD_DEMO",
                ..
            }
        ));
    }

    #[test]
    fn test_base_url_override() {
        let mut vars = demo_vars();
        vars.insert("CAPITAL_BASE_URL_DEMO".into(), "http://localhost:9000/".into());
        let resolver = CredentialResolver::with_source(vars);
        let creds = resolver.resolve_mode(Mode::Demo).unwrap();
        assert_eq!(creds.base_url, "http://localhost:9000");
    }

    #[test]
    fn test_base_url_must_be_http() {
        let mut vars = demo_vars();
        vars.insert("CAPITAL_BASE_URL_DEMO".into(), "ftp://example.com".into());
        let resolver = CredentialResolver::with_source(vars);
        assert!(matches!(
            resolver.resolve_mode(Mode::Demo),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_secrets_are_redacted() {
        let resolver = CredentialResolver::with_source(demo_vars());
        let creds = resolver.resolve_mode(Mode::Demo).unwrap();
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("demo-key"));
    }

    #[test]
    fn test_is_configured() {
        let resolver = CredentialResolver::with_source(demo_vars());
        assert!(resolver.is_configured(Mode::Demo));
        assert!(!resolver.is_configured(Mode::Live));
    }
}
