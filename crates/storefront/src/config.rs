//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Backend (both or neither)
//! - `CAPSTONE_BACKEND_URL` - Base URL of the backend (auth + REST)
//! - `CAPSTONE_BACKEND_ANON_KEY` - Public API key sent as `apikey`
//!
//! Without a backend URL the storefront runs in demo mode: remote rows and
//! accounts live in memory for the life of the process.
//!
//! ## Optional
//! - `CAPSTONE_DATA_DIR` - Local mirror directory (default: `.capstone`)
//! - `CAPSTONE_REQUEST_TIMEOUT_SECS` - HTTP timeout (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag (default: `development`)

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_DATA_DIR: &str = ".capstone";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend connection; `None` selects demo mode
    pub backend: Option<BackendConfig>,
    /// Directory holding the local mirror slots
    pub data_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: String,
}

/// Backend connection settings.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL, always ending in `/`
    pub url: Url,
    /// Public (anon) API key
    pub anon_key: SecretString,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"[REDACTED]")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is invalid or the anon key fails
    /// validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// As [`Self::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let backend = BackendConfig::from_env(&env)?;
        let data_dir = PathBuf::from(env.or_default("CAPSTONE_DATA_DIR", DEFAULT_DATA_DIR));
        let sentry_dsn = env.optional("SENTRY_DSN");
        let sentry_environment = env.or_default("SENTRY_ENVIRONMENT", "development");

        Ok(Self {
            backend,
            data_dir,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Configuration for demo mode rooted at `data_dir`.
    #[must_use]
    pub fn demo(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: None,
            data_dir: data_dir.into(),
            sentry_dsn: None,
            sentry_environment: "development".to_string(),
        }
    }
}

impl BackendConfig {
    fn from_env(env: &Env<'_>) -> Result<Option<Self>, ConfigError> {
        let Some(raw_url) = env.optional("CAPSTONE_BACKEND_URL") else {
            if env.optional("CAPSTONE_BACKEND_ANON_KEY").is_some() {
                tracing::warn!("CAPSTONE_BACKEND_ANON_KEY set without CAPSTONE_BACKEND_URL; ignoring");
            }
            return Ok(None);
        };

        let url = parse_base_url(&raw_url)
            .map_err(|e| ConfigError::InvalidEnvVar("CAPSTONE_BACKEND_URL".to_string(), e))?;
        let anon_key = env.validated_secret("CAPSTONE_BACKEND_ANON_KEY")?;
        let timeout_secs = env
            .or_default(
                "CAPSTONE_REQUEST_TIMEOUT_SECS",
                &DEFAULT_REQUEST_TIMEOUT_SECS.to_string(),
            )
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CAPSTONE_REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Some(Self {
            url,
            anon_key,
            request_timeout: Duration::from_secs(timeout_secs),
        }))
    }
}

/// Parse a base URL, forcing a trailing slash so `join` appends paths.
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable source; blank values count as unset.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get an optional variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Load and validate a secret.
    fn validated_secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        let value = self.required(key)?;
        validate_secret_strength(&value, key)?;
        Ok(SecretString::from(value))
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Copy the key from the backend dashboard."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    const KEY: &str = "eyJhbGciOiJIUzI1NiJ9.aB3xY9mK2nL5pQ7rT0uW4zC6";

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_select_demo_mode() {
        let config = StorefrontConfig::from_lookup(lookup(&[])).unwrap();
        assert!(config.backend.is_none());
        assert_eq!(config.data_dir, PathBuf::from(".capstone"));
        assert_eq!(config.sentry_environment, "development");
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_backend_config() {
        let config = StorefrontConfig::from_lookup(lookup(&[
            ("CAPSTONE_BACKEND_URL", "https://abc.backend.dev"),
            ("CAPSTONE_BACKEND_ANON_KEY", KEY),
            ("CAPSTONE_REQUEST_TIMEOUT_SECS", "3"),
            ("CAPSTONE_DATA_DIR", "/tmp/shop"),
        ]))
        .unwrap();

        let backend = config.backend.unwrap();
        assert_eq!(backend.url.as_str(), "https://abc.backend.dev/");
        assert_eq!(backend.anon_key.expose_secret(), KEY);
        assert_eq!(backend.request_timeout, Duration::from_secs(3));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/shop"));
    }

    #[test]
    fn test_backend_url_requires_key() {
        let err = StorefrontConfig::from_lookup(lookup(&[(
            "CAPSTONE_BACKEND_URL",
            "https://abc.backend.dev",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "CAPSTONE_BACKEND_ANON_KEY"));
    }

    #[test]
    fn test_invalid_backend_url() {
        let err = StorefrontConfig::from_lookup(lookup(&[
            ("CAPSTONE_BACKEND_URL", "ftp://abc.backend.dev"),
            ("CAPSTONE_BACKEND_ANON_KEY", KEY),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_base_url_keeps_path_prefix() {
        let url = parse_base_url("http://localhost:54321/project").unwrap();
        assert_eq!(
            url.join("rest/v1/carts").unwrap().as_str(),
            "http://localhost:54321/project/rest/v1/carts"
        );
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength() {
        assert!(matches!(
            validate_secret_strength("your-anon-key-here", "TEST_VAR"),
            Err(ConfigError::InsecureSecret(_, _))
        ));
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR").is_err());
        assert!(validate_secret_strength(KEY, "TEST_VAR").is_ok());
    }

    #[test]
    fn test_backend_config_debug_redacts_key() {
        let config = BackendConfig {
            url: Url::parse("https://abc.backend.dev/").unwrap(),
            anon_key: SecretString::from("super_secret_anon_key"),
            request_timeout: Duration::from_secs(1),
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("abc.backend.dev"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_anon_key"));
    }
}
