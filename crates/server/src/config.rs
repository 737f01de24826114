//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `POS_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `POS_BASE_URL` - Public URL of the server (decides secure cookies)
//!
//! ## Optional
//! - `POS_HOST` - Bind address (default: 127.0.0.1)
//! - `POS_PORT` - Listen port (default: 8000)
//! - `STORE_NAME` - Store name used in customer messages (default: Jamur Cikuda Nusantara)
//! - `STORE_UTC_OFFSET_HOURS` - Store local time offset (default: 7, WIB)
//! - `STORAGE_DIR` - Directory for uploaded product images (default: storage/public)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//!
//! ## Optional (WhatsApp via Fonnte)
//! - `FONNTE_URL` - Send endpoint (default: <https://api.fonnte.com/send>)
//! - `FONNTE_TOKEN` - Device token; without it every send is recorded as `FAILED`
//! - `FONNTE_COUNTRY_CODE` - Country code for local numbers (default: 62)
//! - `FONNTE_TIMEOUT_SECS` - Request timeout (default: 15)
//!
//! ## Optional (TLS)
//! - `POS_TLS_CERT` - PEM-encoded certificate chain
//! - `POS_TLS_KEY` - PEM-encoded private key

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use jamur_pos_core::DEFAULT_COUNTRY_CODE;

const DEFAULT_STORE_NAME: &str = "Jamur Cikuda Nusantara";
const DEFAULT_FONNTE_URL: &str = "https://api.fonnte.com/send";
const DEFAULT_UTC_OFFSET_HOURS: i32 = 7;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

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

/// Server configuration.
#[derive(Debug, Clone)]
pub struct PosConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: String,
    /// Store identity and locale
    pub store: StoreConfig,
    /// Where uploaded product images live
    pub storage_dir: PathBuf,
    /// WhatsApp gateway configuration
    pub fonnte: FonnteConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Store identity used in customer-facing text.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Display name of the store
    pub name: String,
    /// Local time offset; "today" on the dashboard and message timestamps use it
    pub utc_offset: FixedOffset,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_STORE_NAME.to_string(),
            utc_offset: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_HOURS * 3600)
                .unwrap_or_else(|| Utc.fix()),
        }
    }
}

/// Fonnte WhatsApp gateway configuration.
///
/// Implements `Debug` manually to redact the device token.
#[derive(Clone)]
pub struct FonnteConfig {
    /// Send endpoint
    pub url: Url,
    /// Device token; `None` disables delivery
    pub token: Option<SecretString>,
    /// Country code prepended to local numbers
    pub country_code: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for FonnteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FonnteConfig")
            .field("url", &self.url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("country_code", &self.country_code)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("POS_TLS_CERT");
        let key_pem = get_optional_env("POS_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "POS_TLS_*".to_string(),
                "Both POS_TLS_CERT and POS_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl PosConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("POS_DATABASE_URL")?;
        let host = get_env_or_default("POS_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("POS_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("POS_PORT", "8000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("POS_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("POS_BASE_URL")?;

        let store = StoreConfig::from_env()?;
        let storage_dir = PathBuf::from(get_env_or_default("STORAGE_DIR", "storage/public"));
        let fonnte = FonnteConfig::from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);
        let tls = TlsConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            store,
            storage_dir,
            fonnte,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the server is reached over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl StoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let name = get_env_or_default("STORE_NAME", DEFAULT_STORE_NAME);
        let hours = get_env_or_default(
            "STORE_UTC_OFFSET_HOURS",
            &DEFAULT_UTC_OFFSET_HOURS.to_string(),
        );
        let utc_offset = parse_utc_offset(&hours)?;

        Ok(Self { name, utc_offset })
    }
}

impl FonnteConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = Url::parse(&get_env_or_default("FONNTE_URL", DEFAULT_FONNTE_URL))
            .map_err(|e| ConfigError::InvalidEnvVar("FONNTE_URL".to_string(), e.to_string()))?;

        let token = get_optional_env("FONNTE_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .map(|token| {
                if let Err(e) = validate_secret_strength(&token, "FONNTE_TOKEN") {
                    tracing::warn!("FONNTE_TOKEN validation warning: {e}");
                }
                SecretString::from(token)
            });
        if token.is_none() {
            tracing::warn!("FONNTE_TOKEN not set; WhatsApp notifications will be marked FAILED");
        }

        let country_code = get_env_or_default("FONNTE_COUNTRY_CODE", DEFAULT_COUNTRY_CODE);
        if country_code.is_empty() || !country_code.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::InvalidEnvVar(
                "FONNTE_COUNTRY_CODE".to_string(),
                "must contain digits only".to_string(),
            ));
        }

        let timeout = get_env_or_default("FONNTE_TIMEOUT_SECS", "15")
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| {
                ConfigError::InvalidEnvVar("FONNTE_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            url,
            token,
            country_code,
            timeout,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a whole-hour UTC offset in the range -12..=14.
fn parse_utc_offset(hours: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("STORE_UTC_OFFSET_HOURS".to_string(), msg);

    let hours = hours.trim().parse::<i32>().map_err(|e| invalid(e.to_string()))?;
    if !(-12..=14).contains(&hours) {
        return Err(invalid(format!("{hours} is outside -12..=14")));
    }
    FixedOffset::east_opt(hours * 3600).ok_or_else(|| invalid(format!("{hours} out of range")))
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
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}
