use std::env;
use std::time::Duration;

use crate::intake::Variant;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,

    /// Maximum JSON payload size (in bytes)
    /// Default: 256KB
    pub max_payload_size: usize,

    /// Directory for the rotating log files
    pub log_dir: String,

    /// Form variant used when a session is created without naming one
    pub default_variant: Variant,

    /// Sessions untouched for this long are dropped
    /// Default: 1 hour
    pub session_idle_timeout: Duration,

    /// None when SUPABASE_URL or SUPABASE_KEY is missing
    pub data_store: Option<DataStoreConfig>,

    /// None when TELEGRAM_TOKEN or TELEGRAM_CHAT_ID is missing
    pub notification: Option<NotificationConfig>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataStoreConfig {
    /// Project URL without trailing slash, e.g. https://xyz.supabase.co
    pub base_url: String,
    pub api_key: String,
    pub table: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationConfig {
    pub api_base: String,
    pub token: String,
    pub chat_id: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Nothing is required. Sinks whose settings are missing are disabled.
    ///
    /// Optional environment variables:
    /// - HOST / PORT: bind address (default: 127.0.0.1:8080)
    /// - MAX_PAYLOAD_SIZE: Maximum request payload size in bytes (default: 262144)
    /// - LOG_DIR: log directory (default: logs)
    /// - FORM_VARIANT: `single` or `multi` (default: multi)
    /// - SESSION_IDLE_TIMEOUT_SECS: idle session lifetime in seconds (default: 3600)
    /// - SUPABASE_URL, SUPABASE_KEY, SUPABASE_TABLE (default table: job_requests)
    /// - TELEGRAM_TOKEN, TELEGRAM_CHAT_ID, TELEGRAM_API_BASE (default: https://api.telegram.org)
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match var("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| format!("PORT must be a number between 0 and 65535, got '{}'", raw))?,
            None => 8080,
        };

        // Parse MAX_PAYLOAD_SIZE with default fallback
        let max_payload_size = var("MAX_PAYLOAD_SIZE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(256 * 1024);

        let default_variant = match var("FORM_VARIANT") {
            Some(raw) => raw.parse().map_err(|e| format!("FORM_VARIANT: {}", e))?,
            None => Variant::default(),
        };

        let session_idle_timeout = match var("SESSION_IDLE_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.parse().map_err(|_| {
                format!("SESSION_IDLE_TIMEOUT_SECS must be a whole number of seconds, got '{}'", raw)
            })?),
            None => Duration::from_secs(60 * 60),
        };

        let data_store = match (var("SUPABASE_URL"), var("SUPABASE_KEY")) {
            (Some(url), Some(api_key)) => Some(DataStoreConfig {
                base_url: url.trim_end_matches('/').to_string(),
                api_key,
                table: var("SUPABASE_TABLE").unwrap_or_else(|| "job_requests".to_string()),
            }),
            _ => None,
        };

        let notification = match (var("TELEGRAM_TOKEN"), var("TELEGRAM_CHAT_ID")) {
            (Some(token), Some(chat_id)) => Some(NotificationConfig {
                api_base: var("TELEGRAM_API_BASE")
                    .map(|base| base.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| "https://api.telegram.org".to_string()),
                token,
                chat_id,
            }),
            _ => None,
        };

        Ok(Config {
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            max_payload_size,
            log_dir: var("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            default_variant,
            session_idle_timeout,
            data_store,
            notification,
        })
    }
}
