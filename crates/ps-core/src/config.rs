//! Configuration types and loading

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::error::PsError;
use crate::types::DEFAULT_DISPLAY_OFFSET_HOURS;

/// Expo's push endpoint; batches of at most 100 messages per request
pub const EXPO_PUSH_ENDPOINT: &str = "https://exp.host/--/api/v2/push/send";

/// Upper bound the push endpoint accepts per request
pub const MAX_PUSH_CHUNK: usize = 100;

/// Main client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Backend REST configuration
    pub api: ApiConfig,

    /// Task list paging
    pub list: ListConfig,

    /// Push delivery
    pub push: PushConfig,

    /// Persisted session
    pub session: SessionConfig,

    /// Date display
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// One canonical base URL for every backend endpoint
    pub base_url: String,
    /// Fixed timeout applied to every request
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListConfig {
    pub page_size: u32,
    /// Fetch the next page when the consumer is this close to the end
    pub prefetch_threshold: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PushConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub chunk_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// File holding the `auth-storage` entry
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    pub utc_offset_hours: i32,
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl From<ConfigError> for PsError {
    fn from(err: ConfigError) -> Self {
        PsError::Config(err.to_string())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "https://snowplanet.co.kr/nest".to_string(),
                timeout_seconds: 15,
            },
            list: ListConfig {
                page_size: 10,
                prefetch_threshold: 3,
            },
            push: PushConfig {
                enabled: true,
                endpoint: EXPO_PUSH_ENDPOINT.to_string(),
                chunk_size: MAX_PUSH_CHUNK,
            },
            session: SessionConfig {
                path: PathBuf::from(".printshop/auth-storage.json"),
            },
            display: DisplayConfig {
                utc_offset_hours: DEFAULT_DISPLAY_OFFSET_HOURS,
            },
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup, starting from defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // API
        if let Some(url) = lookup("PRINTSHOP_API_URL") {
            config.api.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("PRINTSHOP_TIMEOUT_SECS") {
            config.api.timeout_seconds = parse_number("PRINTSHOP_TIMEOUT_SECS", &v)?;
        }
        validate_url("PRINTSHOP_API_URL", &config.api.base_url)?;

        // List
        if let Some(v) = lookup("PRINTSHOP_PAGE_SIZE") {
            config.list.page_size = parse_number("PRINTSHOP_PAGE_SIZE", &v)?;
        }
        if let Some(v) = lookup("PRINTSHOP_PREFETCH_THRESHOLD") {
            config.list.prefetch_threshold = parse_number("PRINTSHOP_PREFETCH_THRESHOLD", &v)?;
        }

        // Push
        let parse_bool = |v: String| v == "true" || v == "1" || v == "yes";
        if let Some(v) = lookup("PRINTSHOP_PUSH_ENABLED") {
            config.push.enabled = parse_bool(v);
        }
        if let Some(url) = lookup("PRINTSHOP_PUSH_URL") {
            config.push.endpoint = url;
        }
        validate_url("PRINTSHOP_PUSH_URL", &config.push.endpoint)?;
        if let Some(v) = lookup("PRINTSHOP_PUSH_CHUNK") {
            let chunk: usize = parse_number("PRINTSHOP_PUSH_CHUNK", &v)?;
            config.push.chunk_size = chunk.clamp(1, MAX_PUSH_CHUNK);
        }

        // Session
        if let Some(path) = lookup("PRINTSHOP_SESSION_PATH") {
            config.session.path = PathBuf::from(path);
        }

        // Display
        if let Some(v) = lookup("PRINTSHOP_DISPLAY_OFFSET_HOURS") {
            config.display.utc_offset_hours = parse_number("PRINTSHOP_DISPLAY_OFFSET_HOURS", &v)?;
        }

        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds)
    }

    /// Absolute URL for a backend path such as `/tasks/abc`
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn validate_url(key: &str, value: &str) -> Result<(), ConfigError> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })
}
