use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::models::ThemeName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Yahoo,
    Csv,
    Mock,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yahoo" => Ok(ProviderKind::Yahoo),
            "csv" => Ok(ProviderKind::Csv),
            "mock" => Ok(ProviderKind::Mock),
            other => Err(format!(
                "Invalid PRICE_PROVIDER: {}. Must be 'yahoo', 'csv', or 'mock'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub provider: ProviderKind,
    pub data_dir: PathBuf,
    pub export_dir: PathBuf,
    pub fetch_timeout: Duration,
    pub default_theme: ThemeName,
    pub session_ttl: chrono::Duration,
    pub status_log_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            provider: ProviderKind::Yahoo,
            data_dir: PathBuf::from("data"),
            export_dir: PathBuf::from("exports"),
            fetch_timeout: Duration::from_secs(15),
            default_theme: ThemeName::Light,
            session_ttl: chrono::Duration::minutes(60),
            status_log_capacity: 50,
        }
    }
}

/// Parses `key` with `FromStr`, falling back to `default` (with a warning)
/// when it is unset or unparseable.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring unparseable {}={:?}, using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

impl AppConfig {
    /// Reads the environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let provider = match std::env::var("PRICE_PROVIDER") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.provider,
        };
        let default_theme = match std::env::var("DEFAULT_THEME") {
            Ok(raw) => raw.parse::<ThemeName>().map_err(|e| e.to_string())?,
            Err(_) => defaults.default_theme,
        };

        Ok(Self {
            bind_addr: env_or("BIND_ADDR", defaults.bind_addr),
            provider,
            data_dir: env_or("DATA_DIR", defaults.data_dir),
            export_dir: env_or("EXPORT_DIR", defaults.export_dir),
            fetch_timeout: Duration::from_secs(env_or("FETCH_TIMEOUT_SECS", 15u64)),
            default_theme,
            session_ttl: chrono::Duration::minutes(env_or("SESSION_TTL_MINUTES", 60i64)),
            status_log_capacity: env_or("STATUS_LOG_CAPACITY", defaults.status_log_capacity),
        })
    }
}
