use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::player::PlayerPolicy;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub id_token: String,
    pub port: u16,
    pub rust_log: String,
    pub completion_threshold: f64,
    pub probe_timeout_ms: u64,
    pub persist_interval_secs: u64,
    pub tick_interval_ms: u64,
    pub notification_ttl_secs: i64,
    pub backend_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config = Config {
            api_url: lookup("PATHFORGE_API_URL")
                .unwrap_or_else(|| "http://localhost:8000/api".to_string())
                .trim_end_matches('/')
                .to_string(),
            id_token: lookup("PATHFORGE_ID_TOKEN").with_context(|| {
                "Required environment variable 'PATHFORGE_ID_TOKEN' is not set".to_string()
            })?,
            port: parse_or(&lookup, "PORT", 8090)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            completion_threshold: parse_or(&lookup, "COMPLETION_THRESHOLD", 0.90)?,
            probe_timeout_ms: parse_or(&lookup, "YOUTUBE_PROBE_TIMEOUT_MS", 3000)?,
            persist_interval_secs: parse_or(&lookup, "TIME_PERSIST_INTERVAL_SECS", 30)?,
            tick_interval_ms: parse_or(&lookup, "TICK_INTERVAL_MS", 1000)?,
            notification_ttl_secs: parse_or(&lookup, "NOTIFICATION_TTL_SECS", 5)?,
            backend_timeout_secs: parse_or(&lookup, "BACKEND_TIMEOUT_SECS", 30)?,
        };

        if !(config.completion_threshold > 0.0 && config.completion_threshold <= 1.0) {
            bail!("COMPLETION_THRESHOLD must be in (0, 1]");
        }
        if config.persist_interval_secs == 0 {
            bail!("TIME_PERSIST_INTERVAL_SECS must be positive");
        }
        if config.tick_interval_ms == 0 {
            bail!("TICK_INTERVAL_MS must be positive");
        }
        Ok(config)
    }

    pub fn policy(&self) -> PlayerPolicy {
        PlayerPolicy {
            completion_threshold: self.completion_threshold,
            probe_timeout: Duration::from_millis(self.probe_timeout_ms),
            persist_every_secs: self.persist_interval_secs,
            tick_period: Duration::from_millis(self.tick_interval_ms),
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
