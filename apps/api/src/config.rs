use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection string for the caller-scoped role (subject to row-level security).
    pub database_url: String,
    /// Connection string for the elevated role used by cascades and background work.
    pub elevated_database_url: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub analysis_workers: usize,
    pub analysis_queue_capacity: usize,
    pub llm_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let database_url = require_env("DATABASE_URL")?;

        Ok(Config {
            elevated_database_url: std::env::var("ELEVATED_DATABASE_URL")
                .unwrap_or_else(|_| database_url.clone()),
            database_url,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            analysis_workers: parse_env("ANALYSIS_WORKERS", 4)
                .context("ANALYSIS_WORKERS must be a positive integer")?,
            analysis_queue_capacity: parse_env("ANALYSIS_QUEUE_CAPACITY", 256)
                .context("ANALYSIS_QUEUE_CAPACITY must be a positive integer")?,
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", 120)
                .context("LLM_TIMEOUT_SECS must be a number of seconds")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => Ok(raw.trim().parse::<T>()?),
        Err(_) => Ok(default),
    }
}
