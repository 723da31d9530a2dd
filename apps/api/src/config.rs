use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every value has a default; a malformed `PORT` fails startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// `memory`, `file://<path>` or `redis://...`
    pub storage_url: String,
    pub redis_key_prefix: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            storage_url: env_or("STORAGE_URL", "memory"),
            redis_key_prefix: env_or("REDIS_KEY_PREFIX", ""),
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
