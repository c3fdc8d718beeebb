use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Poll timeout for blocking log reads. Bounds worst-case cancellation
    /// latency when no new records arrive.
    pub stream_poll_timeout: Duration,
    /// Interval between SSE keep-alive comments.
    pub sse_keep_alive: Duration,
    /// Retention cap per stream; appends beyond this fail.
    pub stream_max_records: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .context("PORT must be a valid number")?;

        let poll_timeout_ms: u64 = env::var("STREAM_POLL_TIMEOUT_MS")
            .unwrap_or_else(|_| "10000".to_string())
            .parse()
            .context("STREAM_POLL_TIMEOUT_MS must be a valid number")?;

        let keep_alive_ms: u64 = env::var("SSE_KEEP_ALIVE_MS")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("SSE_KEEP_ALIVE_MS must be a valid number")?;

        let stream_max_records = env::var("STREAM_MAX_RECORDS")
            .unwrap_or_else(|_| "10000".to_string())
            .parse()
            .context("STREAM_MAX_RECORDS must be a valid number")?;

        Ok(Self {
            port,
            stream_poll_timeout: Duration::from_millis(poll_timeout_ms),
            sse_keep_alive: Duration::from_millis(keep_alive_ms),
            stream_max_records,
        })
    }
}
