use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub aws_region: String,
    pub anthropic_api_key: String,
    pub gemini_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub poll: PollConfig,
    /// When true, the worker claims an application with a compare-and-swap
    /// (QUEUED or FAILED → PROCESSING) and skips it when the swap loses.
    /// When false the claim is unconditional, matching at-least-once queue
    /// delivery: two duplicate deliveries can both reach PROCESSING, and the
    /// COMPLETED short-circuit is the only guard.
    pub strict_claim: bool,
}

/// Knobs for the OCR polling stage. A single struct consumed by the one
/// polling loop — never duplicated per call site.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub poll_interval: Duration,
    pub max_wait: Duration,
    pub max_transient_retries: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(300),
            max_transient_retries: 5,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            aws_region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            poll: PollConfig {
                poll_interval: Duration::from_secs(env_u64("OCR_POLL_INTERVAL_SECS", 5)?),
                max_wait: Duration::from_secs(env_u64("OCR_MAX_WAIT_SECS", 300)?),
                max_transient_retries: env_u64("OCR_MAX_TRANSIENT_RETRIES", 5)? as u32,
            },
            strict_claim: std::env::var("STRICT_CLAIM")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_u64(key: &str, default: u64) -> Result<u64> {
    match std::env::var(key) {
        Ok(v) => v
            .parse::<u64>()
            .with_context(|| format!("'{key}' must be a non-negative integer")),
        Err(_) => Ok(default),
    }
}
