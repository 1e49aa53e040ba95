use anyhow::{Context, Result};

use crate::client::{DEFAULT_TIMEOUT_SECS, FULL_PROFILE_TIMEOUT_SECS};

/// Runner configuration loaded from environment variables.
/// Fails at startup if the API base URL is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub timeout_secs: u64,
    pub full_profile_timeout_secs: u64,
    /// File attached to the full-profile sample submission.
    pub attachment_path: Option<String>,
    /// Send the sample submissions concurrently instead of one after another.
    pub concurrent: bool,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };
        let secs = |key: &str, default: u64| -> Result<u64> {
            match lookup(key) {
                Some(v) => v
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("{key} must be a whole number of seconds")),
                None => Ok(default),
            }
        };

        Ok(Config {
            api_base_url: require("PROFILE_API_BASE_URL")?,
            timeout_secs: secs("PROFILE_API_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            full_profile_timeout_secs: secs("PROFILE_FULL_TIMEOUT_SECS", FULL_PROFILE_TIMEOUT_SECS)?,
            attachment_path: lookup("PROFILE_ATTACHMENT").filter(|v| !v.trim().is_empty()),
            concurrent: match lookup("PROFILE_CONCURRENT") {
                Some(v) => parse_flag(&v).context("PROFILE_CONCURRENT must be true or false")?,
                None => false,
            },
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
