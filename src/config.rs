use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::util::is_local_endpoint_url;

const DEFAULT_API_URL: &str = "http://localhost:3000/api/assistants";
const DEFAULT_LOG_PATH: &str = "/tmp/threadchat.log";
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 60;
const MAX_TOOL_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub api_key: Option<String>,
    pub tool_timeout: Duration,
    /// Longest wait for the next chunk of a run stream. `None` waits forever.
    pub run_timeout: Option<Duration>,
    pub log_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            tool_timeout: Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS),
            run_timeout: None,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let api_url = std::env::var("THREADCHAT_API_URL")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_key = std::env::var("THREADCHAT_API_KEY").ok().and_then(|v| {
            if v.trim().is_empty() {
                None
            } else {
                Some(v)
            }
        });
        let tool_timeout_secs = std::env::var("THREADCHAT_TOOL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|v| v.clamp(1, MAX_TOOL_TIMEOUT_SECS))
            .unwrap_or(DEFAULT_TOOL_TIMEOUT_SECS);
        let run_timeout = std::env::var("THREADCHAT_RUN_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|v| *v > 0)
            .map(Duration::from_secs);
        let log_path = std::env::var("THREADCHAT_LOG_PATH")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH));

        Ok(Self {
            api_url,
            api_key,
            tool_timeout: Duration::from_secs(tool_timeout_secs),
            run_timeout,
            log_path,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            bail!(
                "Invalid THREADCHAT_API_URL '{}': expected http:// or https:// URL",
                self.api_url
            );
        }

        if self.api_key.is_some()
            && self.api_url.starts_with("http://")
            && !self.is_local_endpoint()
        {
            bail!(
                "Refusing to send THREADCHAT_API_KEY over plain http to '{}'",
                self.api_url
            );
        }

        if self.tool_timeout.is_zero() {
            bail!("Tool timeout must be at least one second");
        }

        Ok(())
    }

    pub fn is_local_endpoint(&self) -> bool {
        is_local_endpoint_url(&self.api_url)
    }
}
