use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use anyhow::Result;
use regex::Regex;

pub const DEFAULT_UPSTREAM_URL: &str = "https://www2.deepl.com/jsonrpc";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub translate: TranslateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Outbound quota: `requests` per `window_secs`, at most `burst` at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_requests")]
    pub requests: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    #[serde(default = "default_burst")]
    pub burst: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    #[serde(default = "default_target_lang")]
    pub default_target_lang: String,
    #[serde(default = "default_alternatives")]
    pub alternatives: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    1188
}

fn default_upstream_url() -> String {
    DEFAULT_UPSTREAM_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_requests() -> u32 {
    12
}

fn default_window_secs() -> u64 {
    60
}

fn default_burst() -> u32 {
    1
}

fn default_target_lang() -> String {
    "EN".to_string()
}

fn default_alternatives() -> u32 {
    3
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests: default_requests(),
            window_secs: default_window_secs(),
            burst: default_burst(),
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            default_target_lang: default_target_lang(),
            alternatives: default_alternatives(),
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Config {
    /// Load configuration from a YAML or JSON file
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            anyhow::bail!("Configuration file not found: {}", path);
        }

        let content = substitute_env_vars(&fs::read_to_string(path)?);

        let path_lower = path.to_lowercase();
        let config: Config = if path_lower.ends_with(".json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("server.port must be non-zero");
        }
        if self.rate_limit.requests == 0 {
            anyhow::bail!("rate_limit.requests must be at least 1");
        }
        if self.rate_limit.window_secs == 0 {
            anyhow::bail!("rate_limit.window_secs must be at least 1");
        }
        if self.rate_limit.burst == 0 {
            anyhow::bail!("rate_limit.burst must be at least 1");
        }
        if self.translate.default_target_lang.trim().is_empty() {
            anyhow::bail!("translate.default_target_lang must not be empty");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Replace `${VAR_NAME}` with the environment value, leaving unknown names as-is
fn substitute_env_vars(content: &str) -> String {
    let pattern = match Regex::new(r"\$\{(\w+)\}") {
        Ok(pattern) => pattern,
        Err(_) => return content.to_string(),
    };
    pattern
        .replace_all(content, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}
