//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};

pub const ENV_HOST: &str = "TODO_HTTP_HOST";
pub const ENV_PORT: &str = "TODO_HTTP_PORT";
pub const ENV_SESSION_TTL_SECS: &str = "TODO_SESSION_TTL_SECS";
pub const ENV_LOOKUP_TIMEOUT_MS: &str = "TODO_LOOKUP_TIMEOUT_MS";
pub const ENV_SEED_DEMO: &str = "TODO_SEED_DEMO";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
    /// Bearer session lifetime; seven days by default.
    pub session_ttl: Duration,
    /// Upper bound for each identity/role lookup during privilege resolution.
    pub lookup_timeout: Duration,
    /// Load the demo users and todos into the in-memory stores.
    pub seed_demo: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            http_port: 4000,
            session_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            lookup_timeout: Duration::from_millis(2000),
            seed_demo: true,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults, malformed values fail.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = lookup(ENV_HOST) {
            cfg.host = v;
        }
        if let Some(v) = lookup(ENV_PORT) {
            cfg.http_port = v.trim().parse().with_context(|| format!("{}='{}' is not a port", ENV_PORT, v))?;
        }
        if let Some(v) = lookup(ENV_SESSION_TTL_SECS) {
            let secs: u64 = v.trim().parse().with_context(|| format!("{}='{}' is not a number of seconds", ENV_SESSION_TTL_SECS, v))?;
            cfg.session_ttl = Duration::from_secs(secs);
        }
        if let Some(v) = lookup(ENV_LOOKUP_TIMEOUT_MS) {
            let ms: u64 = v.trim().parse().with_context(|| format!("{}='{}' is not a number of milliseconds", ENV_LOOKUP_TIMEOUT_MS, v))?;
            anyhow::ensure!(ms > 0, "{} must be greater than zero", ENV_LOOKUP_TIMEOUT_MS);
            cfg.lookup_timeout = Duration::from_millis(ms);
        }
        if let Some(v) = lookup(ENV_SEED_DEMO) {
            cfg.seed_demo = parse_bool(&v).with_context(|| format!("{}='{}' is not a boolean", ENV_SEED_DEMO, v))?;
        }
        Ok(cfg)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.http_port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.http_port))
    }
}
