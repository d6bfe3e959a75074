//! Process configuration.
//!
//! The hosted backend is addressed by one base URL and two keys. All three are
//! required; a missing value aborts startup.

use std::net::SocketAddr;

use reqwest::Url;
use thiserror::Error;

pub const ENV_STORE_URL: &str = "SUPABASE_URL";
pub const ENV_ANON_KEY: &str = "SUPABASE_ANON_KEY";
pub const ENV_SERVICE_KEY: &str = "SUPABASE_SERVICE_KEY";
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Clone)]
pub struct PortalConfig {
    /// Base URL without trailing slash, e.g. `https://xyz.supabase.co`.
    pub store_url: String,
    /// Public (anon) key, safe to ship to clients.
    pub anon_key: String,
    /// Service key. Server-side only.
    pub service_key: String,
    pub bind_addr: SocketAddr,
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any name → value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let store_url = required(ENV_STORE_URL)?;
        Url::parse(&store_url).map_err(|e| ConfigError::Invalid {
            name: ENV_STORE_URL,
            reason: e.to_string(),
        })?;
        let anon_key = required(ENV_ANON_KEY)?;
        let service_key = required(ENV_SERVICE_KEY)?;

        let bind_raw = lookup(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            name: ENV_BIND_ADDR,
            reason: e.to_string(),
        })?;

        Ok(Self {
            store_url: store_url.trim_end_matches('/').to_string(),
            anon_key,
            service_key,
            bind_addr,
        })
    }
}

impl core::fmt::Debug for PortalConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PortalConfig")
            .field("store_url", &self.store_url)
            .field("anon_key", &"<redacted>")
            .field("service_key", &"<redacted>")
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}
