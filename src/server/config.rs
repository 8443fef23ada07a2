//! Server configuration from TOML or environment

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::registry::DuplicatePolicy;

/// Default host address
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port number
pub const DEFAULT_PORT: u16 = 5000;

/// Log levels accepted by `validate`
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Server configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Directory holding a built dashboard to serve for unmatched GETs
    pub static_dir: Option<PathBuf>,

    /// Load the sample experiments at startup
    pub seed_samples: bool,

    /// What to do when a create reuses an existing key
    pub duplicate_policy: DuplicatePolicy,

    /// Enable request logging
    pub enable_logging: bool,

    /// Log level for tracing
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            static_dir: None,
            seed_samples: true,
            duplicate_policy: DuplicatePolicy::Allow,
            enable_logging: true,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load config from a TOML file; missing keys take their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Load config from environment variables with fallback to defaults
    ///
    /// Environment variables:
    /// - `CHAOS_REGISTRY_HOST` - Server host
    /// - `CHAOS_REGISTRY_PORT` - Server port (falls back to `PORT`)
    /// - `CHAOS_REGISTRY_STATIC_DIR` - Dashboard build directory
    /// - `CHAOS_REGISTRY_SEED` - `true`/`false`, load sample experiments
    /// - `CHAOS_REGISTRY_DUPLICATES` - `allow`/`reject`
    /// - `CHAOS_REGISTRY_LOG_LEVEL` - Log level (trace, debug, info, warn, error)
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides on top of this config
    ///
    /// Unparseable values are ignored and the existing setting kept.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(host) = std::env::var("CHAOS_REGISTRY_HOST") {
            self.host = host;
        }

        let port = std::env::var("CHAOS_REGISTRY_PORT").or_else(|_| std::env::var("PORT"));
        if let Ok(port_str) = port {
            if let Ok(port) = port_str.parse::<u16>() {
                self.port = port;
            }
        }

        if let Ok(dir) = std::env::var("CHAOS_REGISTRY_STATIC_DIR") {
            self.static_dir = Some(PathBuf::from(dir));
        }

        if let Ok(seed) = std::env::var("CHAOS_REGISTRY_SEED") {
            if let Ok(seed) = seed.parse::<bool>() {
                self.seed_samples = seed;
            }
        }

        if let Ok(policy) = std::env::var("CHAOS_REGISTRY_DUPLICATES") {
            if let Ok(policy) = policy.parse::<DuplicatePolicy>() {
                self.duplicate_policy = policy;
            }
        }

        if let Ok(log_level) = std::env::var("CHAOS_REGISTRY_LOG_LEVEL") {
            self.log_level = log_level;
        }

        self
    }

    /// Get the socket address for the server
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| format!("Invalid address: {}", e))
    }

    /// Get the full server URL (e.g., "http://127.0.0.1:5000")
    #[must_use]
    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port cannot be zero".to_string());
        }

        if self.host.is_empty() {
            return Err("Host cannot be empty".to_string());
        }

        if let Some(dir) = &self.static_dir {
            if !dir.is_dir() {
                return Err(format!("Static directory does not exist: {}", dir.display()));
            }
        }

        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                self.log_level
            ));
        }

        Ok(())
    }
}
