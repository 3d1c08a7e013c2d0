//! Configuration management for the reviewer service
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (REVIEWER_*, APP_PORT)
//! 3. Config file (~/.config/reviewer/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind: String,

    /// Upper bound on the time spent handling one request
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// How long in-flight requests may drain after a shutdown signal
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            request_timeout: Duration::from_secs(15),
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// How long a writer waits for the database lock
    #[serde(with = "humantime_serde")]
    pub busy_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("reviewer")
            .join("reviewer.db");

        Self {
            path,
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl DatabaseConfig {
    /// Create a new database config with the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive used when RUST_LOG is unset
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/reviewer/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("reviewer").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - REVIEWER_BIND: listen address
    /// - APP_PORT: listen port, either `8080` or `:8080` (ignored when REVIEWER_BIND is set)
    /// - REVIEWER_DB_PATH: SQLite database file
    /// - REVIEWER_LOG: log filter directive
    pub fn with_env_overrides(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(bind) = lookup("REVIEWER_BIND") {
            self.server.bind = bind;
        } else if let Some(port) = lookup("APP_PORT") {
            self.server.bind = bind_from_port(&port);
        }

        if let Some(path) = lookup("REVIEWER_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }

        if let Some(filter) = lookup("REVIEWER_LOG") {
            self.log.filter = filter;
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, bind: Option<String>, db_path: Option<PathBuf>) -> Self {
        if let Some(bind) = bind {
            self.server.bind = bind;
        }

        if let Some(path) = db_path {
            self.database.path = path;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(
        config_file: Option<&Path>,
        bind: Option<String>,
        db_path: Option<PathBuf>,
    ) -> Result<Self> {
        let base = match config_file {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load()?,
        };

        Ok(base.with_env_overrides().with_cli_overrides(bind, db_path))
    }
}

fn bind_from_port(port: &str) -> String {
    let port = port.trim();
    match port.strip_prefix(':') {
        Some(bare) => format!("0.0.0.0:{}", bare),
        None if port.contains(':') => port.to_string(),
        None => format!("0.0.0.0:{}", port),
    }
}
