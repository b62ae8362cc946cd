use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use tracing::warn;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub moderation: ModerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Which backing store the response cache talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheBackendKind {
    Memory,
    Redis,
    Disabled,
}

impl FromStr for CacheBackendKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheBackendKind::Memory),
            "redis" => Ok(CacheBackendKind::Redis),
            "none" | "off" | "disabled" => Ok(CacheBackendKind::Disabled),
            other => Err(AppError::Configuration(format!(
                "unknown CACHE_BACKEND '{}', expected memory, redis or none",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub backend: CacheBackendKind,
    pub redis_url: String,
    pub ttl_secs: u64,
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// Number of reports after which a node is flagged.
    pub report_threshold: usize,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self { report_threshold: 1 }
    }
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        // A missing .env is normal outside development
        let _ = dotenvy::dotenv();

        let report_threshold: usize = parse_var("REPORT_THRESHOLD", 1)?;
        if report_threshold == 0 {
            return Err(AppError::Configuration(
                "REPORT_THRESHOLD must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite:data/campus_forum.db?mode=rwc".to_string()),
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("SERVER_PORT", 8000)?,
            },
            cache: CacheConfig {
                backend: env::var("CACHE_BACKEND")
                    .unwrap_or_else(|_| "memory".to_string())
                    .parse()?,
                redis_url: env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
                ttl_secs: parse_var("CACHE_TTL_SECS", 3600)?,
                capacity: parse_var("CACHE_CAPACITY", 1000)?,
            },
            moderation: ModerationConfig { report_threshold },
        })
    }

    /// Configuration for tests: in-memory SQLite, in-memory cache.
    pub fn in_memory() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            cache: CacheConfig {
                backend: CacheBackendKind::Memory,
                redis_url: String::new(),
                ttl_secs: 3600,
                capacity: 1000,
            },
            moderation: ModerationConfig::default(),
        }
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e| {
            warn!("Invalid {} value '{}': {}", key, raw, e);
            AppError::Configuration(format!("invalid {}: {}", key, e))
        }),
        Err(_) => Ok(default),
    }
}
