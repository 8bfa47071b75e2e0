//! Configuration management for Authz Core

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,
    /// Redis configuration; absent disables the role cache
    pub redis: Option<RedisConfig>,
    /// Resolution engine configuration
    pub authz: AuthzConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

/// Tunables for role store access.
///
/// The cache TTL is the staleness bound for cached role lookups; the write
/// path additionally invalidates touched entries synchronously on commit, so
/// the TTL only bounds staleness for mutations that bypass this crate.
#[derive(Debug, Clone)]
pub struct AuthzConfig {
    /// TTL for cached identity role lookups, in seconds
    pub role_cache_ttl_secs: u64,
    /// Upper bound on a single role store lookup, in milliseconds.
    /// A lookup exceeding this is a `Lookup` error, never an implicit grant.
    pub lookup_timeout_ms: u64,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            role_cache_ttl_secs: 300,
            lookup_timeout_ms: 2000,
        }
    }
}

impl AuthzConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.role_cache_ttl_secs)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()
                    .unwrap_or(2),
            },
            redis: env::var("REDIS_URL").ok().map(|url| RedisConfig { url }),
            authz: AuthzConfig {
                role_cache_ttl_secs: env::var("AUTHZ_ROLE_CACHE_TTL_SECS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()
                    .unwrap_or(300),
                lookup_timeout_ms: env::var("AUTHZ_LOOKUP_TIMEOUT_MS")
                    .unwrap_or_else(|_| "2000".to_string())
                    .parse()
                    .unwrap_or(2000),
            },
        })
    }
}
