//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;

/// Worker pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of worker tasks. Zero is allowed: jobs then stay pending.
    pub workers: usize,
    /// Maximum number of queued jobs awaiting a worker.
    pub queue_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            queue_capacity: 10,
        }
    }
}

impl PoolConfig {
    /// Build a config, validating the queue capacity.
    pub fn new(workers: usize, queue_capacity: usize) -> Result<Self, ConfigError> {
        let config = Self {
            workers,
            queue_capacity,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from `WORKER_POOL_WORKERS` and `WORKER_POOL_QUEUE_CAPACITY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let workers = env_or("WORKER_POOL_WORKERS", defaults.workers)?;
        let queue_capacity = env_or("WORKER_POOL_QUEUE_CAPACITY", defaults.queue_capacity)?;
        Self::new(workers, queue_capacity)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "queue_capacity".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// How long in-flight requests get to finish after a shutdown signal.
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            shutdown_grace: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// Load from `WORKER_POOL_PORT` and `WORKER_POOL_SHUTDOWN_GRACE_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let port = env_or("WORKER_POOL_PORT", defaults.port)?;
        let grace_secs = env_or(
            "WORKER_POOL_SHUTDOWN_GRACE_SECS",
            defaults.shutdown_grace.as_secs(),
        )?;
        Ok(Self {
            port,
            shutdown_grace: Duration::from_secs(grace_secs),
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{raw:?}: {e}"),
    })
}
