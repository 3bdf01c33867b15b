//! Pool configuration from a TOML file and environment variables
//!
//! Resolution order, later wins:
//!
//! 1. built-in defaults (`4096 × 32`)
//! 2. `[pool]` table of the file named by `STRPOOL_CONFIG_FILE` (default
//!    `strpool.toml`, skipped when absent)
//! 3. `STRPOOL_BUCKET_COUNT` / `STRPOOL_BUCKET_CAPACITY`
//!
//! ```toml
//! [pool]
//! bucket_count = 1024
//! bucket_capacity = 16
//! ```

use crate::Error;
use interned::PoolConfig;
use serde::Deserialize;
use std::io::ErrorKind;

pub const ENV_CONFIG_FILE: &str = "STRPOOL_CONFIG_FILE";
pub const DEFAULT_CONFIG_FILE: &str = "strpool.toml";
pub const ENV_BUCKET_COUNT: &str = "STRPOOL_BUCKET_COUNT";
pub const ENV_BUCKET_CAPACITY: &str = "STRPOOL_BUCKET_CAPACITY";

/// Values that can be read from an environment variable
trait ParseFromEnv: Sized {
    /// Parse an already trimmed, non-empty value
    fn parse_env_value(value: &str) -> Option<Self>;
}

impl ParseFromEnv for String {
    #[inline]
    fn parse_env_value(value: &str) -> Option<String> { Some(value.to_owned()) }
}

impl ParseFromEnv for usize {
    #[inline]
    fn parse_env_value(value: &str) -> Option<usize> { value.parse().ok() }
}

/// Read `key` through `lookup`, `default` when unset, blank or unparsable
fn parse_with<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: ParseFromEnv,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return default;
    }
    match T::parse_env_value(trimmed) {
        Some(value) => value,
        None => {
            tracing::warn!(key, value = trimmed, "ignoring unparsable environment value");
            default
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    pool: PoolSection,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PoolSection {
    bucket_count: usize,
    bucket_capacity: usize,
}

impl Default for PoolSection {
    fn default() -> Self {
        let PoolConfig { bucket_count, bucket_capacity } = PoolConfig::default();
        Self { bucket_count, bucket_capacity }
    }
}

/// Resolved configuration of the shared pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config {
    pub pool: PoolConfig,
}

impl Config {
    /// Resolve from the process environment
    #[inline]
    pub fn load() -> Result<Self, Error> { Self::from_lookup(|key| std::env::var(key).ok()) }

    /// Resolve with `lookup` standing in for the environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where F: Fn(&str) -> Option<String> {
        let path = parse_with(&lookup, ENV_CONFIG_FILE, DEFAULT_CONFIG_FILE.to_owned());

        let mut pool = match std::fs::read_to_string(&path) {
            Ok(text) => Self::from_toml_str(&text)?.pool,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path, "no config file, using defaults");
                PoolConfig::default()
            }
            Err(source) => return Err(Error::Io { path, source }),
        };

        pool.bucket_count = parse_with(&lookup, ENV_BUCKET_COUNT, pool.bucket_count);
        pool.bucket_capacity = parse_with(&lookup, ENV_BUCKET_CAPACITY, pool.bucket_capacity);
        pool.validate()?;

        Ok(Self { pool })
    }

    /// Parse and validate a config file body
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        let file: FileConfig = toml::from_str(text)?;
        let pool = PoolConfig::new(file.pool.bucket_count, file.pool.bucket_capacity);
        pool.validate()?;
        Ok(Self { pool })
    }
}
