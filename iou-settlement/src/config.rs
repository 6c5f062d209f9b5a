//! Configuration for the settlement client

use crate::oracle::DEFAULT_CONCURRENCY;
use crate::scanner::ScanOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settlement client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ledger connection
    pub ledger: iou_ledger::Config,

    /// History scan limits
    pub scan: ScanConfig,

    /// Path search and balance lookup settings
    pub search: SearchConfig,
}

/// History scan limits
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Give up on a scan after this many seconds
    pub timeout_secs: Option<u64>,

    /// Give up on a scan after this many blocks
    pub max_blocks: Option<u64>,
}

impl ScanConfig {
    /// Scanner options for these limits
    pub fn options(&self) -> ScanOptions {
        ScanOptions {
            timeout: self.timeout_secs.map(Duration::from_secs),
            max_blocks: self.max_blocks,
        }
    }
}

/// Path search and balance lookup settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Balance lookups in flight at once
    pub lookup_concurrency: usize,

    /// Longest settlement path explored (in edges)
    pub max_path_len: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            lookup_concurrency: DEFAULT_CONCURRENCY,
            max_path_len: None,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from environment variables
    pub fn apply_env(&mut self) -> crate::Result<()> {
        self.ledger.apply_env()?;

        if let Some(timeout) = parse_env("IOU_SCAN_TIMEOUT_SECS")? {
            self.scan.timeout_secs = Some(timeout);
        }

        if let Some(concurrency) = parse_env("IOU_LOOKUP_CONCURRENCY")? {
            self.search.lookup_concurrency = concurrency;
        }

        if let Some(max_len) = parse_env("IOU_MAX_PATH_LEN")? {
            self.search.max_path_len = Some(max_len);
        }

        Ok(())
    }
}

fn parse_env<T>(name: &str) -> crate::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|e| crate::Error::Config(format!("{}: {}", name, e))),
        Err(_) => Ok(None),
    }
}
