//! Configuration for the ledger connection

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ledger connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON-RPC endpoint of the node
    pub rpc_url: String,

    /// Address of the IOU contract
    pub contract_address: String,

    /// Per-request HTTP timeout (milliseconds)
    pub request_timeout_ms: u64,

    /// Gas limit attached to writes
    pub gas_limit: u64,

    /// Retry configuration for reads
    pub retry: RetryConfig,

    /// Receipt polling configuration for writes
    pub receipt: ReceiptConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            contract_address: "0x0000000000000000000000000000000000000000".to_string(),
            request_timeout_ms: 10_000,
            gas_limit: 300_000,
            retry: RetryConfig::default(),
            receipt: ReceiptConfig::default(),
        }
    }
}

impl Config {
    /// Per-request HTTP timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

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
        if let Ok(url) = std::env::var("IOU_RPC_URL") {
            self.rpc_url = url;
        }

        if let Ok(address) = std::env::var("IOU_CONTRACT_ADDRESS") {
            self.contract_address = address;
        }

        if let Ok(timeout) = std::env::var("IOU_RPC_TIMEOUT_MS") {
            self.request_timeout_ms = timeout.parse().map_err(|e| {
                crate::Error::Config(format!("IOU_RPC_TIMEOUT_MS: {}", e))
            })?;
        }

        Ok(())
    }
}

/// Retry configuration for idempotent reads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Max attempts (including the first)
    pub max_attempts: u32,

    /// Initial retry delay (milliseconds)
    pub initial_delay_ms: u64,

    /// Max retry delay (milliseconds)
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 100,
            max_delay_ms: 2_000,
        }
    }
}

/// Receipt polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptConfig {
    /// Delay between receipt polls (milliseconds)
    pub poll_interval_ms: u64,

    /// Give up waiting after this long (milliseconds)
    pub timeout_ms: u64,
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 250,
            timeout_ms: 60_000,
        }
    }
}
