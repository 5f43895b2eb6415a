//! Daemon configuration with TOML file support.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use siglink_sync::{CleanupConfig, SchedulerConfig};
use siglink_verification::ChallengeConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Config(String),
}

/// Configuration for the siglink daemon.
///
/// Can be loaded from a TOML file via [`DaemonConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default so
/// a partial file is fine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Port for the HTTP API.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Base URL of the on-chain ledger REST API.
    #[serde(default = "default_ledger_url")]
    pub ledger_url: String,

    /// Data directory for LMDB storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Sliding challenge lifetime, in seconds.
    #[serde(default = "default_challenge_ttl")]
    pub challenge_ttl_secs: u64,

    /// Inclusive signal-code range.
    #[serde(default = "default_code_min")]
    pub code_min: u32,
    #[serde(default = "default_code_max")]
    pub code_max: u32,

    /// Pause between scheduled sync ticks, in seconds.
    #[serde(default = "default_sync_interval")]
    pub sync_interval_secs: u64,

    /// Identities refreshed concurrently per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between batches within one run, in seconds.
    #[serde(default = "default_batch_delay")]
    pub batch_delay_secs: u64,

    /// Ledger-fault skips that trip the circuit breaker.
    #[serde(default = "default_breaker_threshold")]
    pub breaker_threshold: u32,

    /// How long the breaker stays open, in seconds.
    #[serde(default = "default_breaker_cooldown")]
    pub breaker_cooldown_secs: u64,

    /// Pause between cleanup sweeps, in seconds.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,

    /// Unverified claims older than this are removed, in seconds.
    #[serde(default = "default_stale_cutoff")]
    pub stale_wallet_cutoff_secs: u64,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output shape: "text" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_rpc_port() -> u16 {
    7210
}

fn default_ledger_url() -> String {
    "http://127.0.0.1:21841".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./siglink_data")
}

fn default_challenge_ttl() -> u64 {
    15 * 60
}

fn default_code_min() -> u32 {
    10_000
}

fn default_code_max() -> u32 {
    99_999
}

fn default_sync_interval() -> u64 {
    600
}

fn default_batch_size() -> usize {
    25
}

fn default_batch_delay() -> u64 {
    2
}

fn default_breaker_threshold() -> u32 {
    10
}

fn default_breaker_cooldown() -> u64 {
    1800
}

fn default_cleanup_interval() -> u64 {
    3600
}

fn default_stale_cutoff() -> u64 {
    24 * 60 * 60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl DaemonConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Config(e.to_string()))
    }

    pub fn challenge_config(&self) -> ChallengeConfig {
        ChallengeConfig {
            ttl_secs: self.challenge_ttl_secs,
            code_min: self.code_min,
            code_max: self.code_max,
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: Duration::from_secs(self.sync_interval_secs),
            batch_size: self.batch_size,
            batch_delay: Duration::from_secs(self.batch_delay_secs),
            breaker_threshold: self.breaker_threshold,
            breaker_cooldown_secs: self.breaker_cooldown_secs,
        }
    }

    pub fn cleanup_config(&self) -> CleanupConfig {
        CleanupConfig {
            stale_wallet_cutoff_secs: self.stale_wallet_cutoff_secs,
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            rpc_port: default_rpc_port(),
            ledger_url: default_ledger_url(),
            data_dir: default_data_dir(),
            challenge_ttl_secs: default_challenge_ttl(),
            code_min: default_code_min(),
            code_max: default_code_max(),
            sync_interval_secs: default_sync_interval(),
            batch_size: default_batch_size(),
            batch_delay_secs: default_batch_delay(),
            breaker_threshold: default_breaker_threshold(),
            breaker_cooldown_secs: default_breaker_cooldown(),
            cleanup_interval_secs: default_cleanup_interval(),
            stale_wallet_cutoff_secs: default_stale_cutoff(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let config = DaemonConfig::from_toml_str("").expect("empty toml parses");
        assert_eq!(config.rpc_port, 7210);
        assert_eq!(config.challenge_ttl_secs, 900);
        assert_eq!(config.code_min, 10_000);
        assert_eq!(config.code_max, 99_999);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            rpc_port = 9999
            breaker_threshold = 3
        "#;
        let config = DaemonConfig::from_toml_str(toml).expect("parses");
        assert_eq!(config.rpc_port, 9999);
        assert_eq!(config.breaker_threshold, 3);
        assert_eq!(config.batch_size, 25); // default
    }

    #[test]
    fn log_format_defaults_to_text() {
        let config = DaemonConfig::from_toml_str("").expect("parses");
        assert_eq!(config.log_format, "text");

        let config = DaemonConfig::from_toml_str("log_format = \"json\"").expect("parses");
        assert_eq!(config.log_format, "json");
    }

    #[test]
    fn unknown_keys_fall_back_to_defaults() {
        // toml deserialization ignores extra keys; a typoed key leaves
        // the real field at its default.
        let config = DaemonConfig::from_toml_str("rcp_port = 1").expect("parses");
        assert_eq!(config.rpc_port, 7210);
    }

    #[test]
    fn sub_configs_carry_the_right_values() {
        let config = DaemonConfig {
            challenge_ttl_secs: 60,
            batch_size: 5,
            ..DaemonConfig::default()
        };
        assert_eq!(config.challenge_config().ttl_secs, 60);
        assert_eq!(config.scheduler_config().batch_size, 5);
    }
}
