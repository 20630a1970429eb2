//! Scan configuration types

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::RetryConfig;

/// Recovery iterations allowed before the reachability probe gives up
pub const PROBE_RECOVERY_BOUND: usize = 6;
/// Recovery iterations allowed before a candidate is submitted anyway
pub const ATTEMPT_RECOVERY_BOUND: usize = 10;
/// Reads allowed while waiting for a blank screen to be painted
pub const WAIT_BOUND: usize = 7;
/// First progressive wait timeout; slow regions need several hundred ms
pub const WAIT_INITIAL_MS: u64 = 300;
/// Added to the wait timeout after every empty read
pub const WAIT_STEP_MS: u64 = 100;
/// Extra wait when the sign-off screen is late
pub const SIGNOFF_WAIT_MS: u64 = 1000;
/// Quiet period that ends a plain drain of pending updates
pub const DRAIN_TIMEOUT_MS: u64 = 200;

/// Loop bounds and timeouts for driving the screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub probe_recovery_bound: usize,
    pub attempt_recovery_bound: usize,
    pub wait_bound: usize,
    pub wait_initial_ms: u64,
    pub wait_step_ms: u64,
    pub signoff_wait_ms: u64,
    pub drain_timeout_ms: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            probe_recovery_bound: PROBE_RECOVERY_BOUND,
            attempt_recovery_bound: ATTEMPT_RECOVERY_BOUND,
            wait_bound: WAIT_BOUND,
            wait_initial_ms: WAIT_INITIAL_MS,
            wait_step_ms: WAIT_STEP_MS,
            signoff_wait_ms: SIGNOFF_WAIT_MS,
            drain_timeout_ms: DRAIN_TIMEOUT_MS,
        }
    }
}

impl Tuning {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    pub fn signoff_wait(&self) -> Duration {
        Duration::from_millis(self.signoff_wait_ms)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Target host is not set")]
    MissingHost,

    #[error("Port must be non-zero")]
    InvalidPort,

    #[error("Thread count must be at least 1")]
    InvalidThreads,

    #[error("No initialization commands configured")]
    NoCommands,
}

/// Everything needed to probe and enumerate one target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Target host
    #[serde(default)]
    pub host: String,

    /// TN3270 port (default: 23)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Commands that get from a fresh screen into CICS, separated by `;`
    #[serde(default = "default_commands")]
    pub commands: String,

    /// Directory for screens of transactions that paint something
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Extra transaction IDs, one per line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idlist: Option<PathBuf>,

    /// Concurrent sessions
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Connection (and first screen) timeout in seconds
    #[serde(default = "default_timeout")]
    pub connect_timeout_secs: u64,

    /// Stop the scan at the first valid transaction
    #[serde(default)]
    pub stop_on_first: bool,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub tuning: Tuning,
}

fn default_port() -> u16 {
    23
}

fn default_commands() -> String {
    "cics".to_string()
}

fn default_threads() -> usize {
    4
}

fn default_timeout() -> u64 {
    10
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            commands: default_commands(),
            output_dir: None,
            idlist: None,
            threads: default_threads(),
            connect_timeout_secs: default_timeout(),
            stop_on_first: false,
            retry: RetryConfig::default(),
            tuning: Tuning::default(),
        }
    }
}

impl ScanConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Init commands in the order they are sent
    pub fn init_commands(&self) -> Vec<String> {
        split_commands(&self.commands)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingHost);
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.threads == 0 {
            return Err(ConfigError::InvalidThreads);
        }
        if self.init_commands().is_empty() {
            return Err(ConfigError::NoCommands);
        }
        Ok(())
    }
}

/// Split a command string on `;`, trimming whitespace around each command.
///
/// Empty pieces between separators are kept: an empty command is a bare
/// Enter, which some logon screens need.
pub fn split_commands(commands: &str) -> Vec<String> {
    if commands.trim().is_empty() {
        return Vec::new();
    }
    commands.split(';').map(|c| c.trim().to_string()).collect()
}
