//! Configuration Management Module
//!
//! Scan settings (target, init commands, capture directory, worker count,
//! loop bounds) and their JSON file storage.

pub mod storage;
pub mod types;

pub use storage::{config_dir, default_config_file, ConfigStorage, StorageError};
pub use types::{split_commands, ConfigError, ScanConfig, Tuning};
