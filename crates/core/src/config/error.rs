//! Error types for configuration loading.
//!
//! This module defines all errors that can occur while reading or writing
//! the settings file and the variable store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and saving.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read a configuration file from disk.
    #[error("Failed to read config file at {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write a configuration file to disk.
    #[error("Failed to write config file at {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("Failed to parse TOML file at {path}: {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Failed to serialize settings to TOML.
    #[error("Failed to serialize settings for {path}: {source}")]
    TomlSerialize {
        path: PathBuf,
        source: toml::ser::Error,
    },

    /// Failed to parse or serialize the JSON variable store.
    #[error("Invalid variable store at {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A variable edit was rejected.
    #[error("Invalid variable '{name}': {reason}")]
    InvalidVariable { name: String, reason: String },
}

/// Type alias for Result with ConfigError.
pub type ConfigResult<T> = Result<T, ConfigError>;
