//! Global settings models for `.robot-panel/config.toml`.
//!
//! This module defines the structure of the settings file that controls how
//! the external tool is launched.

use serde::Deserialize;
use serde::Serialize;
use std::path::PathBuf;
use ts_rs::TS;

/// Default executable name of the external test-automation tool.
pub const DEFAULT_EXECUTABLE: &str = "robot";

/// Default seconds between the termination request and the forced kill.
pub const DEFAULT_GRACE_PERIOD_SECS: u64 = 5;

/// Represents settings from `.robot-panel/config.toml`.
///
/// # Example
///
/// ```toml
/// # .robot-panel/config.toml
/// executable = "robot"
/// grace_period_secs = 5
/// output_dir = "results"
/// param_history = ["--randomize all"]
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct Settings {
    /// Executable invoked for every run. Resolved through `PATH`.
    #[serde(default = "default_executable")]
    pub executable: String,

    /// Seconds to wait after a termination request before killing the tool.
    #[serde(default = "default_grace_period_secs")]
    pub grace_period_secs: u64,

    /// Output directory used when a run does not choose one.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Previously used additional arguments, most recent first.
    #[serde(default)]
    pub param_history: Vec<String>,
}

fn default_executable() -> String {
    DEFAULT_EXECUTABLE.to_string()
}

fn default_grace_period_secs() -> u64 {
    DEFAULT_GRACE_PERIOD_SECS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            grace_period_secs: DEFAULT_GRACE_PERIOD_SECS,
            output_dir: None,
            param_history: Vec::new(),
        }
    }
}
