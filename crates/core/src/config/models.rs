//! Configuration models that aggregate all settings.
//!
//! This module provides the unified `AppConfig` structure that combines the
//! settings file with a snapshot of the variable store.

use rp_protocol::config_models::Settings;
use rp_protocol::variable_models::Variable;

/// Unified application configuration loaded from `.robot-panel/`.
///
/// This structure aggregates all configuration sources:
/// - `config.toml`: Settings
/// - `variables.json`: External variables
///
/// # Example
///
/// ```rust,no_run
/// use rp_core::config::loader::load_config;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("."))?;
/// println!("Launching '{}' with {} variables",
///          config.settings.executable,
///          config.variables.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Settings from `config.toml`.
    pub settings: Settings,

    /// Variables from `variables.json`, in file order.
    pub variables: Vec<Variable>,
}
