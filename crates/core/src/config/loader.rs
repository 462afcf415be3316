//! Configuration file loader for the `.robot-panel/` directory.
//!
//! This module provides functionality to load and save:
//! - `config.toml`: Settings (executable, grace period, parameter history)
//! - `variables.json`: External variables, through [`VariableStore`]

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::AppConfig;
use crate::config::variables::VariableStore;
use rp_protocol::config_models::Settings;
use std::path::{Path, PathBuf};

/// Name of the configuration directory under the project root.
pub const CONFIG_DIR: &str = ".robot-panel";

/// Name of the settings file inside [`CONFIG_DIR`].
pub const SETTINGS_FILE: &str = "config.toml";

/// Number of additional-argument entries kept in the history.
pub const PARAM_HISTORY_LIMIT: usize = 20;

/// Path of the configuration directory for `root`.
pub fn config_dir(root: &Path) -> PathBuf {
    root.join(CONFIG_DIR)
}

/// Loads all configuration from the `.robot-panel/` directory.
///
/// # Arguments
///
/// * `root` - Root directory containing the `.robot-panel/` folder
///
/// # Returns
///
/// An `AppConfig` with the settings and a snapshot of the variable store.
/// Missing files yield defaults rather than an error.
///
/// # Errors
///
/// Returns `ConfigError` if a file exists but cannot be read or parsed.
pub fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    let settings = load_settings(root)?;
    let variables = VariableStore::new(root).load()?;

    Ok(AppConfig {
        settings,
        variables,
    })
}

/// Loads settings from `config.toml`, or defaults if it does not exist.
pub fn load_settings(root: &Path) -> ConfigResult<Settings> {
    let config_path = config_dir(root).join(SETTINGS_FILE);

    if !config_path.exists() {
        return Ok(Settings::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
            path: config_path.clone(),
            source,
        })?;

    let settings: Settings =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: config_path.clone(),
            source,
        })?;

    tracing::debug!(path = %config_path.display(), "loaded settings");

    Ok(settings)
}

/// Writes settings to `config.toml`, creating `.robot-panel/` if needed.
pub fn save_settings(root: &Path, settings: &Settings) -> ConfigResult<()> {
    let dir = config_dir(root);
    let config_path = dir.join(SETTINGS_FILE);

    std::fs::create_dir_all(&dir).map_err(|source| ConfigError::FileWrite {
        path: dir.clone(),
        source,
    })?;

    let content =
        toml::to_string_pretty(settings).map_err(|source| ConfigError::TomlSerialize {
            path: config_path.clone(),
            source,
        })?;

    std::fs::write(&config_path, content).map_err(|source| ConfigError::FileWrite {
        path: config_path,
        source,
    })
}

/// Resolve a relative `path` against `base`. Absolute paths are kept.
pub fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Resolve the configured executable against the project root.
///
/// A bare name such as `robot` is looked up on `PATH` and returned as is.
/// A relative path such as `venv/bin/robot` is taken relative to `root`,
/// because the tool runs in the suite's directory.
pub fn resolve_executable(root: &Path, executable: &str) -> String {
    let path = Path::new(executable);
    if path.components().count() > 1 && path.is_relative() {
        root.join(path).to_string_lossy().into_owned()
    } else {
        executable.to_string()
    }
}

/// Put `args` at the front of the parameter history.
///
/// Blank entries are ignored, an existing identical entry moves to the
/// front, and the history is capped at [`PARAM_HISTORY_LIMIT`].
///
/// Returns `true` if the history changed.
pub fn remember_params(settings: &mut Settings, args: &str) -> bool {
    let args = args.trim();
    if args.is_empty() {
        return false;
    }
    if settings.param_history.first().map(String::as_str) == Some(args) {
        return false;
    }

    settings.param_history.retain(|entry| entry != args);
    settings.param_history.insert(0, args.to_string());
    settings.param_history.truncate(PARAM_HISTORY_LIMIT);
    true
}

/// Remove `args` from the parameter history. Returns `true` if it was there.
pub fn forget_params(settings: &mut Settings, args: &str) -> bool {
    let before = settings.param_history.len();
    settings.param_history.retain(|entry| entry != args.trim());
    settings.param_history.len() != before
}
