//! External variable store backed by `.robot-panel/variables.json`.
//!
//! The store is owned by the host. The core only reads a snapshot of it
//! when a run starts and never writes to it during a run.

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::loader::config_dir;
use rp_protocol::variable_models::{Variable, VariableKind};
use std::path::{Path, PathBuf};

/// Name of the variable store inside the configuration directory.
pub const VARIABLES_FILE: &str = "variables.json";

/// Variables offered when no store exists yet.
pub fn default_variables() -> Vec<Variable> {
    vec![Variable::new("HEADLESS", VariableKind::Boolean, "True")
        .with_description("Run browser in headless mode")]
}

/// Loads and saves the ordered list of external variables.
#[derive(Debug, Clone)]
pub struct VariableStore {
    path: PathBuf,
}

impl VariableStore {
    /// Store located under `root/.robot-panel/`.
    pub fn new(root: &Path) -> Self {
        Self {
            path: config_dir(root).join(VARIABLES_FILE),
        }
    }

    /// Store at an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all variables, or [`default_variables`] if the file is missing.
    pub fn load(&self) -> ConfigResult<Vec<Variable>> {
        if !self.path.exists() {
            return Ok(default_variables());
        }

        let content =
            std::fs::read_to_string(&self.path).map_err(|source| ConfigError::FileRead {
                path: self.path.clone(),
                source,
            })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: self.path.clone(),
            source,
        })
    }

    /// Replace the stored variables.
    pub fn save(&self, variables: &[Variable]) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::FileWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content =
            serde_json::to_string_pretty(variables).map_err(|source| ConfigError::Json {
                path: self.path.clone(),
                source,
            })?;

        std::fs::write(&self.path, content).map_err(|source| ConfigError::FileWrite {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!(path = %self.path.display(), count = variables.len(), "saved variables");
        Ok(())
    }

    /// Append a new variable.
    ///
    /// # Errors
    ///
    /// `InvalidVariable` if the name is blank, contains `:` or already exists.
    pub fn add(&self, variable: Variable) -> ConfigResult<Vec<Variable>> {
        let name = variable.name.trim();
        if name.is_empty() {
            return Err(ConfigError::InvalidVariable {
                name: variable.name.clone(),
                reason: "name is required".to_string(),
            });
        }
        if name.contains(':') {
            return Err(ConfigError::InvalidVariable {
                name: variable.name.clone(),
                reason: "name must not contain ':'".to_string(),
            });
        }

        let mut variables = self.load()?;
        if variables.iter().any(|v| v.name == name) {
            return Err(ConfigError::InvalidVariable {
                name: name.to_string(),
                reason: "variable already exists".to_string(),
            });
        }

        let variable = Variable {
            name: name.to_string(),
            ..variable
        };
        variables.push(variable);
        self.save(&variables)?;
        Ok(variables)
    }

    /// Remove the variable called `name`.
    pub fn remove(&self, name: &str) -> ConfigResult<Vec<Variable>> {
        let mut variables = self.load()?;
        let before = variables.len();
        variables.retain(|v| v.name != name);
        if variables.len() == before {
            return Err(ConfigError::InvalidVariable {
                name: name.to_string(),
                reason: "no such variable".to_string(),
            });
        }
        self.save(&variables)?;
        Ok(variables)
    }

    /// Update the current value of the variable called `name`.
    pub fn set_value(&self, name: &str, value: &str) -> ConfigResult<Vec<Variable>> {
        let mut variables = self.load()?;
        let variable = variables
            .iter_mut()
            .find(|v| v.name == name)
            .ok_or_else(|| ConfigError::InvalidVariable {
                name: name.to_string(),
                reason: "no such variable".to_string(),
            })?;

        if variable.kind == VariableKind::Choice
            && !variable.options.is_empty()
            && !variable.options.iter().any(|o| o == value)
        {
            return Err(ConfigError::InvalidVariable {
                name: name.to_string(),
                reason: format!("value must be one of [{}]", variable.options.join(", ")),
            });
        }

        variable.value = value.to_string();
        self.save(&variables)?;
        Ok(variables)
    }
}
