//! External variable models for `.robot-panel/variables.json`.
//!
//! Variables are injected into every run as `-v NAME:VALUE`. The kind only
//! drives how the host edits the value and how the value is normalized on
//! the command line.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// The editing kind of an external variable.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    #[default]
    String,
    Integer,
    Boolean,

    /// One of a fixed set of `options`.
    Choice,

    /// Masked in the UI, but passed to the tool in plain text.
    Password,
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VariableKind::String => "string",
            VariableKind::Integer => "integer",
            VariableKind::Boolean => "boolean",
            VariableKind::Choice => "choice",
            VariableKind::Password => "password",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for VariableKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(VariableKind::String),
            "integer" => Ok(VariableKind::Integer),
            "boolean" => Ok(VariableKind::Boolean),
            "choice" => Ok(VariableKind::Choice),
            "password" => Ok(VariableKind::Password),
            other => Err(format!("unknown variable type '{other}'")),
        }
    }
}

/// A named value injected into the external tool.
///
/// # Example
///
/// ```json
/// {
///   "name": "HEADLESS",
///   "type": "boolean",
///   "default": "True",
///   "description": "Run browser in headless mode",
///   "value": "True"
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct Variable {
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: VariableKind,

    /// Current value as entered by the user.
    #[serde(default)]
    pub value: String,

    #[serde(default)]
    pub default: String,

    #[serde(default)]
    pub description: String,

    /// Allowed values for `VariableKind::Choice`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl Variable {
    /// Create a variable whose value and default are both `value`.
    pub fn new(name: impl Into<String>, kind: VariableKind, value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            kind,
            default: value.clone(),
            value,
            description: String::new(),
            options: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }
}
