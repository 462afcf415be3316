//! Run request models.
//!
//! A `RunRequest` is everything the user chose for one run: the suite, which
//! tests or tags to select, the variables to inject and the execution flags.
//! It is created fresh for every run and never mutated once handed over to
//! the command assembler.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use ts_rs::TS;

use crate::variable_models::Variable;

/// How `RunRequest::selected_names` are interpreted.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "camelCase")]
pub enum SelectionMode {
    /// Each name selects a test case (`--test NAME`).
    #[default]
    ByTestCase,

    /// Each name selects a tag (`--include NAME`).
    ByTag,
}

/// Log level passed to the external tool with `--loglevel`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
}

impl LogLevel {
    /// All levels in increasing severity.
    pub const ALL: [LogLevel; 4] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
    ];

    /// The literal the external tool expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
        }
    }

    /// Parse a user-supplied level where a blank string means "not set".
    ///
    /// Leaving the level unset keeps the external tool's own default.
    pub fn parse_optional(s: &str) -> Result<Option<LogLevel>, String> {
        if s.trim().is_empty() {
            return Ok(None);
        }
        s.parse().map(Some)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        LogLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                format!("unknown log level '{trimmed}' (expected TRACE, DEBUG, INFO or WARN)")
            })
    }
}

/// A finalized run configuration built by the host from user input.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    /// Path to the suite file handed to the external tool.
    pub suite_path: PathBuf,

    /// Whether `selected_names` are test case names or tags.
    #[serde(default)]
    pub selection_mode: SelectionMode,

    /// Selected test cases or tags, in order. Empty means "run everything".
    #[serde(default)]
    pub selected_names: Vec<String>,

    /// Variables injected with `-v NAME:VALUE`, in order.
    #[serde(default)]
    pub variables: Vec<Variable>,

    /// Optional log level. `None` leaves the tool's default untouched.
    #[serde(default)]
    pub log_level: Option<LogLevel>,

    /// Optional output directory for the tool's reports.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub exit_on_failure: bool,

    /// Free-form additional arguments, split into words before launch.
    #[serde(default)]
    pub extra_args: String,
}

impl RunRequest {
    /// Create a request that runs the whole suite with default flags.
    pub fn new(suite_path: impl Into<PathBuf>) -> Self {
        Self {
            suite_path: suite_path.into(),
            selection_mode: SelectionMode::ByTestCase,
            selected_names: Vec::new(),
            variables: Vec::new(),
            log_level: None,
            output_dir: None,
            dry_run: false,
            exit_on_failure: false,
            extra_args: String::new(),
        }
    }

    /// Select test cases by name.
    pub fn with_tests<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection_mode = SelectionMode::ByTestCase;
        self.selected_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Select tests by tag.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection_mode = SelectionMode::ByTag;
        self.selected_names = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_variables(mut self, variables: Vec<Variable>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_log_level(mut self, level: Option<LogLevel>) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.output_dir = dir;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_exit_on_failure(mut self, exit_on_failure: bool) -> Self {
        self.exit_on_failure = exit_on_failure;
        self
    }

    pub fn with_extra_args(mut self, extra_args: impl Into<String>) -> Self {
        self.extra_args = extra_args.into();
        self
    }
}
