//! Run configuration assembler.
//!
//! Turns a [`RunRequest`] into the exact argv handed to the external
//! test-automation tool. Assembly is deterministic: the same request always
//! yields the same [`CommandLine`].
//!
//! Token order:
//!
//! ```text
//! [--loglevel L] [--outputdir D] [--dryrun] [--exitonfailure] [extra args..]
//! [-v NAME:VALUE..] [--test NAME.. | --include TAG..] SUITE
//! ```

use crate::error::RunError;
use rp_protocol::request_models::{RunRequest, SelectionMode};
use rp_protocol::variable_models::{Variable, VariableKind};
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

pub const TEST_FLAG: &str = "--test";
pub const INCLUDE_FLAG: &str = "--include";
pub const VARIABLE_FLAG: &str = "-v";
pub const LOG_LEVEL_FLAG: &str = "--loglevel";
pub const OUTPUT_DIR_FLAG: &str = "--outputdir";
pub const DRY_RUN_FLAG: &str = "--dryrun";
pub const EXIT_ON_FAILURE_FLAG: &str = "--exitonfailure";

/// A fully assembled invocation of the external tool.
///
/// Arguments are passed to the process as discrete tokens; they are never
/// joined into a string for a shell to re-parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// Executable to launch, resolved through `PATH` by the OS.
    pub program: String,

    /// Ordered arguments. The last one is always the suite.
    pub args: Vec<String>,

    /// Directory containing the suite; the process starts there so
    /// relative resource paths inside the suite resolve.
    pub working_dir: PathBuf,
}

impl CommandLine {
    /// Program followed by its arguments, for display and logging.
    pub fn to_argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

/// Assemble the command line for `request`.
///
/// # Errors
///
/// Returns [`RunError::InvalidRequest`] if:
/// - the suite path is not an existing, readable regular file
/// - a selected name is blank or listed twice
/// - a variable has an empty name, a name containing `:`, a duplicated
///   name, or a value that does not fit its kind
/// - the extra arguments contain unbalanced quotes
pub fn build_command_line(request: &RunRequest, program: &str) -> Result<CommandLine, RunError> {
    check_suite(&request.suite_path)?;
    check_selected_names(&request.selected_names)?;

    let mut args = Vec::new();

    if let Some(level) = request.log_level {
        args.push(LOG_LEVEL_FLAG.to_string());
        args.push(level.as_str().to_string());
    }

    if let Some(dir) = &request.output_dir {
        args.push(OUTPUT_DIR_FLAG.to_string());
        args.push(dir.to_string_lossy().into_owned());
    }

    if request.dry_run {
        args.push(DRY_RUN_FLAG.to_string());
    }

    if request.exit_on_failure {
        args.push(EXIT_ON_FAILURE_FLAG.to_string());
    }

    // Split the way a POSIX shell would, but no shell ever sees them.
    let extra = shlex::split(&request.extra_args).ok_or_else(|| {
        RunError::InvalidRequest(format!(
            "additional arguments have unbalanced quotes or a trailing backslash: {}",
            request.extra_args
        ))
    })?;
    args.extend(extra);

    let mut seen_vars = HashSet::new();
    for variable in &request.variables {
        if !seen_vars.insert(variable.name.trim()) {
            return Err(RunError::InvalidRequest(format!(
                "variable '{}' is defined more than once",
                variable.name
            )));
        }
        args.push(VARIABLE_FLAG.to_string());
        args.push(variable_token(variable)?);
    }

    let selector = match request.selection_mode {
        SelectionMode::ByTestCase => TEST_FLAG,
        SelectionMode::ByTag => INCLUDE_FLAG,
    };
    for name in &request.selected_names {
        args.push(selector.to_string());
        args.push(name.clone());
    }

    let (working_dir, suite_arg) = split_suite_path(&request.suite_path)?;
    args.push(suite_arg);

    Ok(CommandLine {
        program: program.to_string(),
        args,
        working_dir,
    })
}

/// Render one variable as the `NAME:VALUE` token that follows `-v`.
pub fn variable_token(variable: &Variable) -> Result<String, RunError> {
    let name = variable.name.trim();
    if name.is_empty() {
        return Err(RunError::InvalidRequest(
            "variable name must not be empty".to_string(),
        ));
    }
    if name.contains(':') {
        return Err(RunError::InvalidRequest(format!(
            "variable name '{name}' must not contain ':'"
        )));
    }

    let value = match variable.kind {
        VariableKind::Boolean => parse_bool(&variable.value).to_string(),
        VariableKind::Integer => {
            let trimmed = variable.value.trim();
            trimmed
                .parse::<i64>()
                .map_err(|_| {
                    RunError::InvalidRequest(format!(
                        "variable '{name}' expects an integer, got '{trimmed}'"
                    ))
                })?
                .to_string()
        }
        VariableKind::Choice => {
            if !variable.options.is_empty() && !variable.options.contains(&variable.value) {
                return Err(RunError::InvalidRequest(format!(
                    "variable '{name}' must be one of [{}], got '{}'",
                    variable.options.join(", "),
                    variable.value
                )));
            }
            variable.value.clone()
        }
        // Passwords travel in plain text; anyone who can list processes sees them.
        VariableKind::String | VariableKind::Password => variable.value.clone(),
    };

    Ok(format!("{name}:{value}"))
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "on" | "1"
    )
}

fn check_suite(path: &Path) -> Result<(), RunError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        RunError::InvalidRequest(format!("suite '{}' is not accessible: {e}", path.display()))
    })?;
    if !metadata.is_file() {
        return Err(RunError::InvalidRequest(format!(
            "suite '{}' is not a file",
            path.display()
        )));
    }
    File::open(path).map_err(|e| {
        RunError::InvalidRequest(format!("suite '{}' is not readable: {e}", path.display()))
    })?;
    Ok(())
}

fn check_selected_names(names: &[String]) -> Result<(), RunError> {
    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(RunError::InvalidRequest(
                "selected names must not be empty".to_string(),
            ));
        }
        if !seen.insert(name.as_str()) {
            return Err(RunError::InvalidRequest(format!(
                "'{name}' is selected more than once"
            )));
        }
    }
    Ok(())
}

/// Split the suite path into the process working directory and the
/// positional argument relative to it.
fn split_suite_path(path: &Path) -> Result<(PathBuf, String), RunError> {
    let file_name = path.file_name().ok_or_else(|| {
        RunError::InvalidRequest(format!("suite '{}' has no file name", path.display()))
    })?;
    let working_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((working_dir, file_name.to_string_lossy().into_owned()))
}
