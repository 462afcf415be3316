//! Command-line arguments.

use clap::{Args, Parser, Subcommand};
use rp_protocol::request_models::{LogLevel, RunRequest};
use rp_protocol::variable_models::{Variable, VariableKind};
use std::path::PathBuf;

/// Launch Robot Framework suites and watch them run.
///
/// Settings and external variables are read from `.robot-panel/` under the
/// project root.
///
/// EXAMPLES:
///     robot-panel run tests/login.robot -t "Valid Login"
///     robot-panel run tests/ui.robot -i smoke -v BROWSER:firefox --dryrun
///     robot-panel tui tests/login.robot --start
///     robot-panel vars list
#[derive(Parser)]
#[command(name = "robot-panel")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Project root containing `.robot-panel/`
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Log debug information to stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a suite headless, streaming its console output
    ///
    /// Exit status: 0 all tests passed, 1 tests failed, 2 the tool could
    /// not run, 130 cancelled.
    Run(RunArgs),

    /// Open the interactive console for a suite
    Tui {
        #[command(flatten)]
        request: RequestArgs,

        /// Start the run immediately
        #[arg(long)]
        start: bool,
    },

    /// Manage external variables
    Vars {
        #[command(subcommand)]
        action: VarsCommand,
    },

    /// Show the additional-argument history
    History {
        /// Remove this entry from the history
        #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
        forget: Option<String>,
    },

    /// Show which test tool will be launched
    Env {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Run the suite this many times in a row
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub runs: u32,

    /// Print the final result as JSON instead of a summary line
    #[arg(long)]
    pub json: bool,
}

/// Everything that describes one run.
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Suite file to run
    pub suite: PathBuf,

    /// Run only this test case (repeatable)
    #[arg(short = 't', long = "test", value_name = "NAME", conflicts_with = "include")]
    pub tests: Vec<String>,

    /// Run only tests with this tag (repeatable)
    #[arg(short = 'i', long = "include", value_name = "TAG")]
    pub include: Vec<String>,

    /// Set a variable for this run, overriding the stored value
    #[arg(short = 'v', long = "variable", value_name = "NAME:VALUE", value_parser = parse_assignment)]
    pub variables: Vec<(String, String)>,

    /// Log level passed to the tool (TRACE, DEBUG, INFO, WARN)
    #[arg(short = 'L', long = "loglevel", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Directory for output, log and report files, relative to the
    /// current directory
    #[arg(short = 'd', long = "outputdir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Validate the suite without executing keywords
    #[arg(long)]
    pub dryrun: bool,

    /// Stop after the first failing test
    #[arg(long)]
    pub exitonfailure: bool,

    /// Additional arguments for the tool, split like a shell would
    #[arg(long = "args", value_name = "ARGS", allow_hyphen_values = true)]
    pub extra_args: Option<String>,
}

impl RequestArgs {
    /// Build the run request.
    ///
    /// `stored` supplies the kind (and options) for overridden variables
    /// so they are normalized the same way as stored values; unknown names
    /// become string variables. A relative output directory is made
    /// absolute here, since the tool itself runs in the suite's directory.
    pub fn to_request(&self, stored: &[Variable]) -> Result<RunRequest, String> {
        let log_level = match &self.log_level {
            Some(level) => LogLevel::parse_optional(level)?,
            None => None,
        };
        let output_dir = match &self.output_dir {
            Some(dir) => Some(
                std::path::absolute(dir)
                    .map_err(|e| format!("output directory '{}': {e}", dir.display()))?,
            ),
            None => None,
        };

        let variables = self
            .variables
            .iter()
            .map(|(name, value)| match stored.iter().find(|v| &v.name == name) {
                Some(existing) => Variable {
                    value: value.clone(),
                    ..existing.clone()
                },
                None => Variable::new(name.clone(), VariableKind::String, value.clone()),
            })
            .collect();

        let request = if self.include.is_empty() {
            RunRequest::new(&self.suite).with_tests(self.tests.iter().cloned())
        } else {
            RunRequest::new(&self.suite).with_tags(self.include.iter().cloned())
        };

        Ok(request
            .with_variables(variables)
            .with_log_level(log_level)
            .with_output_dir(output_dir)
            .with_dry_run(self.dryrun)
            .with_exit_on_failure(self.exitonfailure)
            .with_extra_args(self.extra_args.clone().unwrap_or_default()))
    }
}

#[derive(Subcommand)]
pub enum VarsCommand {
    /// List stored variables
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a variable
    Add {
        name: String,

        #[arg(allow_hyphen_values = true)]
        value: String,

        /// string, integer, boolean, choice or password
        #[arg(long = "type", default_value = "string")]
        kind: VariableKind,

        #[arg(long, default_value = "")]
        description: String,

        /// Allowed value for a choice variable (repeatable)
        #[arg(long = "option")]
        options: Vec<String>,
    },

    /// Remove a variable
    Remove { name: String },

    /// Change the value of a variable
    Set {
        name: String,

        #[arg(allow_hyphen_values = true)]
        value: String,
    },
}

/// Parse `NAME:VALUE`, splitting on the first colon.
fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME:VALUE, got '{s}'")),
    }
}
