//! Runtime run state models.
//!
//! This module defines the structures for tracking the lifecycle of one
//! external tool process and its final outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Lifecycle state of the execution supervisor.
///
/// The state progresses through:
/// Idle -> Launching -> Streaming -> Completed
///
/// `Completed` and `LaunchFailed` are terminal; only an explicit reset
/// returns the supervisor to `Idle`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    /// No run in progress; a new run may be started.
    #[default]
    Idle,

    /// The process is being spawned.
    Launching,

    /// The process is running and its output is being forwarded.
    Streaming,

    /// The process exited (on its own or after cancellation).
    Completed,

    /// The process could not be created.
    LaunchFailed,
}

impl RunState {
    /// Whether a run currently owns the subprocess slot.
    pub fn is_active(&self) -> bool {
        matches!(self, RunState::Launching | RunState::Streaming)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::LaunchFailed)
    }
}

/// Final, non-changing classification of one run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerminalStatus {
    /// Exit code 0: every selected test passed.
    AllPassed,

    /// Exit code 1..=250: tests ran and that many failed.
    SomeFailed,

    /// The tool could not start, crashed, was killed by a signal or
    /// returned a code outside the test-failure range.
    LaunchError,

    /// The user cancelled the run.
    Cancelled,
}

/// Highest return code the external tool uses for "N tests failed".
pub const MAX_FAILED_TESTS_CODE: i32 = 250;

impl TerminalStatus {
    /// Classify a process exit.
    ///
    /// `code` is `None` when the process was terminated by a signal.
    pub fn from_exit_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => TerminalStatus::AllPassed,
            Some(c) if (1..=MAX_FAILED_TESTS_CODE).contains(&c) => TerminalStatus::SomeFailed,
            _ => TerminalStatus::LaunchError,
        }
    }
}

/// Outcome of one run, handed to the host read-only once the run is over.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    #[ts(type = "string")]
    pub run_id: Uuid,

    /// Exit code of the process, `None` if it never started or died by signal.
    pub exit_code: Option<i32>,

    pub status: TerminalStatus,

    /// Every line the process produced, in order.
    pub output_lines: Vec<String>,

    /// Why the run ended as `LaunchError`, when the exit code alone
    /// does not say (spawn errors, signals, supervisor failures).
    #[serde(default)]
    pub error: Option<String>,

    /// Whether the forced termination was issued after the grace period.
    #[serde(default)]
    pub forced_kill: bool,

    pub started_at: DateTime<Utc>,

    pub finished_at: DateTime<Utc>,
}

impl RunResult {
    /// A result for a run whose process never came to life.
    pub fn launch_failure(run_id: Uuid, started_at: DateTime<Utc>, reason: String) -> Self {
        Self {
            run_id,
            exit_code: None,
            status: TerminalStatus::LaunchError,
            output_lines: Vec::new(),
            error: Some(reason),
            forced_kill: false,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// A one-line, user-visible description of the outcome.
    pub fn summary(&self) -> String {
        match (self.status, self.exit_code) {
            (TerminalStatus::AllPassed, _) => "All tests passed".to_string(),
            (TerminalStatus::SomeFailed, Some(1)) => "1 test failed".to_string(),
            (TerminalStatus::SomeFailed, Some(n)) if n >= MAX_FAILED_TESTS_CODE => {
                format!("{n} or more tests failed")
            }
            (TerminalStatus::SomeFailed, Some(n)) => format!("{n} tests failed"),
            (TerminalStatus::SomeFailed, None) => "Some tests failed".to_string(),
            (TerminalStatus::Cancelled, _) if self.forced_kill => {
                "Run cancelled (process killed after grace period)".to_string()
            }
            (TerminalStatus::Cancelled, _) => "Run cancelled".to_string(),
            (TerminalStatus::LaunchError, code) => match (&self.error, code) {
                (Some(reason), _) => format!("Run failed: {reason}"),
                (None, Some(code)) => format!("Tool error (exit code {code})"),
                (None, None) => "Tool terminated abnormally".to_string(),
            },
        }
    }
}
