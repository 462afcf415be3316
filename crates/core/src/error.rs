//! Error types for assembling and supervising runs.

use thiserror::Error;

/// Errors surfaced to the host when a run cannot proceed.
///
/// Normal outcomes (passed, failed, cancelled) are never errors; they are
/// reported through `RunResult::status`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    /// The run request is malformed. Never retried.
    #[error("Invalid run request: {0}")]
    InvalidRequest(String),

    /// The external tool could not be started.
    #[error("Failed to launch test tool: {0}")]
    LaunchFailed(String),

    /// Another run already owns the subprocess slot.
    #[error("A run is already in progress")]
    Busy,

    /// The operation is not valid in the supervisor's current state.
    #[error("Operation '{operation}' is not valid while {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },
}
