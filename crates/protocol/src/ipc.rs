//! Inter-process communication protocol.
//!
//! This module defines the message types for asynchronous communication
//! between a host shell (the TUI) and the core session.
//!
//! The protocol follows an Operation/Event pattern:
//! - `Op`: Commands sent from the host to the core
//! - `Event`: Status updates sent from the core to the host
//!
//! Output lines are published as they are read, so the host can render a
//! long-running execution live.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::process_models::RunResult;
use crate::request_models::RunRequest;

/// Operations sent from the host to the core session.
///
/// Uses tagged enum serialization for TypeScript compatibility:
/// ```json
/// {
///   "type": "startRun",
///   "payload": {
///     "request": { "suitePath": "tests/login.robot" }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Op {
    /// Assemble and launch a run.
    ///
    /// Rejected with `Event::RunRejected` while another run is active.
    StartRun { request: RunRequest },

    /// Request termination of the active run.
    CancelRun,

    /// Stop serving operations. An active run is cancelled first.
    Shutdown,
}

/// Events sent from the core session to the host.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// The external tool is running.
    RunStarted {
        #[ts(type = "string")]
        run_id: Uuid,
        /// The program followed by its arguments, for display.
        command: Vec<String>,
    },

    /// The external tool produced a line on stdout or stderr.
    OutputLine {
        #[ts(type = "string")]
        run_id: Uuid,
        line: String,
    },

    /// The run reached its terminal status.
    RunFinished { result: RunResult },

    /// The request could not be turned into a running process.
    ///
    /// Covers invalid requests, launch failures and a busy supervisor.
    RunRejected { reason: String },
}
