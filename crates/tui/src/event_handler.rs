//! Event handling for the TUI.
//!
//! This module provides functions for handling different types of events:
//! - Core events (from the rp-core session)
//! - Keyboard events (user input)

use crate::event::EventStatus;
use crate::widgets::OutputView;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use rp_protocol::ipc::{Event, Op};
use rp_protocol::process_models::{RunResult, RunState};
use rp_protocol::request_models::RunRequest;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// What the TUI knows about the current (or last) run.
#[derive(Debug, Default)]
pub struct RunView {
    pub run_id: Option<Uuid>,
    /// Argv of the current run, for display.
    pub command: Vec<String>,
    pub lines: Vec<String>,
    pub state: RunState,
    pub result: Option<RunResult>,
    /// Why the last start request was refused.
    pub rejection: Option<String>,
    pub cancelling: bool,
    /// Runs started in this session.
    pub runs: usize,
    pub started: Option<Instant>,
}

impl RunView {
    pub fn elapsed(&self) -> Option<Duration> {
        self.started.map(|s| s.elapsed())
    }

    /// Forget the previous run before a new one is requested.
    fn begin_request(&mut self) {
        self.state = RunState::Launching;
        self.rejection = None;
        self.cancelling = false;
    }
}

/// Handle an event received from the core.
pub fn handle_core_event(view: &mut RunView, event: Event) {
    match event {
        Event::RunStarted { run_id, command } => {
            view.run_id = Some(run_id);
            view.command = command;
            view.lines.clear();
            view.result = None;
            view.state = RunState::Streaming;
            view.runs += 1;
            view.started = Some(Instant::now());
        }
        Event::OutputLine { run_id, line } => {
            if view.run_id == Some(run_id) {
                view.lines.push(line);
            }
        }
        Event::RunFinished { result } => {
            if view.run_id == Some(result.run_id) {
                view.state = RunState::Completed;
                view.cancelling = false;
                view.result = Some(result);
            }
        }
        Event::RunRejected { reason } => {
            view.state = match view.state {
                // Announced, but the process never came up.
                RunState::Streaming => RunState::LaunchFailed,
                _ if view.result.is_some() => RunState::Completed,
                _ => RunState::Idle,
            };
            view.rejection = Some(reason);
        }
    }
}

/// Handle a keyboard event from the user.
///
/// Returns `true` if the application should exit, `false` otherwise.
pub fn handle_keyboard_event(
    key_event: KeyEvent,
    view: &mut RunView,
    output: &mut OutputView,
    request: &RunRequest,
    op_tx: &UnboundedSender<Op>,
) -> bool {
    if key_event.kind != KeyEventKind::Press {
        return false;
    }

    if output.handle_key_event(key_event, view.lines.len()) == EventStatus::Consumed {
        return false;
    }

    let ctrl_c = key_event.code == KeyCode::Char('c')
        && key_event.modifiers.contains(KeyModifiers::CONTROL);

    match key_event.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        _ if ctrl_c => {
            if view.state == RunState::Streaming {
                request_cancel(view, op_tx);
            } else {
                return true;
            }
        }
        KeyCode::Char('r') => {
            if !view.state.is_active() {
                view.begin_request();
                output.reset();
                let _ = op_tx.send(Op::StartRun {
                    request: request.clone(),
                });
            }
        }
        KeyCode::Char('c') => {
            if view.state == RunState::Streaming {
                request_cancel(view, op_tx);
            }
        }
        _ => {}
    }

    false
}

fn request_cancel(view: &mut RunView, op_tx: &UnboundedSender<Op>) {
    if !view.cancelling {
        view.cancelling = true;
        let _ = op_tx.send(Op::CancelRun);
    }
}
