//! Execution supervisor.
//!
//! Owns the lifecycle of one external tool process at a time:
//!
//! ```text
//! Idle -> Launching -> Streaming -> Completed
//!            |
//!            +-------> LaunchFailed
//! ```
//!
//! `Completed` and `LaunchFailed` are terminal until [`Supervisor::reset`]
//! moves the supervisor back to `Idle`. Output is read on a background task
//! and forwarded line by line to a [`RunObserver`].

pub mod executor;
pub mod observer;

use crate::command::CommandLine;
use crate::error::RunError;
use chrono::{DateTime, Utc};
use executor::Signal;
use observer::RunObserver;
use rp_protocol::process_models::{RunResult, RunState, TerminalStatus};
use std::io;
use std::process::ExitStatus;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How long to keep reading output after the process exited.
///
/// A grandchild can hold the pipe open after the tool itself is gone.
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Supervises at most one external process.
///
/// Cloning yields another handle to the same supervisor, so a host can keep
/// one for cancellation while another drives runs.
#[derive(Clone)]
pub struct Supervisor {
    inner: Arc<Mutex<Inner>>,
    grace_period: Duration,
}

struct Inner {
    state: RunState,
    active: Option<ActiveRun>,
    last_result: Option<RunResult>,
}

struct ActiveRun {
    run_id: Uuid,
    cancel: Arc<Notify>,
    cancelling: bool,
    /// The process is gone and only its remaining output is being read.
    exited: bool,
}

impl Supervisor {
    /// Create an idle supervisor.
    ///
    /// `grace_period` is how long a cancelled process gets to exit before it
    /// is killed.
    pub fn new(grace_period: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: RunState::Idle,
                active: None,
                last_result: None,
            })),
            grace_period,
        }
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.lock().state
    }

    /// Result of the most recent finished run, including launch failures.
    pub fn last_result(&self) -> Option<RunResult> {
        self.lock().last_result.clone()
    }

    /// Id of the run currently owning the process slot.
    pub fn active_run(&self) -> Option<Uuid> {
        self.lock().active.as_ref().map(|run| run.run_id)
    }

    /// Launch `command` under a fresh run id.
    ///
    /// See [`Supervisor::start_with_id`].
    pub fn start(
        &self,
        command: CommandLine,
        observer: Arc<dyn RunObserver>,
    ) -> Result<RunHandle, RunError> {
        self.start_with_id(Uuid::new_v4(), command, observer)
    }

    /// Launch `command` and start streaming its output to `observer`.
    ///
    /// Must be called from within a Tokio runtime. Only valid while `Idle`.
    ///
    /// # Errors
    ///
    /// - [`RunError::Busy`] if a run is launching or streaming
    /// - [`RunError::InvalidState`] if the previous run has not been reset
    /// - [`RunError::LaunchFailed`] if the process could not be created; the
    ///   supervisor is then in `LaunchFailed` and `last_result` holds a
    ///   `LaunchError` result. Launches are never retried.
    pub fn start_with_id(
        &self,
        run_id: Uuid,
        command: CommandLine,
        observer: Arc<dyn RunObserver>,
    ) -> Result<RunHandle, RunError> {
        let started_at = Utc::now();

        {
            let mut inner = self.lock();
            match inner.state {
                RunState::Idle => inner.state = RunState::Launching,
                state if state.is_active() => return Err(RunError::Busy),
                state => {
                    return Err(RunError::InvalidState {
                        operation: "start",
                        state: format!("{state:?}"),
                    })
                }
            }
        }

        info!(
            %run_id,
            argv = ?command.to_argv(),
            cwd = %command.working_dir.display(),
            "launching test tool"
        );

        let spawned = match executor::spawn(&command) {
            Ok(spawned) => spawned,
            Err(e) => {
                let reason = format!("could not start '{}': {e}", command.program);
                warn!(%run_id, %reason, "launch failed");
                let mut inner = self.lock();
                inner.state = RunState::LaunchFailed;
                inner.last_result = Some(RunResult::launch_failure(
                    run_id,
                    started_at,
                    reason.clone(),
                ));
                return Err(RunError::LaunchFailed(reason));
            }
        };

        let executor::Spawned { child, output } = spawned;
        debug!(%run_id, pid = ?child.id(), "test tool running");

        let (signals_tx, signals_rx) = mpsc::unbounded_channel();
        let waiter = tokio::spawn(executor::wait_for_exit(child, signals_rx));
        let cancel = Arc::new(Notify::new());

        {
            let mut inner = self.lock();
            inner.state = RunState::Streaming;
            inner.active = Some(ActiveRun {
                run_id,
                cancel: Arc::clone(&cancel),
                cancelling: false,
                exited: false,
            });
        }

        let worker = Worker {
            run_id,
            started_at,
            inner: Arc::clone(&self.inner),
            observer,
            grace_period: self.grace_period,
            finished: false,
        };
        let task = tokio::spawn(worker.run(output, waiter, signals_tx, cancel));

        Ok(RunHandle {
            run_id,
            started_at,
            task,
        })
    }

    /// Request termination of the streaming run.
    ///
    /// Sends a termination request; if the process has not exited after the
    /// grace period it is killed, exactly once. Calling this again while the
    /// run is already cancelling has no effect.
    ///
    /// # Errors
    ///
    /// [`RunError::InvalidState`] unless a run is streaming, including
    /// when its process has already exited and only output is left.
    pub fn cancel(&self) -> Result<(), RunError> {
        let mut inner = self.lock();
        let state = inner.state;
        match (state, inner.active.as_mut()) {
            (RunState::Streaming, Some(run)) if run.exited && !run.cancelling => {
                Err(RunError::InvalidState {
                    operation: "cancel",
                    state: "Exited".to_string(),
                })
            }
            (RunState::Streaming, Some(run)) => {
                if !run.cancelling {
                    info!(run_id = %run.run_id, "cancelling run");
                    run.cancelling = true;
                    run.cancel.notify_one();
                }
                Ok(())
            }
            _ => Err(RunError::InvalidState {
                operation: "cancel",
                state: format!("{state:?}"),
            }),
        }
    }

    /// Return to `Idle` after a terminal state so a new run can start.
    ///
    /// Resetting an idle supervisor is a no-op.
    ///
    /// # Errors
    ///
    /// [`RunError::Busy`] while a run is launching or streaming.
    pub fn reset(&self) -> Result<(), RunError> {
        let mut inner = self.lock();
        if inner.state.is_active() {
            return Err(RunError::Busy);
        }
        inner.state = RunState::Idle;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to a launched run.
pub struct RunHandle {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    task: JoinHandle<RunResult>,
}

impl RunHandle {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Wait for the run to reach its terminal status.
    ///
    /// A supervisor task that died (for example because the observer
    /// panicked) is reported as a `LaunchError` result rather than
    /// propagated to the host.
    pub async fn wait(self) -> RunResult {
        match self.task.await {
            Ok(result) => result,
            Err(e) => RunResult::launch_failure(
                self.run_id,
                self.started_at,
                format!("supervisor task failed: {e}"),
            ),
        }
    }
}

/// Background task that forwards output and classifies the exit.
struct Worker {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    inner: Arc<Mutex<Inner>>,
    observer: Arc<dyn RunObserver>,
    grace_period: Duration,
    finished: bool,
}

impl Worker {
    async fn run(
        mut self,
        mut lines: executor::OutputLines,
        mut waiter: JoinHandle<io::Result<ExitStatus>>,
        signals: UnboundedSender<Signal>,
        cancel: Arc<Notify>,
    ) -> RunResult {
        let mut output = Vec::new();
        let mut output_done = false;
        let mut exit: Option<Result<ExitStatus, String>> = None;
        let mut kill_deadline: Option<Instant> = None;
        let mut drain_deadline: Option<Instant> = None;
        let mut terminate_sent = false;
        let mut forced_kill = false;

        while !(output_done && exit.is_some()) {
            tokio::select! {
                line = lines.next(), if !output_done => match line {
                    Some(line) => {
                        self.observer.on_line(&line);
                        output.push(line);
                    }
                    None => output_done = true,
                },
                joined = &mut waiter, if exit.is_none() => {
                    exit = Some(match joined {
                        Ok(Ok(status)) => Ok(status),
                        Ok(Err(e)) => Err(format!("failed to wait for the test tool: {e}")),
                        Err(e) => Err(format!("process waiter failed: {e}")),
                    });
                    drain_deadline = Some(Instant::now() + OUTPUT_DRAIN_TIMEOUT);
                    self.mark_exited();
                }
                _ = cancel.notified(), if kill_deadline.is_none() && exit.is_none() => {
                    debug!(run_id = %self.run_id, "sending termination request");
                    let _ = signals.send(Signal::Terminate);
                    terminate_sent = true;
                    kill_deadline = Some(Instant::now() + self.grace_period);
                }
                _ = sleep_until(kill_deadline.unwrap_or_else(Instant::now)),
                    if kill_deadline.is_some() && !forced_kill && exit.is_none() =>
                {
                    warn!(
                        run_id = %self.run_id,
                        grace_ms = self.grace_period.as_millis() as u64,
                        "test tool ignored termination request, killing it"
                    );
                    let _ = signals.send(Signal::Kill);
                    forced_kill = true;
                }
                _ = sleep_until(drain_deadline.unwrap_or_else(Instant::now)),
                    if drain_deadline.is_some() && !output_done =>
                {
                    warn!(run_id = %self.run_id, "output still open after exit, detaching");
                    output_done = true;
                }
            }
        }

        // A cancel that arrived after the exit did not change the outcome.
        let cancelled = terminate_sent;
        let (exit_code, error) = match exit {
            Some(Ok(status)) => match status.code() {
                Some(code) => (Some(code), None),
                None => (None, Some(format!("test tool terminated by {status}"))),
            },
            Some(Err(reason)) => (None, Some(reason)),
            None => (None, Some("test tool exit status unavailable".to_string())),
        };
        let status = if cancelled {
            TerminalStatus::Cancelled
        } else if error.is_some() {
            TerminalStatus::LaunchError
        } else {
            TerminalStatus::from_exit_code(exit_code)
        };

        let result = RunResult {
            run_id: self.run_id,
            exit_code,
            status,
            output_lines: output,
            error: if cancelled { None } else { error },
            forced_kill,
            started_at: self.started_at,
            finished_at: Utc::now(),
        };

        info!(
            run_id = %self.run_id,
            exit_code = ?result.exit_code,
            status = ?result.status,
            lines = result.output_lines.len(),
            "run finished"
        );

        self.finish(&result);
        self.observer.on_terminal(&result);
        result
    }

    fn mark_exited(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(run) = inner.active.as_mut().filter(|run| run.run_id == self.run_id) {
            run.exited = true;
        }
    }

    fn finish(&mut self, result: &RunResult) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.state = RunState::Completed;
        inner.active = None;
        inner.last_result = Some(result.clone());
        self.finished = true;
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // The task ended without a result (panic or runtime shutdown).
        let result = RunResult::launch_failure(
            self.run_id,
            self.started_at,
            "supervisor task ended unexpectedly".to_string(),
        );
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.state = RunState::Completed;
        inner.active = None;
        inner.last_result = Some(result);
    }
}
