//! Headless `run` command.

use crate::args::RunArgs;
use color_eyre::eyre::{eyre, Result};
use colored::Colorize;
use rp_core::error::RunError;
use rp_core::session::Session;
use rp_core::supervisor::observer::RunObserver;
use rp_protocol::process_models::{RunResult, TerminalStatus};
use rp_protocol::request_models::RunRequest;
use std::path::Path;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Exit status for a run that was cancelled with Ctrl-C.
pub const EXIT_CANCELLED: u8 = 130;

/// Exit status when the tool could not run or the request was invalid.
pub const EXIT_TOOL_ERROR: u8 = 2;

/// Prints every line as soon as the tool writes it.
struct PrintObserver;

impl RunObserver for PrintObserver {
    fn on_line(&self, line: &str) {
        println!("{line}");
    }

    fn on_terminal(&self, _result: &RunResult) {}
}

/// Process exit status for a terminal status.
pub fn exit_status(status: TerminalStatus) -> u8 {
    match status {
        TerminalStatus::AllPassed => 0,
        TerminalStatus::SomeFailed => 1,
        TerminalStatus::LaunchError => EXIT_TOOL_ERROR,
        TerminalStatus::Cancelled => EXIT_CANCELLED,
    }
}

pub async fn run(root: &Path, args: RunArgs) -> Result<ExitCode> {
    let mut session = Session::open(root)?;
    let stored = session.variables_snapshot()?;
    let request = args.request.to_request(&stored).map_err(|e| eyre!(e))?;

    // Validate and show the command before anything is launched.
    let command = match session.prepare(&request) {
        Ok(command) => command,
        Err(e) => return Ok(report_error(&e)),
    };
    eprintln!(
        "{} {}",
        "Command:".bold(),
        command.to_argv().join(" ").dimmed()
    );

    let interrupted = Arc::new(AtomicBool::new(false));
    let ctrl_c = tokio::spawn({
        let supervisor = session.supervisor();
        let interrupted = Arc::clone(&interrupted);
        async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                interrupted.store(true, Ordering::SeqCst);
                eprintln!("{}", "Cancelling run...".yellow());
                if let Err(e) = supervisor.cancel() {
                    tracing::debug!(error = %e, "nothing to cancel");
                }
            }
        }
    });

    let outcome = run_repeated(&mut session, &request, &args, &interrupted).await;
    ctrl_c.abort();

    let status = match outcome {
        Ok(Some(result)) => result.status,
        // Interrupted before the first run started.
        Ok(None) => TerminalStatus::Cancelled,
        Err(e) => return Ok(report_error(&e)),
    };
    Ok(ExitCode::from(exit_status(status)))
}

/// Launch the run up to `args.runs` times, returning the last result.
///
/// Stops early on cancellation, a launch error or an interrupt. An interrupt
/// that arrives between runs prevents the next launch; one that arrives
/// while a run is starting cancels it as soon as it streams.
async fn run_repeated(
    session: &mut Session,
    request: &RunRequest,
    args: &RunArgs,
    interrupted: &AtomicBool,
) -> Result<Option<RunResult>, RunError> {
    let mut last: Option<RunResult> = None;
    for attempt in 1..=args.runs {
        if interrupted.load(Ordering::SeqCst) {
            break;
        }
        if args.runs > 1 {
            eprintln!("{}", format!("Run {attempt}/{}", args.runs).bold());
        }

        let handle = session.launch(request, Arc::new(PrintObserver))?;
        if interrupted.load(Ordering::SeqCst) {
            let _ = session.cancel();
        }
        let result = handle.wait().await;

        if args.json {
            match serde_json::to_string_pretty(&result) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::warn!(error = %e, "could not encode result"),
            }
        } else {
            print_summary(&result);
        }

        let stop = result.status == TerminalStatus::Cancelled
            || result.status == TerminalStatus::LaunchError
            || interrupted.load(Ordering::SeqCst);
        last = Some(result);
        if stop {
            break;
        }
    }
    Ok(last)
}

fn print_summary(result: &RunResult) {
    let summary = result.summary();
    let line = match result.status {
        TerminalStatus::AllPassed => summary.green().bold(),
        TerminalStatus::SomeFailed => summary.red().bold(),
        TerminalStatus::LaunchError => summary.red(),
        TerminalStatus::Cancelled => summary.magenta(),
    };
    let elapsed = (result.finished_at - result.started_at).num_milliseconds() as f64 / 1000.0;
    eprintln!("{line} {}", format!("({elapsed:.1}s)").dimmed());
}

fn report_error(error: &RunError) -> ExitCode {
    eprintln!("{} {error}", "error:".red().bold());
    ExitCode::from(EXIT_TOOL_ERROR)
}
