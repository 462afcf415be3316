//! # rp-tui
//!
//! Terminal User Interface for robot-panel.
//!
//! This crate provides the interactive console for launching one suite,
//! watching its output live and cancelling it. It communicates with the
//! `rp-core` session via channels using the `Op` and `Event` protocol
//! defined in `rp-protocol`.

pub mod app;
pub mod event;
pub mod event_handler;
pub mod tui;
pub mod widgets;

pub use app::App;
pub use tui::Tui;

use anyhow::Context;
use anyhow::Result;
use rp_core::config::loader::config_dir;
use rp_core::environment::{probe, EnvironmentInfo};
use rp_core::session::Session;
use rp_protocol::ipc::Op;
use rp_protocol::request_models::RunRequest;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::mpsc::unbounded_channel;
use tracing_subscriber::EnvFilter;

/// Log file written while the TUI owns the terminal.
pub const LOG_FILE: &str = "tui.log";

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "robot_panel=info,rp_core=info,rp_tui=info,warn";

/// Route tracing output to `.robot-panel/tui.log` under `root`.
///
/// Logging to the terminal would corrupt the screen.
pub fn init_file_logging(root: &Path) -> Result<PathBuf> {
    let dir = config_dir(root);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(path)
}

/// One-line description of the detected test tool.
pub fn describe_tool(info: &EnvironmentInfo) -> String {
    match (&info.path, &info.version) {
        (Some(path), Some(version)) => format!("{} ({version})", path.display()),
        (Some(path), None) => format!("{} (version unknown)", path.display()),
        (None, _) => format!("'{}' not found on PATH", info.executable),
    }
}

/// Run the interactive console until the user quits.
///
/// The session is served on a background task. If `auto_start` is set the
/// run starts immediately. An active run is cancelled on exit.
pub async fn run_app(session: Session, request: RunRequest, auto_start: bool) -> Result<()> {
    let tool = describe_tool(&probe(&session.executable()).await);

    let (op_tx, op_rx) = unbounded_channel();
    let (event_tx, event_rx) = unbounded_channel();
    let server = tokio::spawn(session.serve(op_rx, event_tx));

    let mut app = App::new(request, tool, op_tx.clone(), event_rx);
    if auto_start {
        app.start_run();
    }

    let mut tui = Tui::init()?;
    let outcome = app.run(&mut tui).await;
    tui.restore()?;

    let _ = op_tx.send(Op::Shutdown);
    drop(app);
    server.await.context("Session task failed")?;

    tracing::info!("tui closed");
    outcome
}
