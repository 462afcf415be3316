//! robot-panel - launch Robot Framework suites and watch them run.
//!
//! `run` streams a suite headless, `tui` opens the interactive console, and
//! `vars`, `history` and `env` manage the project's `.robot-panel/` setup.

mod args;
mod run;
mod vars;

use args::{Cli, Commands};
use clap::Parser;
use color_eyre::eyre::eyre;
use rp_core::session::Session;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "warn";
const VERBOSE_LOG_FILTER: &str = "robot_panel=debug,rp_core=debug,info";

#[tokio::main]
async fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            init_stderr_logging(cli.verbose);
            run::run(&cli.root, args).await
        }
        Commands::Tui { request, start } => {
            // The terminal belongs to the UI; logs go to a file instead.
            rp_tui::init_file_logging(&cli.root).map_err(|e| eyre!(e))?;
            let session = Session::open(&cli.root)?;
            let request = request
                .to_request(&session.variables_snapshot()?)
                .map_err(|e| eyre!(e))?;
            rp_tui::run_app(session, request, start)
                .await
                .map_err(|e| eyre!(e))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Vars { action } => {
            init_stderr_logging(cli.verbose);
            vars::vars(&cli.root, action)
        }
        Commands::History { forget } => {
            init_stderr_logging(cli.verbose);
            vars::history(&cli.root, forget)
        }
        Commands::Env { json } => {
            init_stderr_logging(cli.verbose);
            vars::env(&cli.root, json).await
        }
    }
}

fn init_stderr_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
