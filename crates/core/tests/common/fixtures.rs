//! Test fixtures for creating sample projects and sessions.
//!
//! Most tests use `sh` as the external tool: the assembled argv is then
//! `sh <suite>` and the "suite" file is a shell script that plays the part
//! of the test tool.

use rp_core::command::CommandLine;
use rp_core::session::Session;
use rp_protocol::config_models::Settings;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create an empty temporary project directory.
///
/// Returns a TempDir that must be kept alive for the test duration.
#[allow(dead_code)]
pub fn create_test_project() -> std::io::Result<TempDir> {
    tempfile::tempdir()
}

/// Write a suite file named `name` under `root`.
#[allow(dead_code)]
pub fn write_suite(root: &Path, name: &str, content: &str) -> PathBuf {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create suite directory");
    }
    std::fs::write(&path, content).expect("Failed to write suite");
    path
}

/// A session for `root` that runs suites with `sh` and has no stored
/// variables.
#[allow(dead_code)]
pub fn shell_session(root: &Path, grace_period_secs: u64) -> Session {
    let session = Session::new(
        root,
        Settings {
            executable: "sh".to_string(),
            grace_period_secs,
            ..Settings::default()
        },
    );
    session
        .variables()
        .save(&[])
        .expect("Failed to write empty variable store");
    session
}

/// `sh -c <script>` run from the current directory.
#[allow(dead_code)]
pub fn shell_command(script: &str) -> CommandLine {
    CommandLine {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        working_dir: PathBuf::from("."),
    }
}
