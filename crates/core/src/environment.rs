//! Detection of the external test-automation tool.
//!
//! Hosts show this information before the first run so a missing or wrong
//! tool is visible without launching anything.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Upper bound for `<tool> --version`.
const VERSION_TIMEOUT: Duration = Duration::from_secs(10);

/// What could be found out about the configured executable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct EnvironmentInfo {
    /// The executable name as configured.
    pub executable: String,

    /// Resolved location, `None` if it is not on `PATH`.
    pub path: Option<PathBuf>,

    /// First non-empty line of `--version` output.
    pub version: Option<String>,
}

impl EnvironmentInfo {
    pub fn is_available(&self) -> bool {
        self.path.is_some()
    }
}

/// Locate `executable` and ask it for its version.
///
/// Never fails: a missing tool yields `path: None`, and a tool that cannot
/// report a version yields `version: None`.
pub async fn probe(executable: &str) -> EnvironmentInfo {
    let path = match which::which(executable) {
        Ok(path) => path,
        Err(e) => {
            tracing::debug!(%executable, error = %e, "test tool not found on PATH");
            return EnvironmentInfo {
                executable: executable.to_string(),
                path: None,
                version: None,
            };
        }
    };

    let version = read_version(&path).await;
    tracing::debug!(%executable, path = %path.display(), ?version, "probed test tool");

    EnvironmentInfo {
        executable: executable.to_string(),
        path: Some(path),
        version,
    }
}

async fn read_version(path: &Path) -> Option<String> {
    let output = Command::new(path)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    // `robot --version` exits with 251 on success, so the status is ignored.
    let output = tokio::time::timeout(VERSION_TIMEOUT, output)
        .await
        .ok()?
        .ok()?;

    first_line(&output.stdout).or_else(|| first_line(&output.stderr))
}

fn first_line(bytes: &[u8]) -> Option<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_probe_missing_tool() {
        let info = probe("nonexistent-command-xyz").await;

        assert!(!info.is_available());
        assert_eq!(info.executable, "nonexistent-command-xyz");
        assert!(info.version.is_none());
    }

    #[test]
    fn test_first_line_skips_blank_lines() {
        assert_eq!(
            first_line(b"\n  \nRobot Framework 7.0 (Python 3.12.1 on linux)\nmore"),
            Some("Robot Framework 7.0 (Python 3.12.1 on linux)".to_string())
        );
        assert_eq!(first_line(b"\n\n"), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_probe_existing_tool() {
        let info = probe("sh").await;

        assert!(info.is_available());
        assert!(info.path.unwrap().is_absolute());
    }
}
