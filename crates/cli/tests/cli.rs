//! End-to-end tests for the `robot-panel` binary.
//!
//! Runs use `sh` as the test tool so a suite file is a shell script and no
//! Robot Framework install is needed.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn panel_cmd(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("robot-panel").unwrap();
    cmd.current_dir(root).arg("--root").arg(root);
    cmd
}

/// Project whose tool is `sh` and whose variable store is empty.
fn shell_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join(".robot-panel");
    fs::create_dir_all(&config).unwrap();
    fs::write(
        config.join("config.toml"),
        "executable = \"sh\"\ngrace_period_secs = 1\n",
    )
    .unwrap();
    fs::write(config.join("variables.json"), "[]").unwrap();
    dir
}

fn write_suite(dir: &TempDir, name: &str, script: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, script).unwrap();
    path
}

mod run_command {
    use super::*;

    #[test]
    fn test_missing_suite_is_a_tool_error() {
        let dir = TempDir::new().unwrap();

        panel_cmd(dir.path())
            .args(["run", "missing.robot"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("not accessible"));
    }

    #[test]
    fn test_test_and_include_conflict() {
        let dir = TempDir::new().unwrap();

        panel_cmd(dir.path())
            .args(["run", "suite.robot", "-t", "A", "-i", "smoke"])
            .assert()
            .code(2);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_tests_exit_one() {
        let dir = shell_project();
        let suite = write_suite(&dir, "failing.robot", "echo hello\nexit 3\n");

        panel_cmd(dir.path())
            .arg("run")
            .arg(&suite)
            .assert()
            .code(1)
            .stdout(predicate::str::contains("hello"))
            .stderr(predicate::str::contains("3 tests failed"));
    }

    #[cfg(unix)]
    #[test]
    fn test_passing_suite_exits_zero() {
        let dir = shell_project();
        let suite = write_suite(&dir, "passing.robot", "echo all good\n");

        panel_cmd(dir.path())
            .arg("run")
            .arg(&suite)
            .assert()
            .success()
            .stdout(predicate::str::contains("all good"))
            .stderr(predicate::str::contains("Command:"));
    }

    #[cfg(unix)]
    #[test]
    fn test_repeated_runs() {
        let dir = shell_project();
        let suite = write_suite(&dir, "again.robot", "echo tick\n");

        panel_cmd(dir.path())
            .arg("run")
            .arg(&suite)
            .args(["--runs", "2"])
            .assert()
            .success()
            .stderr(predicate::str::contains("Run 1/2"))
            .stderr(predicate::str::contains("Run 2/2"));
    }

    #[cfg(unix)]
    #[test]
    fn test_json_result() {
        let dir = shell_project();
        let suite = write_suite(&dir, "json.robot", "exit 1\n");

        panel_cmd(dir.path())
            .arg("run")
            .arg(&suite)
            .arg("--json")
            .assert()
            .code(1)
            .stdout(predicate::str::contains("\"SOME_FAILED\""))
            .stdout(predicate::str::contains("\"exitCode\": 1"));
    }

    #[cfg(unix)]
    #[test]
    fn test_extra_args_are_remembered() {
        let dir = shell_project();
        let suite = write_suite(&dir, "history.robot", "true\n");

        panel_cmd(dir.path())
            .arg("run")
            .arg(&suite)
            .args(["--args", "-e"])
            .assert()
            .success();

        panel_cmd(dir.path())
            .arg("history")
            .assert()
            .success()
            .stdout(predicate::str::contains("1  -e"));

        panel_cmd(dir.path())
            .args(["history", "--forget", "-e"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Forgot"));

        panel_cmd(dir.path())
            .arg("history")
            .assert()
            .success()
            .stdout(predicate::str::contains("No additional arguments"));
    }
}

mod vars_command {
    use super::*;

    #[test]
    fn test_default_variables_listed() {
        let dir = TempDir::new().unwrap();

        panel_cmd(dir.path())
            .args(["vars", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("HEADLESS"));
    }

    #[test]
    fn test_add_then_list() {
        let dir = TempDir::new().unwrap();

        panel_cmd(dir.path())
            .args(["vars", "add", "BROWSER", "chrome", "--type", "choice"])
            .args(["--option", "chrome", "--option", "firefox"])
            .assert()
            .success();

        panel_cmd(dir.path())
            .args(["vars", "list", "--json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("BROWSER"))
            .stdout(predicate::str::contains("firefox"));

        assert!(dir.path().join(".robot-panel/variables.json").exists());
    }

    #[test]
    fn test_duplicate_add_fails() {
        let dir = TempDir::new().unwrap();

        panel_cmd(dir.path())
            .args(["vars", "add", "HEADLESS", "False"])
            .assert()
            .failure();
    }

    #[test]
    fn test_password_is_masked() {
        let dir = TempDir::new().unwrap();

        panel_cmd(dir.path())
            .args(["vars", "add", "SECRET", "hunter2", "--type", "password"])
            .assert()
            .success();

        panel_cmd(dir.path())
            .args(["vars", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("SECRET"))
            .stdout(predicate::str::contains("hunter2").not());
    }
}

mod env_command {
    use super::*;

    #[test]
    fn test_missing_tool() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join(".robot-panel");
        fs::create_dir_all(&config).unwrap();
        fs::write(
            config.join("config.toml"),
            "executable = \"robot-panel-no-such-tool\"\n",
        )
        .unwrap();

        panel_cmd(dir.path())
            .arg("env")
            .assert()
            .code(2)
            .stdout(predicate::str::contains("not found"));
    }
}
