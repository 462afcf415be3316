//! Host-owned session tying configuration, assembly and supervision together.
//!
//! A [`Session`] is created once per host and passed around explicitly.
//! Hosts either call its methods directly (the headless CLI) or hand it to
//! [`Session::serve`] and talk to it through [`Op`]/[`Event`] channels
//! (the TUI).

use crate::command::{build_command_line, CommandLine};
use crate::config::error::ConfigResult;
use crate::config::loader::{
    load_config, remember_params, resolve_executable, resolve_path, save_settings,
};
use crate::config::variables::VariableStore;
use crate::error::RunError;
use crate::supervisor::observer::{ChannelObserver, RunObserver};
use crate::supervisor::{RunHandle, Supervisor};
use rp_protocol::config_models::Settings;
use rp_protocol::ipc::{Event, Op};
use rp_protocol::process_models::{RunResult, RunState};
use rp_protocol::request_models::RunRequest;
use rp_protocol::variable_models::Variable;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Everything a host needs to launch runs for one project root.
pub struct Session {
    root: PathBuf,
    settings: Settings,
    variables: VariableStore,
    supervisor: Supervisor,
}

impl Session {
    /// Open the session for `root`, reading `.robot-panel/`.
    ///
    /// The variable store is checked here so a malformed file is reported
    /// up front; runs still take their own snapshot at start.
    pub fn open(root: impl Into<PathBuf>) -> ConfigResult<Self> {
        let root = root.into();
        let config = load_config(&root)?;
        debug!(variables = config.variables.len(), "session opened");
        Ok(Self::new(root, config.settings))
    }

    /// Create a session for `root` with `settings`.
    ///
    /// `root` is made absolute so paths resolved against it survive the
    /// change into the suite's directory.
    pub fn new(root: impl Into<PathBuf>, settings: Settings) -> Self {
        let root = root.into();
        let root = std::path::absolute(&root).unwrap_or(root);
        let variables = VariableStore::new(&root);
        let supervisor = Supervisor::new(Duration::from_secs(settings.grace_period_secs));
        Self {
            root,
            settings,
            variables,
            supervisor,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The executable to launch, with a relative path taken from the root.
    pub fn executable(&self) -> String {
        resolve_executable(&self.root, &self.settings.executable)
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    /// Another handle to the supervisor, e.g. for a Ctrl-C handler.
    pub fn supervisor(&self) -> Supervisor {
        self.supervisor.clone()
    }

    /// Read the variable store once.
    pub fn variables_snapshot(&self) -> ConfigResult<Vec<Variable>> {
        self.variables.load()
    }

    /// Assemble the command line for `request` without launching it.
    ///
    /// The stored variables form the base list; variables carried by the
    /// request replace stored ones with the same name or are appended. The
    /// configured output directory applies when the request names none; a
    /// relative one is taken from the root.
    pub fn prepare(&self, request: &RunRequest) -> Result<CommandLine, RunError> {
        let snapshot = self
            .variables_snapshot()
            .map_err(|e| RunError::InvalidRequest(format!("could not read variables: {e}")))?;

        let mut request = request.clone();
        request.variables = merge_variables(snapshot, request.variables);
        if request.output_dir.is_none() {
            request.output_dir = self
                .settings
                .output_dir
                .as_deref()
                .map(|dir| resolve_path(&self.root, dir));
        }

        build_command_line(&request, &self.executable())
    }

    /// Assemble and launch `request` under a fresh run id.
    pub fn launch(
        &mut self,
        request: &RunRequest,
        observer: Arc<dyn RunObserver>,
    ) -> Result<RunHandle, RunError> {
        self.launch_with_id(Uuid::new_v4(), request, observer)
    }

    /// Assemble and launch `request`.
    ///
    /// A previous terminal run is reset first. Non-empty extra arguments are
    /// recorded in the parameter history.
    ///
    /// # Errors
    ///
    /// [`RunError::Busy`] while a run is active, [`RunError::InvalidRequest`]
    /// from assembly, [`RunError::LaunchFailed`] from the supervisor.
    pub fn launch_with_id(
        &mut self,
        run_id: Uuid,
        request: &RunRequest,
        observer: Arc<dyn RunObserver>,
    ) -> Result<RunHandle, RunError> {
        if self.supervisor.state().is_active() {
            return Err(RunError::Busy);
        }
        let command = self.prepare(request)?;
        self.start_command(run_id, command, &request.extra_args, observer)
    }

    pub fn cancel(&self) -> Result<(), RunError> {
        self.supervisor.cancel()
    }

    pub fn state(&self) -> RunState {
        self.supervisor.state()
    }

    pub fn last_result(&self) -> Option<RunResult> {
        self.supervisor.last_result()
    }

    /// Handle operations from a host until `Op::Shutdown` or until the
    /// operation channel closes.
    ///
    /// An active run is cancelled and awaited before returning.
    pub async fn serve(
        mut self,
        mut op_rx: UnboundedReceiver<Op>,
        events_tx: UnboundedSender<Event>,
    ) {
        let mut current: Option<RunHandle> = None;

        while let Some(op) = op_rx.recv().await {
            match op {
                Op::StartRun { request } => {
                    match self.start_from_op(&request, &events_tx) {
                        Ok(handle) => current = Some(handle),
                        Err(e) => {
                            debug!(error = %e, "run rejected");
                            let _ = events_tx.send(Event::RunRejected {
                                reason: e.to_string(),
                            });
                        }
                    }
                }
                Op::CancelRun => {
                    if let Err(e) = self.cancel() {
                        debug!(error = %e, "cancel ignored");
                    }
                }
                Op::Shutdown => break,
            }
        }

        if self.state() == RunState::Streaming {
            let _ = self.cancel();
        }
        if let Some(handle) = current.take() {
            let _ = handle.wait().await;
        }
        info!("session closed");
    }

    fn start_from_op(
        &mut self,
        request: &RunRequest,
        events_tx: &UnboundedSender<Event>,
    ) -> Result<RunHandle, RunError> {
        if self.supervisor.state().is_active() {
            return Err(RunError::Busy);
        }
        let command = self.prepare(request)?;

        // Announced before the start so no output line can precede it.
        let run_id = Uuid::new_v4();
        let _ = events_tx.send(Event::RunStarted {
            run_id,
            command: command.to_argv(),
        });

        let observer = Arc::new(ChannelObserver::new(run_id, events_tx.clone()));
        self.start_command(run_id, command, &request.extra_args, observer)
    }

    fn start_command(
        &mut self,
        run_id: Uuid,
        command: CommandLine,
        extra_args: &str,
        observer: Arc<dyn RunObserver>,
    ) -> Result<RunHandle, RunError> {
        self.supervisor.reset()?;
        self.remember_extra_args(extra_args);
        self.supervisor.start_with_id(run_id, command, observer)
    }

    fn remember_extra_args(&mut self, extra_args: &str) {
        if !remember_params(&mut self.settings, extra_args) {
            return;
        }
        if let Err(e) = save_settings(&self.root, &self.settings) {
            warn!(error = %e, "could not save parameter history");
        }
    }
}

/// Overlay `overrides` on `base`, keeping the order of `base` and appending
/// names it does not have.
pub fn merge_variables(base: Vec<Variable>, overrides: Vec<Variable>) -> Vec<Variable> {
    let mut merged = base;
    for variable in overrides {
        match merged.iter_mut().find(|v| v.name == variable.name) {
            Some(existing) => *existing = variable,
            None => merged.push(variable),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::error::ConfigError;
    use crate::config::loader::load_settings;
    use crate::supervisor::observer::CollectingObserver;
    use rp_protocol::process_models::TerminalStatus;
    use rp_protocol::variable_models::VariableKind;
    use std::fs;
    use tempfile::tempdir;

    /// Session whose "test tool" is `sh`, so the suite file is a script.
    fn shell_session(root: &Path, script: &str) -> (Session, PathBuf) {
        let suite = root.join("suite.robot");
        fs::write(&suite, script).unwrap();

        let session = Session::new(
            root,
            Settings {
                executable: "sh".to_string(),
                grace_period_secs: 1,
                ..Settings::default()
            },
        );
        // No stored variables, otherwise `sh` would see `-v`.
        session.variables().save(&[]).unwrap();
        (session, suite)
    }

    #[test]
    fn test_merge_variables_overrides_and_appends() {
        let base = vec![
            Variable::new("HEADLESS", VariableKind::Boolean, "True"),
            Variable::new("BROWSER", VariableKind::String, "chrome"),
        ];
        let overrides = vec![
            Variable::new("BROWSER", VariableKind::String, "firefox"),
            Variable::new("ENV", VariableKind::String, "staging"),
        ];

        let merged = merge_variables(base, overrides);

        let pairs: Vec<_> = merged
            .iter()
            .map(|v| (v.name.as_str(), v.value.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("HEADLESS", "True"), ("BROWSER", "firefox"), ("ENV", "staging")]
        );
    }

    #[test]
    fn test_open_rejects_malformed_variable_store() {
        let dir = tempdir().unwrap();
        let config = dir.path().join(".robot-panel");
        fs::create_dir_all(&config).unwrap();
        fs::write(config.join("variables.json"), "{ not json").unwrap();

        let result = Session::open(dir.path());

        assert!(matches!(result, Err(ConfigError::Json { .. })));
    }

    #[test]
    fn test_prepare_uses_snapshot_and_default_output_dir() {
        let dir = tempdir().unwrap();
        let suite = dir.path().join("login.robot");
        fs::write(&suite, "*** Test Cases ***\n").unwrap();

        let session = Session::new(
            dir.path(),
            Settings {
                output_dir: Some(PathBuf::from("results")),
                ..Settings::default()
            },
        );

        let command = session
            .prepare(&RunRequest::new(&suite).with_tests(["Login Works"]))
            .unwrap();

        let results = dir.path().join("results").to_string_lossy().into_owned();
        assert_eq!(command.program, "robot");
        assert_eq!(
            command.args,
            vec![
                "--outputdir",
                results.as_str(),
                "-v",
                "HEADLESS:true",
                "--test",
                "Login Works",
                "login.robot"
            ]
        );
    }

    #[test]
    fn test_relative_settings_paths_resolve_against_root() {
        let dir = tempdir().unwrap();
        let suites = dir.path().join("suites");
        fs::create_dir_all(&suites).unwrap();
        let suite = suites.join("login.robot");
        fs::write(&suite, "*** Test Cases ***\n").unwrap();

        let session = Session::new(
            dir.path(),
            Settings {
                executable: "venv/bin/robot".to_string(),
                output_dir: Some(PathBuf::from("results")),
                ..Settings::default()
            },
        );
        session.variables().save(&[]).unwrap();

        let command = session.prepare(&RunRequest::new(&suite)).unwrap();

        assert_eq!(
            PathBuf::from(&command.program),
            dir.path().join("venv/bin/robot")
        );
        assert_eq!(PathBuf::from(&command.args[1]), dir.path().join("results"));
        assert_eq!(command.working_dir, suites);
    }

    #[test]
    fn test_request_output_dir_is_not_rerooted() {
        let dir = tempdir().unwrap();
        let suite = dir.path().join("login.robot");
        fs::write(&suite, "*** Test Cases ***\n").unwrap();
        let session = Session::new(
            dir.path(),
            Settings {
                output_dir: Some(PathBuf::from("results")),
                ..Settings::default()
            },
        );
        session.variables().save(&[]).unwrap();
        let chosen = dir.path().join("elsewhere");

        let command = session
            .prepare(&RunRequest::new(&suite).with_output_dir(Some(chosen.clone())))
            .unwrap();

        assert_eq!(PathBuf::from(&command.args[1]), chosen);
    }

    #[test]
    fn test_prepare_rejects_missing_suite() {
        let dir = tempdir().unwrap();
        let session = Session::new(dir.path(), Settings::default());

        let result = session.prepare(&RunRequest::new(dir.path().join("missing.robot")));

        assert!(matches!(result, Err(RunError::InvalidRequest(_))));
        assert_eq!(session.state(), RunState::Idle);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_launch_runs_to_completion_and_can_run_again() {
        let dir = tempdir().unwrap();
        let (mut session, suite) = shell_session(dir.path(), "echo first\nexit 2\n");
        let request = RunRequest::new(&suite);

        let observer = Arc::new(CollectingObserver::new());
        let result = session.launch(&request, observer.clone()).unwrap().wait().await;

        assert_eq!(result.status, TerminalStatus::SomeFailed);
        assert_eq!(result.exit_code, Some(2));
        assert_eq!(observer.lines(), vec!["first"]);
        assert_eq!(session.state(), RunState::Completed);

        // A terminal session is reset by the next launch
        let again = session
            .launch(&request, Arc::new(CollectingObserver::new()))
            .unwrap()
            .wait()
            .await;
        assert_eq!(again.status, TerminalStatus::SomeFailed);
        assert_ne!(again.run_id, result.run_id);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_launch_records_extra_args() {
        let dir = tempdir().unwrap();
        let (mut session, suite) = shell_session(dir.path(), "exit 0\n");
        // Extra args come before the suite; `-e` is harmless to `sh`.
        let request = RunRequest::new(&suite).with_extra_args("-e");

        let result = session
            .launch(&request, Arc::new(CollectingObserver::new()))
            .unwrap()
            .wait()
            .await;

        assert_eq!(result.status, TerminalStatus::AllPassed);
        assert_eq!(session.settings().param_history, vec!["-e"]);
        let saved = load_settings(dir.path()).unwrap();
        assert_eq!(saved.param_history, vec!["-e"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_serve_publishes_events_in_order() {
        let dir = tempdir().unwrap();
        let (session, suite) = shell_session(dir.path(), "echo one\necho two\nexit 0\n");
        let (op_tx, op_rx) = tokio::sync::mpsc::unbounded_channel();
        let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();
        let server = tokio::spawn(session.serve(op_rx, events_tx));

        op_tx
            .send(Op::StartRun {
                request: RunRequest::new(&suite),
            })
            .unwrap();

        let mut lines = Vec::new();
        let run_id = match events_rx.recv().await.unwrap() {
            Event::RunStarted { run_id, command } => {
                assert_eq!(command, vec!["sh", "suite.robot"]);
                run_id
            }
            other => panic!("Expected RunStarted, got {other:?}"),
        };
        let result = loop {
            match events_rx.recv().await.unwrap() {
                Event::OutputLine { run_id: id, line } => {
                    assert_eq!(id, run_id);
                    lines.push(line);
                }
                Event::RunFinished { result } => break result,
                other => panic!("Unexpected event {other:?}"),
            }
        };

        assert_eq!(lines, vec!["one", "two"]);
        assert_eq!(result.run_id, run_id);
        assert_eq!(result.status, TerminalStatus::AllPassed);

        op_tx.send(Op::Shutdown).unwrap();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_serve_rejects_invalid_request() {
        let dir = tempdir().unwrap();
        let session = Session::new(dir.path(), Settings::default());
        let (op_tx, op_rx) = tokio::sync::mpsc::unbounded_channel();
        let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();
        let server = tokio::spawn(session.serve(op_rx, events_tx));

        op_tx
            .send(Op::StartRun {
                request: RunRequest::new(dir.path().join("missing.robot")),
            })
            .unwrap();

        match events_rx.recv().await.unwrap() {
            Event::RunRejected { reason } => assert!(reason.contains("missing.robot")),
            other => panic!("Expected RunRejected, got {other:?}"),
        }

        drop(op_tx);
        server.await.unwrap();
    }
}
