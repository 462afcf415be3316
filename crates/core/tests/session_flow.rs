//! End-to-end tests for the session: configuration, assembly and
//! supervision driven through the Op/Event channels.

#![cfg(unix)]

mod common;

use common::assertions::*;
use common::fixtures::*;
use rp_core::config::loader::load_config;
use rp_core::error::RunError;
use rp_core::session::Session;
use rp_core::supervisor::observer::CollectingObserver;
use rp_protocol::ipc::{Event, Op};
use rp_protocol::process_models::{RunState, TerminalStatus};
use rp_protocol::request_models::RunRequest;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Collect events until the run finishes or is rejected.
async fn collect_run(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(15), rx.recv())
            .await
            .expect("Timed out waiting for events")
            .expect("Event channel closed");
        let done = matches!(event, Event::RunFinished { .. } | Event::RunRejected { .. });
        events.push(event);
        if done {
            return events;
        }
    }
}

#[tokio::test]
async fn test_run_through_channels() {
    let project = create_test_project().expect("Failed to create project");
    let suite = write_suite(
        project.path(),
        "suites/smoke.robot",
        "echo \"running in $(basename \"$PWD\")\"\necho PASS\nexit 0\n",
    );
    let session = shell_session(project.path(), 5);

    let (op_tx, op_rx) = mpsc::unbounded_channel();
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let server = tokio::spawn(session.serve(op_rx, events_tx));

    op_tx
        .send(Op::StartRun {
            request: RunRequest::new(&suite),
        })
        .unwrap();
    let events = collect_run(&mut events_rx).await;

    assert_event_sequence(&events);
    // The process runs from the suite's directory
    assert_eq!(output_lines(&events), vec!["running in suites", "PASS"]);

    op_tx.send(Op::Shutdown).unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn test_second_start_is_rejected_while_running() {
    let project = create_test_project().expect("Failed to create project");
    let suite = write_suite(project.path(), "slow.robot", "echo started\nsleep 30\n");
    let session = shell_session(project.path(), 5);

    let (op_tx, op_rx) = mpsc::unbounded_channel();
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let server = tokio::spawn(session.serve(op_rx, events_tx));

    op_tx
        .send(Op::StartRun {
            request: RunRequest::new(&suite),
        })
        .unwrap();
    assert!(matches!(events_rx.recv().await, Some(Event::RunStarted { .. })));
    assert!(matches!(events_rx.recv().await, Some(Event::OutputLine { .. })));

    op_tx
        .send(Op::StartRun {
            request: RunRequest::new(&suite),
        })
        .unwrap();
    match events_rx.recv().await {
        Some(Event::RunRejected { reason }) => assert!(reason.contains("already in progress")),
        other => panic!("Expected RunRejected, got {other:?}"),
    }

    op_tx.send(Op::CancelRun).unwrap();
    let events = collect_run(&mut events_rx).await;
    match events.last() {
        Some(Event::RunFinished { result }) => {
            assert_status(result, TerminalStatus::Cancelled);
        }
        other => panic!("Expected RunFinished, got {other:?}"),
    }

    op_tx.send(Op::Shutdown).unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn test_shutdown_cancels_active_run() {
    let project = create_test_project().expect("Failed to create project");
    let suite = write_suite(project.path(), "slow.robot", "echo started\nsleep 30\n");
    let session = shell_session(project.path(), 5);

    let (op_tx, op_rx) = mpsc::unbounded_channel();
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let server = tokio::spawn(session.serve(op_rx, events_tx));

    op_tx
        .send(Op::StartRun {
            request: RunRequest::new(&suite),
        })
        .unwrap();
    assert!(matches!(events_rx.recv().await, Some(Event::RunStarted { .. })));
    assert!(matches!(events_rx.recv().await, Some(Event::OutputLine { .. })));

    op_tx.send(Op::Shutdown).unwrap();
    tokio::time::timeout(Duration::from_secs(10), server)
        .await
        .expect("Shutdown should not wait for the run")
        .unwrap();

    let events = collect_run(&mut events_rx).await;
    assert!(matches!(
        events.last(),
        Some(Event::RunFinished { result }) if result.status == TerminalStatus::Cancelled
    ));
}

#[tokio::test]
async fn test_launch_failure_leaves_session_reusable() {
    let project = create_test_project().expect("Failed to create project");
    let suite = write_suite(project.path(), "ok.robot", "exit 0\n");
    let mut session = Session::new(
        project.path(),
        rp_protocol::config_models::Settings {
            executable: "nonexistent-command-xyz".to_string(),
            ..Default::default()
        },
    );
    session.variables().save(&[]).unwrap();

    let observer = Arc::new(CollectingObserver::new());
    let err = session
        .launch(&RunRequest::new(&suite), observer.clone())
        .err()
        .expect("Launch should fail");

    assert!(matches!(err, RunError::LaunchFailed(_)));
    assert_eq!(session.state(), RunState::LaunchFailed);
    let last = session.last_result().expect("Launch failure is recorded");
    assert_status(&last, TerminalStatus::LaunchError);
    assert!(last.summary().contains("nonexistent-command-xyz"));
    assert!(observer.result().is_none());

    // The next launch resets the terminal state and fails the same way
    let again = session.launch(&RunRequest::new(&suite), observer);
    assert!(matches!(again, Err(RunError::LaunchFailed(_))));
}

#[tokio::test]
async fn test_stored_variables_reach_the_tool() {
    let project = create_test_project().expect("Failed to create project");
    let suite = write_suite(project.path(), "vars.robot", "*** Test Cases ***\n");
    // `echo` prints its arguments, which makes it a transparent fake tool
    let mut session = Session::new(
        project.path(),
        rp_protocol::config_models::Settings {
            executable: "echo".to_string(),
            ..Default::default()
        },
    );

    let config = load_config(project.path()).expect("Failed to load config");
    assert_eq!(config.variables[0].name, "HEADLESS");

    let observer = Arc::new(CollectingObserver::new());
    let result = session
        .launch(
            &RunRequest::new(&suite)
                .with_tags(["smoke"])
                .with_extra_args("--randomize all"),
            observer.clone(),
        )
        .expect("Failed to launch")
        .wait()
        .await;

    assert_status(&result, TerminalStatus::AllPassed);
    assert_eq!(
        observer.lines(),
        vec!["--randomize all -v HEADLESS:true --include smoke vars.robot"]
    );
    assert_eq!(session.settings().param_history, vec!["--randomize all"]);
}
