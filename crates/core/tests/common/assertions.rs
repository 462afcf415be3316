//! Custom assertion helpers for integration tests.

use rp_protocol::ipc::Event;
use rp_protocol::process_models::{RunResult, TerminalStatus};

/// Assert a run ended with `status`, printing its output on failure.
#[allow(dead_code)]
pub fn assert_status(result: &RunResult, status: TerminalStatus) {
    assert_eq!(
        result.status, status,
        "Unexpected status ({}), output:\n{}",
        result.summary(),
        result.output_lines.join("\n")
    );
}

#[allow(dead_code)]
/// Assert that events are in the correct sequential order.
///
/// Checks that:
/// 1. RunStarted comes first
/// 2. RunFinished comes last
/// 3. Every OutputLine in between carries the started run's id
pub fn assert_event_sequence(events: &[Event]) {
    if events.is_empty() {
        panic!("Event sequence is empty");
    }

    let run_id = match &events[0] {
        Event::RunStarted { run_id, .. } => *run_id,
        other => panic!("First event should be RunStarted, got: {:?}", other),
    };

    let last = events.last().expect("non-empty");
    assert!(
        matches!(last, Event::RunFinished { result } if result.run_id == run_id),
        "Last event should be RunFinished for {run_id}, got: {:?}",
        last
    );

    for event in &events[1..events.len() - 1] {
        match event {
            Event::OutputLine { run_id: id, .. } => assert_eq!(*id, run_id),
            other => panic!("Unexpected event in the middle: {:?}", other),
        }
    }
}

/// Output lines carried by the events, in order.
#[allow(dead_code)]
pub fn output_lines(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::OutputLine { line, .. } => Some(line.clone()),
            _ => None,
        })
        .collect()
}
