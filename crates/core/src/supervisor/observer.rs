//! Observer interface between the supervisor and its host.
//!
//! The supervisor calls the observer synchronously from its worker task.
//! Hosts with their own interactive thread marshal the calls themselves;
//! [`ChannelObserver`] does that by turning them into [`Event`]s.

use rp_protocol::ipc::Event;
use rp_protocol::process_models::RunResult;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// Receives the output and the outcome of one run.
pub trait RunObserver: Send + Sync {
    /// Called once per output line, in the order the process produced them.
    fn on_line(&self, line: &str);

    /// Called once when the run reaches its terminal status.
    fn on_terminal(&self, result: &RunResult);
}

/// Forwards observer calls to a host as [`Event`]s.
pub struct ChannelObserver {
    run_id: Uuid,
    events_tx: UnboundedSender<Event>,
}

impl ChannelObserver {
    pub fn new(run_id: Uuid, events_tx: UnboundedSender<Event>) -> Self {
        Self { run_id, events_tx }
    }
}

impl RunObserver for ChannelObserver {
    fn on_line(&self, line: &str) {
        let _ = self.events_tx.send(Event::OutputLine {
            run_id: self.run_id,
            line: line.to_string(),
        });
    }

    fn on_terminal(&self, result: &RunResult) {
        let _ = self.events_tx.send(Event::RunFinished {
            result: result.clone(),
        });
    }
}

/// Keeps everything it observes in memory.
///
/// Useful for headless callers and tests that inspect a run afterwards.
#[derive(Default, Clone)]
pub struct CollectingObserver {
    lines: Arc<Mutex<Vec<String>>>,
    result: Arc<Mutex<Option<RunResult>>>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines observed so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The terminal result, once the run has finished.
    pub fn result(&self) -> Option<RunResult> {
        self.result
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RunObserver for CollectingObserver {
    fn on_line(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }

    fn on_terminal(&self, result: &RunResult) {
        *self.result.lock().unwrap_or_else(PoisonError::into_inner) = Some(result.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test]
    async fn test_channel_observer_tags_lines_with_run_id() {
        let (tx, mut rx) = unbounded_channel();
        let run_id = Uuid::new_v4();
        let observer = ChannelObserver::new(run_id, tx);

        observer.on_line("==== Suite ====");
        let result = RunResult::launch_failure(run_id, Utc::now(), "boom".to_string());
        observer.on_terminal(&result);

        let event = rx.recv().await.unwrap();
        assert!(matches!(
            event,
            Event::OutputLine { run_id: id, ref line } if id == run_id && line == "==== Suite ===="
        ));

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, Event::RunFinished { result: r } if r.run_id == run_id));
    }

    #[test]
    fn test_channel_observer_ignores_closed_host() {
        let (tx, rx) = unbounded_channel();
        drop(rx);
        let observer = ChannelObserver::new(Uuid::new_v4(), tx);

        // Should not panic
        observer.on_line("line");
    }

    #[test]
    fn test_collecting_observer() {
        let observer = CollectingObserver::new();
        observer.on_line("a");
        observer.on_line("b");
        assert_eq!(observer.lines(), vec!["a", "b"]);
        assert!(observer.result().is_none());
    }
}
