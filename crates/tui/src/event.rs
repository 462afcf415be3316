//! Event handling types for the TUI.

/// Status of a key event after a widget has seen it.
///
/// Widgets return this from their `handle_key_event` methods so the caller
/// knows whether to keep dispatching the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    /// The widget handled the key.
    Consumed,
    /// The key is meant for the next handler.
    NotConsumed,
}
