//! TUI application state and event loop.
//!
//! This module defines the main `App` struct that manages the TUI state
//! and the event loop using `tokio::select!`.

use anyhow::Result;
use crossterm::event::KeyEvent;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use rp_protocol::ipc::{Event, Op};
use rp_protocol::process_models::RunState;
use rp_protocol::request_models::RunRequest;
use std::time::Duration;
use tokio::select;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_stream::StreamExt;

use crate::event_handler::{self, RunView};
use crate::tui::{Tui, TuiEvent};
use crate::widgets::run_header::{render_run_header, HEADER_HEIGHT};
use crate::widgets::OutputView;

/// Main TUI application state.
pub struct App {
    /// The run launched by `r`.
    pub request: RunRequest,
    /// Detected test tool, for the header.
    pub tool: String,
    pub view: RunView,
    pub output: OutputView,
    /// Channel to send operations to the core.
    pub op_tx: UnboundedSender<Op>,
    /// Channel to receive events from the core.
    pub event_rx: UnboundedReceiver<Event>,
    /// Flag to indicate if the application should exit.
    pub should_exit: bool,
}

impl App {
    /// Create a new App with communication channels.
    pub fn new(
        request: RunRequest,
        tool: String,
        op_tx: UnboundedSender<Op>,
        event_rx: UnboundedReceiver<Event>,
    ) -> Self {
        Self {
            request,
            tool,
            view: RunView::default(),
            output: OutputView::new(),
            op_tx,
            event_rx,
            should_exit: false,
        }
    }

    /// Ask the core to start the configured run.
    pub fn start_run(&mut self) {
        self.handle_key_event(KeyEvent::from(crossterm::event::KeyCode::Char('r')));
    }

    /// Main event loop.
    ///
    /// Uses `tokio::select!` to handle keyboard input and core events concurrently.
    pub async fn run(&mut self, tui: &mut Tui) -> Result<()> {
        let mut tui_events = tui.event_stream();
        let frames = tui.frame_requester();

        frames.schedule_frame();

        while !self.should_exit {
            select! {
                Some(event) = self.event_rx.recv() => {
                    self.handle_core_event(event);
                    frames.schedule_frame();
                }
                Some(tui_event) = tui_events.next() => {
                    match tui_event {
                        TuiEvent::Key(key_event) => {
                            self.handle_key_event(key_event);
                            frames.schedule_frame();
                        }
                        TuiEvent::Draw => {
                            tui.draw(|frame| self.render(frame))?;
                            // Keep the elapsed-time counter moving
                            if self.view.state == RunState::Streaming {
                                frames.schedule_frame_in(Duration::from_secs(1));
                            }
                        }
                    }
                }
                else => break,
            }
        }

        Ok(())
    }

    /// Handle events from the core session.
    fn handle_core_event(&mut self, event: Event) {
        event_handler::handle_core_event(&mut self.view, event);
    }

    /// Handle keyboard events.
    fn handle_key_event(&mut self, key_event: KeyEvent) {
        self.should_exit = event_handler::handle_keyboard_event(
            key_event,
            &mut self.view,
            &mut self.output,
            &self.request,
            &self.op_tx,
        );
    }

    /// Render the TUI.
    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(frame.area());

        render_run_header(frame, chunks[0], &self.request, &self.tool, &self.view);
        self.output.render(frame, chunks[1], &self.view.lines);
        self.render_help(frame, chunks[2]);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let text = match self.view.state {
            RunState::Streaming => "c cancel | ↑/↓ PgUp/PgDn Home/End scroll | q quit",
            _ => "r run | ↑/↓ PgUp/PgDn Home/End scroll | q quit",
        };
        let help = Paragraph::new(text).style(Style::default().fg(Color::Yellow));
        frame.render_widget(help, area);
    }
}
