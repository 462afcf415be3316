//! Header table describing the configured run and its current status.

use crate::event_handler::RunView;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, Table};
use ratatui::Frame;
use rp_protocol::process_models::{RunState, TerminalStatus};
use rp_protocol::request_models::{RunRequest, SelectionMode};

/// Number of rows the header occupies, borders included.
pub const HEADER_HEIGHT: u16 = 7;

/// Renders the run header.
///
/// # Arguments
/// * `frame` - The frame to render into
/// * `area` - The area to render the table in
/// * `request` - The run the user configured
/// * `tool` - One-line description of the detected test tool
/// * `view` - State of the current or last run
pub fn render_run_header(
    frame: &mut Frame,
    area: Rect,
    request: &RunRequest,
    tool: &str,
    view: &RunView,
) {
    let label = Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan);
    let (status_text, status_style) = status_line(view);

    let rows = vec![
        Row::new(vec![
            Cell::from("Suite").style(label),
            Cell::from(request.suite_path.display().to_string()),
        ]),
        Row::new(vec![
            Cell::from("Selection").style(label),
            Cell::from(describe_selection(request)),
        ]),
        Row::new(vec![
            Cell::from("Tool").style(label),
            Cell::from(tool.to_string()),
        ]),
        Row::new(vec![
            Cell::from("Command").style(label),
            Cell::from(if view.command.is_empty() {
                "-".to_string()
            } else {
                view.command.join(" ")
            }),
        ]),
        Row::new(vec![
            Cell::from("Status").style(label),
            Cell::from(status_text).style(status_style),
        ]),
    ];

    let table = Table::new(rows, [Constraint::Length(10), Constraint::Min(10)]).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Robot Panel - run #{}", view.runs))
            .style(Style::default().fg(Color::White)),
    );

    frame.render_widget(table, area);
}

/// Selection mode and names in one line.
pub fn describe_selection(request: &RunRequest) -> String {
    let what = match request.selection_mode {
        SelectionMode::ByTestCase => "tests",
        SelectionMode::ByTag => "tags",
    };
    if request.selected_names.is_empty() {
        format!("all {what}")
    } else {
        format!("{what}: {}", request.selected_names.join(", "))
    }
}

fn status_line(view: &RunView) -> (String, Style) {
    if let Some(reason) = &view.rejection {
        return (format!("Rejected: {reason}"), Style::default().fg(Color::Red));
    }

    match (view.state, &view.result) {
        (RunState::Completed, Some(result)) | (RunState::LaunchFailed, Some(result)) => {
            let color = match result.status {
                TerminalStatus::AllPassed => Color::Green,
                TerminalStatus::SomeFailed => Color::Red,
                TerminalStatus::LaunchError => Color::LightRed,
                TerminalStatus::Cancelled => Color::Magenta,
            };
            let elapsed = (result.finished_at - result.started_at).num_milliseconds() as f64 / 1000.0;
            (
                format!("{} ({elapsed:.1}s)", result.summary()),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )
        }
        (RunState::Launching, _) => ("Launching...".to_string(), Style::default().fg(Color::Yellow)),
        (RunState::Streaming, _) => {
            let secs = view.elapsed().map(|d| d.as_secs()).unwrap_or(0);
            let text = if view.cancelling {
                format!("Cancelling... ({secs}s)")
            } else {
                format!("Running ({secs}s)")
            };
            (text, Style::default().fg(Color::Green))
        }
        _ => ("Idle".to_string(), Style::default().fg(Color::DarkGray)),
    }
}
