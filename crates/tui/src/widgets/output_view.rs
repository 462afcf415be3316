//! Scrollable view of the test tool's console output.
//!
//! While `follow` is on, the view sticks to the newest line. Scrolling up
//! turns it off; `End` turns it back on.

use crate::event::EventStatus;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

/// Widget state for the output panel.
pub struct OutputView {
    /// Current scroll offset (number of lines scrolled from the top).
    pub scroll_offset: usize,
    /// Whether the view tracks the last line.
    pub follow: bool,
    /// Visible lines at the last render, used for paging.
    viewport: usize,
}

impl OutputView {
    pub fn new() -> Self {
        Self {
            scroll_offset: 0,
            follow: true,
            viewport: 0,
        }
    }

    /// Render `lines` inside a bordered block.
    pub fn render(&mut self, frame: &mut Frame, area: Rect, lines: &[String]) {
        // Subtract 2 for borders
        self.viewport = area.height.saturating_sub(2) as usize;
        let max = max_offset(lines.len(), self.viewport);
        if self.follow {
            self.scroll_offset = max;
        } else {
            self.scroll_offset = self.scroll_offset.min(max);
        }

        let title = if self.follow {
            "Output".to_string()
        } else {
            format!("Output [{}/{}]", self.scroll_offset + 1, lines.len())
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        let paragraph = if lines.is_empty() {
            Paragraph::new("No output yet. Press 'r' to run.")
                .style(Style::default().fg(Color::DarkGray))
        } else {
            let end = (self.scroll_offset + self.viewport).min(lines.len());
            let visible: Vec<Line> = lines[self.scroll_offset..end]
                .iter()
                .map(|l| Line::from(l.as_str()))
                .collect();
            Paragraph::new(visible)
        };
        frame.render_widget(paragraph.block(block), area);

        if lines.len() > self.viewport {
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(lines.len())
                .viewport_content_length(self.viewport)
                .position(self.scroll_offset);
            let scrollbar = Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"));
            frame.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
        }
    }

    /// Handle scrolling keys. Other keys are left to the caller.
    pub fn handle_key_event(&mut self, key: KeyEvent, total_lines: usize) -> EventStatus {
        let max = max_offset(total_lines, self.viewport);
        let page = self.viewport.max(1);
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.unfollow(max);
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll_offset = (self.scroll_offset + 1).min(max);
                self.follow = self.scroll_offset == max;
            }
            KeyCode::PageUp => {
                self.unfollow(max);
                self.scroll_offset = self.scroll_offset.saturating_sub(page);
            }
            KeyCode::PageDown => {
                self.scroll_offset = (self.scroll_offset + page).min(max);
                self.follow = self.scroll_offset == max;
            }
            KeyCode::Home | KeyCode::Char('g') => {
                self.follow = false;
                self.scroll_offset = 0;
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.follow = true;
                self.scroll_offset = max;
            }
            _ => return EventStatus::NotConsumed,
        }
        EventStatus::Consumed
    }

    /// Start over for a new run.
    pub fn reset(&mut self) {
        self.scroll_offset = 0;
        self.follow = true;
    }

    fn unfollow(&mut self, max: usize) {
        if self.follow {
            self.follow = false;
            self.scroll_offset = max;
        }
    }
}

impl Default for OutputView {
    fn default() -> Self {
        Self::new()
    }
}

fn max_offset(total: usize, viewport: usize) -> usize {
    total.saturating_sub(viewport)
}
