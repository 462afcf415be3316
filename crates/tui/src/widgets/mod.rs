//! TUI widgets module.
//!
//! This module contains the widgets the run console is built from.

pub mod output_view;
pub mod run_header;

pub use output_view::OutputView;
