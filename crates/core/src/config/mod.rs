//! Configuration loading and management.
//!
//! This module provides functionality to load and save the settings file and
//! the external variable store from the `.robot-panel/` directory.

pub mod error;
pub mod loader;
pub mod models;
pub mod variables;
