//! # rp-core
//!
//! Run assembly and subprocess supervision for robot-panel.
//!
//! This crate provides:
//! - Configuration loading from the `.robot-panel/` directory
//! - Assembly of run requests into the external tool's argv
//! - Supervision of one external test-tool process at a time
//! - A host-owned session that ties the pieces together
//!
//! ## Modules
//!
//! - [`config`]: Settings file and variable store
//! - [`command`]: Run configuration assembler
//! - [`supervisor`]: Process lifecycle, output streaming and cancellation
//! - [`session`]: Session object and Op/Event channel loop
//! - [`environment`]: Detection of the external tool

pub mod command;
pub mod config;
pub mod environment;
pub mod error;
pub mod session;
pub mod supervisor;
