//! # rp-protocol
//!
//! Core protocol definitions and data models for robot-panel.
//!
//! This crate defines all shared data structures used for:
//! - Run requests assembled by a host from user input
//! - External variable definitions (`.robot-panel/variables.json`)
//! - Settings (`.robot-panel/config.toml`)
//! - Runtime run state and results
//! - Inter-process communication between a host and the core
//!
//! ## Modules
//!
//! - [`request_models`]: Run requests, selection modes and log levels
//! - [`variable_models`]: External variables and their kinds
//! - [`config_models`]: Global settings from config.toml
//! - [`process_models`]: Supervisor state, terminal status and run results
//! - [`ipc`]: Operations and Events for host-core communication
//!
//! ## Design Principles
//!
//! - Minimal dependencies: Only serde, ts-rs, uuid and chrono
//! - TypeScript generation: All types derive `TS` for client compatibility
//! - Independent compilation: No dependencies on other robot-panel crates

pub mod config_models;
pub mod ipc;
pub mod process_models;
pub mod request_models;
pub mod variable_models;

// Re-export all public types for convenience
pub use config_models::*;
pub use ipc::*;
pub use process_models::*;
pub use request_models::*;
pub use variable_models::*;
