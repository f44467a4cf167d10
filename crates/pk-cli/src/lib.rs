//! Parking lot CLI library.
//!
//! This crate provides the CLI interface for the parking lot engine.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, OutputArgs};
pub use config::{Config, DEFAULT_FLOORS};
