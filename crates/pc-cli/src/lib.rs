//! Attendance dashboard CLI library.
//!
//! This crate provides the `punch` command-line interface.

mod cli;
pub mod commands;
mod config;
pub mod render;

pub use cli::{Cli, Commands};
pub use config::Config;
