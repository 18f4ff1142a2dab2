// ABOUTME: CLI module for redis-template
// ABOUTME: Exports argument parsing, configuration loading, and application wiring

pub mod app;
pub mod args;
pub mod config;

pub use app::{App, StartupPlan};
pub use args::Args;
pub use config::{Config, LoggingConfig};
