// ABOUTME: Command line argument definitions and parsing using Clap
// ABOUTME: Flags mirror the configuration file; unset flags defer to config and environment

use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Default)]
#[command(name = "redis-template")]
#[command(about = "Re-render templates from Redis keys whenever a change notification is published")]
#[command(version)]
pub struct Args {
    #[arg(
        short,
        long = "template",
        value_name = "SOURCE[:TARGET[:ACTION]]",
        help = "A template to process (repeatable)"
    )]
    pub templates: Vec<String>,

    #[arg(long, value_name = "ADDR", help = "Redis address (host:port or redis:// URL)")]
    pub redis_addr: Option<String>,

    #[arg(long = "redis-chan", value_name = "CHANNEL", help = "Redis channel to listen for updates on")]
    pub redis_chan: Option<String>,

    #[arg(
        long,
        value_parser = humantime::parse_duration,
        help = "Maximum random delay before re-rendering after a notification (e.g. 500ms, 5s)"
    )]
    pub splay: Option<Duration>,

    #[arg(long, value_name = "LEVEL", help = "Logging level (debug|info|warn|error)")]
    pub log_level: Option<String>,

    #[arg(short, long, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Disable colored output")]
    pub no_color: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Rendered usage text, printed when startup validation fails
    pub fn usage() -> String {
        Self::command().render_help().to_string()
    }
}
