// ABOUTME: Main library module for the redis-template engine
// ABOUTME: Exports all core modules and provides the public API

pub mod action;
pub mod cli;
pub mod engine;
pub mod notify;
pub mod output;
pub mod parser;
pub mod store;
pub mod template;

// Re-export commonly used types
pub use action::{Action, ActionCallback, ActionRunner, ShellRunner};
pub use cli::{App, Args, Config};
pub use engine::{Controller, EngineError, EngineState, RenderCache, SplayScheduler};
pub use notify::{MemoryBus, NotificationSource, Publisher, RedisBus};
pub use output::{FileWriter, OutputWriter};
pub use parser::{ParserError, TemplateSpec};
pub use store::{KeyValueStore, MemoryStore, RedisStore};
pub use template::{CompiledTemplate, TemplateSet};

// Error handling
pub type Result<T> = anyhow::Result<T>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
