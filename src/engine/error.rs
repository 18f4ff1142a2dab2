// ABOUTME: Error taxonomy for the render/diff/write/execute engine
// ABOUTME: Separates fatal startup and bus failures from per-template failures

use thiserror::Error;

use crate::action::ActionError;
use crate::notify::NotifyError;
use crate::output::OutputError;
use crate::parser::ParserError;
use crate::store::StoreError;
use crate::template::TemplateError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ParserError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Failed to connect to the key-value store: {0}")]
    StoreConnection(#[source] StoreError),

    #[error("Failed to subscribe to channel '{channel}': {source}")]
    BusConnection {
        channel: String,
        #[source]
        source: NotifyError,
    },

    #[error("Subscription terminated: {0}")]
    Subscription(#[source] NotifyError),

    #[error("Render failed for template {template}: {source}")]
    Render {
        template: String,
        #[source]
        source: TemplateError,
    },

    #[error("Write failed for template {template}: {source}")]
    Write {
        template: String,
        #[source]
        source: OutputError,
    },

    #[error("Action failed for template {template}: {source}")]
    Action {
        template: String,
        #[source]
        source: ActionError,
    },

    #[error("Join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

impl EngineError {
    /// Template the error is scoped to, if any
    pub fn template(&self) -> Option<&str> {
        match self {
            EngineError::Render { template, .. }
            | EngineError::Write { template, .. }
            | EngineError::Action { template, .. } => Some(template),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
