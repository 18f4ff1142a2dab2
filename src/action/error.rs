// ABOUTME: Error types for template side-effect actions
// ABOUTME: Covers spawn failures, non-zero exits, and callback failures

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command '{command}' exited with {}", exit_description(.code))]
    ExitStatus { command: String, code: Option<i32> },

    #[error("Callback failed: {0}")]
    Callback(String),
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, ActionError>;
