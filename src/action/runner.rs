// ABOUTME: Executes template actions through the OS shell or an in-process callback
// ABOUTME: Shell commands inherit the engine's stdout/stderr so operators see live output

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use super::error::{ActionError, Result};
use super::Action;

#[async_trait]
pub trait ActionRunner: Send + Sync {
    /// Run `action` for the template identified by `template`, waiting for it to finish
    async fn run(&self, template: &str, action: &Action) -> Result<()>;
}

/// Runs shell actions as `<shell> -c <command>`
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellRunner {
    pub fn new() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    async fn run_command(&self, template: &str, command: &str) -> Result<()> {
        info!(template = %template, command = %command, "running template action");

        let status = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|source| ActionError::Spawn {
                command: command.to_string(),
                source,
            })?;

        debug!(template = %template, status = %status, "action finished");

        if status.success() {
            Ok(())
        } else {
            Err(ActionError::ExitStatus {
                command: command.to_string(),
                code: status.code(),
            })
        }
    }
}

#[async_trait]
impl ActionRunner for ShellRunner {
    async fn run(&self, template: &str, action: &Action) -> Result<()> {
        match action {
            Action::None => Ok(()),
            Action::Shell(command) => self.run_command(template, command).await,
            Action::Callback(callback) => {
                debug!(template = %template, callback = %callback.name(), "invoking action callback");
                callback.invoke().map_err(ActionError::Callback)
            }
        }
    }
}
