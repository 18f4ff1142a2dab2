// ABOUTME: Engine state and batch outcome types
// ABOUTME: Records what each template did during a pass for logging and tests

use std::fmt;
use std::time::Duration;

use super::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Initializing,
    Steady,
    Terminated,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineState::Initializing => write!(f, "initializing"),
            EngineState::Steady => write!(f, "steady"),
            EngineState::Terminated => write!(f, "terminated"),
        }
    }
}

/// What happened to a single template during a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Output changed and was written and actioned
    Applied,
    /// Output matched the last applied output; nothing was done
    Unchanged,
}

/// Per-template results of one notification batch, in processing order
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Splay waited before the batch started
    pub splay: Duration,
    pub applied: Vec<String>,
    pub unchanged: Vec<String>,
    pub failed: Vec<EngineError>,
}

impl BatchReport {
    pub fn record(&mut self, template: &str, outcome: Result<ApplyOutcome, EngineError>) {
        match outcome {
            Ok(ApplyOutcome::Applied) => self.applied.push(template.to_string()),
            Ok(ApplyOutcome::Unchanged) => self.unchanged.push(template.to_string()),
            Err(e) => self.failed.push(e),
        }
    }

    pub fn total(&self) -> usize {
        self.applied.len() + self.unchanged.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_templates(&self) -> Vec<&str> {
        self.failed.iter().filter_map(|e| e.template()).collect()
    }
}
