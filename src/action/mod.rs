// ABOUTME: Side-effect actions run after a template's output changes
// ABOUTME: Defines the Action variant, the ActionRunner seam, and the shell implementation

pub mod error;
pub mod runner;

use std::fmt;
use std::sync::Arc;

pub use error::ActionError;
pub use runner::{ActionRunner, ShellRunner};

type CallbackFn = dyn Fn() -> std::result::Result<(), String> + Send + Sync;

/// In-process side effect, used where a shell command is not wanted
#[derive(Clone)]
pub struct ActionCallback {
    name: String,
    callback: Arc<CallbackFn>,
}

impl ActionCallback {
    pub fn new<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn() -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            callback: Arc::new(callback),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invoke(&self) -> std::result::Result<(), String> {
        (self.callback)()
    }
}

impl fmt::Debug for ActionCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionCallback")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ActionCallback {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.callback, &other.callback)
    }
}

impl Eq for ActionCallback {}

/// What to run once a template's new output has been applied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Action {
    #[default]
    None,
    Shell(String),
    Callback(ActionCallback),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::None => write!(f, "none"),
            Action::Shell(command) => write!(f, "shell: {}", command),
            Action::Callback(callback) => write!(f, "callback: {}", callback.name()),
        }
    }
}
