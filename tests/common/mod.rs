// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Provides temp template fixtures, action counters, and polling helpers

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::{sleep, Instant};

use redis_template::{Action, ActionCallback, TemplateSpec};

pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a template body and return its path
    pub fn write_template(&self, name: &str, body: &str) -> PathBuf {
        let path = self.path().join(format!("{}.tpl", name));
        std::fs::write(&path, body).expect("Failed to write template");
        path
    }

    pub fn output_file(&self, name: &str) -> PathBuf {
        self.path().join(name)
    }

    /// Descriptor string `source:target[:action]` for files in this environment
    pub fn descriptor(&self, template: &Path, target: &str, action: &str) -> String {
        let target = if target.is_empty() {
            String::new()
        } else {
            self.output_file(target).display().to_string()
        };

        if action.is_empty() {
            format!("{}:{}", template.display(), target)
        } else {
            format!("{}:{}:{}", template.display(), target, action)
        }
    }

    pub fn read(&self, name: &str) -> Option<String> {
        std::fs::read_to_string(self.output_file(name)).ok()
    }
}

/// Counts how often an action fires
#[derive(Clone, Default)]
pub struct ActionCounter {
    count: Arc<AtomicUsize>,
}

impl ActionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action(&self, name: &str) -> Action {
        let count = Arc::clone(&self.count);
        Action::Callback(ActionCallback::new(name, move || {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }))
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

pub fn spec(source: &str, target: &str) -> TemplateSpec {
    TemplateSpec {
        source: source.to_string(),
        target: target.to_string(),
        action: String::new(),
    }
}

/// Poll `condition` until it holds or `timeout` elapses
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }
    condition()
}
