// ABOUTME: Render cache holding the last successfully applied output per template
// ABOUTME: Exposes only synchronized compare and commit operations, never the raw map

use std::collections::HashMap;
use tokio::sync::Mutex;

/// Last applied output per template identity.
///
/// An entry exists only after a template's write and action both succeeded,
/// so a template with no entry is always reported as changed.
#[derive(Debug, Default)]
pub struct RenderCache {
    entries: Mutex<HashMap<String, String>>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `output` differs from the last applied output for `template`
    pub async fn changed(&self, template: &str, output: &str) -> bool {
        let entries = self.entries.lock().await;
        entries.get(template).map(String::as_str) != Some(output)
    }

    /// Record `output` as applied for `template`
    pub async fn commit(&self, template: &str, output: String) {
        self.entries.lock().await.insert(template.to_string(), output);
    }

    /// Last applied output, if any
    pub async fn get(&self, template: &str) -> Option<String> {
        self.entries.lock().await.get(template).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
