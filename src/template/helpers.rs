// ABOUTME: Handlebars helpers that resolve values from the key-value store
// ABOUTME: Implements key (required lookup) and keyOrDefault (lookup with fallback)

use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext, RenderError,
};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::debug;

use crate::store::KeyValueStore;

pub const KEY_HELPER: &str = "key";
pub const KEY_OR_DEFAULT_HELPER: &str = "keyOrDefault";

fn key_param<'a>(h: &'a Helper, helper: &str) -> Result<&'a str, RenderError> {
    h.param(0)
        .and_then(|v| v.value().as_str())
        .ok_or_else(|| {
            RenderError::new(format!("invalid argument given to {}: expected a key name", helper))
        })
}

fn lookup(store: &dyn KeyValueStore, key: &str) -> Result<Option<String>, RenderError> {
    store
        .get(key)
        .map_err(|e| RenderError::new(format!("lookup of key '{}' failed: {}", key, e)))
}

/// `{{key "name"}}` - fails the render when the key is absent
pub struct KeyHelper {
    store: Arc<dyn KeyValueStore>,
}

impl KeyHelper {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

impl HelperDef for KeyHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'reg, 'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let key = key_param(h, KEY_HELPER)?;

        match lookup(self.store.as_ref(), key)? {
            Some(value) => {
                out.write(&value)?;
                Ok(())
            }
            None => Err(RenderError::new(format!("key '{}' not found", key))),
        }
    }
}

/// `{{keyOrDefault "name" "fallback"}}` - writes the fallback when the key is absent
pub struct KeyOrDefaultHelper {
    store: Arc<dyn KeyValueStore>,
}

impl KeyOrDefaultHelper {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

impl HelperDef for KeyOrDefaultHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'reg, 'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let key = key_param(h, KEY_OR_DEFAULT_HELPER)?;

        let value = match lookup(self.store.as_ref(), key)? {
            Some(value) => value,
            None => {
                debug!(key = %key, "key absent, using fallback");
                let fallback = h.param(1).map(|v| v.value()).ok_or_else(|| {
                    RenderError::new("keyOrDefault requires a fallback value parameter")
                })?;
                fallback_text(fallback)
            }
        };

        out.write(&value)?;
        Ok(())
    }
}

fn fallback_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

/// Register the store lookup helpers on a Handlebars registry
pub fn register_helpers(handlebars: &mut Handlebars<'_>, store: Arc<dyn KeyValueStore>) {
    handlebars.register_helper(KEY_HELPER, Box::new(KeyHelper::new(Arc::clone(&store))));
    handlebars.register_helper(
        KEY_OR_DEFAULT_HELPER,
        Box::new(KeyOrDefaultHelper::new(store)),
    );
}
