// ABOUTME: Compiled template set bound to the key-value store
// ABOUTME: Templates are parsed once at startup; rendering re-evaluates lookups only

use handlebars::Handlebars;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::error::{Result, TemplateError};
use super::helpers;
use crate::action::Action;
use crate::parser::TemplateSpec;
use crate::store::KeyValueStore;

/// A template ready for rendering. The identity doubles as the render cache key.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    id: String,
    target: Option<PathBuf>,
    action: Action,
}

impl CompiledTemplate {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn target(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    pub fn action(&self) -> &Action {
        &self.action
    }
}

/// Immutable, ordered collection of templates sharing one Handlebars registry
pub struct TemplateSet {
    handlebars: Handlebars<'static>,
    templates: Vec<CompiledTemplate>,
}

impl TemplateSet {
    fn registry(store: Arc<dyn KeyValueStore>) -> Handlebars<'static> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.set_dev_mode(false);

        // Output is configuration files, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);

        helpers::register_helpers(&mut handlebars, store);
        handlebars
    }

    /// Read and compile every template source, in configured order
    pub fn compile(specs: &[TemplateSpec], store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let mut set = Self {
            handlebars: Self::registry(store),
            templates: Vec::with_capacity(specs.len()),
        };

        for spec in specs {
            let body = std::fs::read_to_string(&spec.source).map_err(|source| {
                TemplateError::Source {
                    path: PathBuf::from(&spec.source),
                    source,
                }
            })?;
            set.add(spec, &body, spec.to_action())?;
        }

        Ok(set)
    }

    /// Build a set from in-memory bodies instead of source files
    pub fn from_sources<'a, I>(sources: I, store: Arc<dyn KeyValueStore>) -> Result<Self>
    where
        I: IntoIterator<Item = (TemplateSpec, &'a str, Action)>,
    {
        let mut set = Self {
            handlebars: Self::registry(store),
            templates: Vec::new(),
        };

        for (spec, body, action) in sources {
            set.add(&spec, body, action)?;
        }

        Ok(set)
    }

    fn add(&mut self, spec: &TemplateSpec, body: &str, action: Action) -> Result<()> {
        let id = spec.identity().to_string();

        if self.templates.iter().any(|t| t.id == id) {
            warn!(
                template = %id,
                "duplicate template identity; later body replaces earlier one and \
                 entries sharing the identity skip output that is already applied"
            );
        }

        self.handlebars
            .register_template_string(&id, body)
            .map_err(|e| TemplateError::Syntax {
                template: id.clone(),
                source: Box::new(e),
            })?;

        debug!(template = %id, target = %spec.target, action = %action, "compiled template");

        self.templates.push(CompiledTemplate {
            id,
            target: spec.target_path().map(Path::to_path_buf),
            action,
        });
        Ok(())
    }

    /// Render one template against the current store contents
    pub fn render(&self, template: &CompiledTemplate) -> Result<String> {
        if !self.handlebars.has_template(&template.id) {
            return Err(TemplateError::UnknownTemplate(template.id.clone()));
        }

        Ok(self.handlebars.render(&template.id, &())?)
    }

    pub fn templates(&self) -> &[CompiledTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use tempfile::tempdir;

    fn spec(source: &str, target: &str) -> TemplateSpec {
        TemplateSpec {
            source: source.to_string(),
            target: target.to_string(),
            action: String::new(),
        }
    }

    #[test]
    fn test_compile_from_files_and_render() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("app.conf.tpl");
        std::fs::write(&source, "{{key \"foo\"}}\n{{keyOrDefault \"bar\" \"World\"}}").unwrap();

        let store = Arc::new(MemoryStore::new().with_value("foo", "Hello!!"));
        let descriptor = format!("{}:{}:echo hi", source.display(), dir.path().join("app.conf").display());
        let specs = vec![TemplateSpec::parse(&descriptor).unwrap()];

        let set = TemplateSet::compile(&specs, store.clone()).unwrap();
        assert_eq!(set.len(), 1);

        let template = &set.templates()[0];
        assert_eq!(template.id(), source.to_str().unwrap());
        assert_eq!(template.action(), &Action::Shell("echo hi".to_string()));
        assert_eq!(set.render(template).unwrap(), "Hello!!\nWorld");

        store.set("foo", "Hello");
        assert_eq!(set.render(template).unwrap(), "Hello\nWorld");
    }

    #[test]
    fn test_missing_source_file() {
        let store = Arc::new(MemoryStore::new());
        let result = TemplateSet::compile(&[spec("/nonexistent/template.tpl", "")], store);
        assert!(matches!(result, Err(TemplateError::Source { .. })));
    }

    #[test]
    fn test_syntax_error_is_reported_at_compile() {
        let store = Arc::new(MemoryStore::new());
        let result = TemplateSet::from_sources(
            vec![(spec("broken", ""), "{{key \"foo\"", Action::None)],
            store,
        );
        assert!(matches!(result, Err(TemplateError::Syntax { .. })));
    }

    #[test]
    fn test_render_missing_key_is_render_error() {
        let store = Arc::new(MemoryStore::new());
        let set = TemplateSet::from_sources(
            vec![(spec("needs-foo", ""), "{{key \"foo\"}}", Action::None)],
            store,
        )
        .unwrap();

        let err = set.render(&set.templates()[0]).unwrap_err();
        assert!(matches!(err, TemplateError::Render(_)));
    }

    #[test]
    fn test_order_and_empty_target() {
        let store = Arc::new(MemoryStore::new());
        let set = TemplateSet::from_sources(
            vec![
                (spec("first", "out1"), "1", Action::None),
                (spec("second", ""), "2", Action::None),
            ],
            store,
        )
        .unwrap();

        let ids: Vec<&str> = set.templates().iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec!["first", "second"]);
        assert_eq!(set.templates()[0].target(), Some(Path::new("out1")));
        assert!(set.templates()[1].target().is_none());
    }

    #[test]
    fn test_no_html_escaping() {
        let store = Arc::new(MemoryStore::new().with_value("json", "{\"a\": \"<b>\"}"));
        let set = TemplateSet::from_sources(
            vec![(spec("escape", ""), "{{key \"json\"}}", Action::None)],
            store,
        )
        .unwrap();
        assert_eq!(set.render(&set.templates()[0]).unwrap(), "{\"a\": \"<b>\"}");
    }
}
