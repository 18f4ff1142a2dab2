// ABOUTME: Template module binding Handlebars templates to key-value lookups
// ABOUTME: Exports the compiled template set, store helpers, and template errors

pub mod engine;
pub mod error;
pub mod helpers;

pub use engine::{CompiledTemplate, TemplateSet};
pub use error::TemplateError;
