// ABOUTME: Error types for template compilation and rendering
// ABOUTME: Separates startup failures (source, syntax) from per-render failures

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Failed to read template source {}: {source}", .path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template syntax error in {template}: {source}")]
    Syntax {
        template: String,
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    #[error("Template render error: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("Unknown template: {0}")]
    UnknownTemplate(String),
}

pub type Result<T> = std::result::Result<T, TemplateError>;
