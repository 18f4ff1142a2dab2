// ABOUTME: Parser module for template descriptors
// ABOUTME: Exports descriptor parsing and the TemplateSpec data structure

pub mod descriptor;
pub mod error;

pub use descriptor::{parse_descriptors, TemplateSpec};
pub use error::ParserError;
