// ABOUTME: Error types for template descriptor parsing
// ABOUTME: Defines the configuration errors raised before the engine starts

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    #[error("Invalid template descriptor '{descriptor}': expected source[:target[:action]]")]
    InvalidDescriptor { descriptor: String },
}

pub type Result<T> = std::result::Result<T, ParserError>;
