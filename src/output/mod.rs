// ABOUTME: Output module for persisting rendered templates
// ABOUTME: Exports the OutputWriter seam and the file implementation

pub mod error;
pub mod writer;

pub use error::OutputError;
pub use writer::{FileWriter, OutputWriter, DEFAULT_FILE_MODE};
