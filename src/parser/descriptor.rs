// ABOUTME: Template descriptor parsing from colon-delimited command line values
// ABOUTME: Splits source:target:action on the first two colons and renders the descriptor back

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::error::{ParserError, Result};
use crate::action::Action;

/// One configured template: where the body comes from, where the output goes,
/// and what to run once the output changes.
///
/// An empty `target` means the output is never written; an empty `action`
/// means nothing is executed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TemplateSpec {
    pub source: String,
    pub target: String,
    pub action: String,
}

impl TemplateSpec {
    /// Parse a descriptor of the form `source[:target[:action]]`.
    ///
    /// Only the first two colons split fields, so the action may itself
    /// contain colons. A descriptor without any colon is rejected.
    pub fn parse(input: &str) -> Result<Self> {
        let (source, rest) =
            input
                .split_once(':')
                .ok_or_else(|| ParserError::InvalidDescriptor {
                    descriptor: input.to_string(),
                })?;

        let (target, action) = rest.split_once(':').unwrap_or((rest, ""));

        Ok(Self {
            source: source.to_string(),
            target: target.to_string(),
            action: action.to_string(),
        })
    }

    /// Identity used as the render cache key
    pub fn identity(&self) -> &str {
        &self.source
    }

    /// Output path, or `None` when the template exists only for its action
    pub fn target_path(&self) -> Option<&Path> {
        if self.target.is_empty() {
            None
        } else {
            Some(Path::new(&self.target))
        }
    }

    /// Side effect to run after a changed output has been written
    pub fn to_action(&self) -> Action {
        if self.action.is_empty() {
            Action::None
        } else {
            Action::Shell(self.action.clone())
        }
    }
}

impl FromStr for TemplateSpec {
    type Err = ParserError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for TemplateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.action.is_empty() {
            write!(f, "{}:{}", self.source, self.target)
        } else {
            write!(f, "{}:{}:{}", self.source, self.target, self.action)
        }
    }
}

/// Parse every descriptor, failing on the first malformed one
pub fn parse_descriptors<S: AsRef<str>>(descriptors: &[S]) -> Result<Vec<TemplateSpec>> {
    descriptors
        .iter()
        .map(|d| TemplateSpec::parse(d.as_ref()))
        .collect()
}
