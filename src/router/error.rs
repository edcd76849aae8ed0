//! Error types for route registration.

use thiserror::Error;

/// Errors raised while building a route table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Templates must be absolute.
    #[error("Path template must start with '/': {0}")]
    MissingLeadingSlash(String),

    /// A `{}` segment without a name.
    #[error("Empty parameter name in template: {0}")]
    EmptyParameter(String),

    /// A segment with a stray or unbalanced brace, e.g. `{id` or `a{id}`.
    #[error("Invalid segment '{segment}' in template: {template}")]
    InvalidSegment { template: String, segment: String },

    /// The same parameter name bound twice in one template.
    #[error("Duplicate parameter '{name}' in template: {template}")]
    DuplicateParameter { template: String, name: String },
}
