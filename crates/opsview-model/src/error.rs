//! Markup error taxonomy.

use thiserror::Error;

/// Errors raised by markup lookups and reference resolution.
///
/// `NotFound` and `Reference` are the structural errors: a required child or
/// reference target is missing and there is no default to fall back on. They
/// abort construction of the enclosing widget only, never the whole display.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    /// No direct child element with the requested name.
    #[error("no child element named '{0}'")]
    NotFound(String),

    /// No attribute with the requested name.
    #[error("no attribute named '{0}'")]
    Attribute(String),

    /// A `reference` path could not be walked to an existing node.
    #[error("cannot resolve reference '{path}': {reason}")]
    Reference { path: String, reason: String },

    /// A child element exists but its text does not parse as the needed type.
    #[error("malformed {kind} value '{text}' in element '{element}'")]
    Malformed {
        kind: &'static str,
        text: String,
        element: String,
    },

    /// The document itself is not well-formed XML.
    #[error("invalid display markup: {0}")]
    Syntax(String),
}
