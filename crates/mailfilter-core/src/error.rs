//! Error types for filter document operations.

use crate::schema::Violation;

/// Result type alias for filter document operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Filter document error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The document does not satisfy its schema.
    #[error("Validation failed with {} violation(s)", .0.len())]
    Validation(Vec<Violation>),

    /// A filter cites a canned response that does not exist.
    #[error("Undefined reference to canned response '{response}' in filter '{filter}'")]
    ReferentialIntegrity {
        /// Id of the filter holding the reference.
        filter: String,
        /// The unresolved response id.
        response: String,
    },

    /// Requested source or destination format is not implemented.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Structurally invalid input.
    #[error("Malformed document ({context}): {message}")]
    Malformed {
        /// Where the problem was found (entry id, section, line).
        context: String,
        /// Description of what went wrong.
        message: String,
    },

    /// XML reader or writer error.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a [`Error::Malformed`] error.
    pub fn malformed(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            context: context.into(),
            message: message.into(),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(err.into())
    }
}
