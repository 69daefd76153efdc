//! Error types for the expiry job.

use thiserror::Error;

/// Errors that can occur while loading or running an expiry job.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or validating the configuration document failed.
    #[error(transparent)]
    Core(#[from] mailfilter_core::Error),

    /// A rule's settings cannot be used.
    #[error("Configuration error in filter '{rule}': {message}")]
    Config {
        /// Rule name.
        rule: String,
        /// Description of what went wrong.
        message: String,
    },

    /// Unknown or incomplete action.
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Mailbox operation failed.
    #[error("Mail store error: {0}")]
    Store(String),
}

impl Error {
    /// Creates a [`Error::Config`] error.
    pub fn config(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            rule: rule.into(),
            message: message.into(),
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
