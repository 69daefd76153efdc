//! Mailbox access seam.

use std::fmt;
use std::num::NonZeroU32;

use crate::error::Result;

/// Unique identifier for a message.
///
/// UIDs do not change when other messages are expunged, so they stay valid
/// between a search and the commands acting on its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uid(pub NonZeroU32);

impl Uid {
    /// Creates a new UID.
    ///
    /// Returns `None` if the value is 0.
    #[must_use]
    pub fn new(n: u32) -> Option<Self> {
        NonZeroU32::new(n).map(Self)
    }

    /// Returns the underlying value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Formats UIDs as a comma-separated set.
#[must_use]
pub fn uid_set(uids: &[Uid]) -> String {
    uids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Operations the expiry job needs from a mail server.
///
/// Implementations own the connection and are already logged in. All calls
/// act on the currently selected folder.
pub trait MailStore {
    /// Selects a folder.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Store`] if the folder cannot be selected.
    fn select(&mut self, folder: &str) -> Result<()>;

    /// Runs a provider search (Gmail `X-GM-RAW`) and returns matching UIDs.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Store`] if the search fails.
    fn uid_search_raw(&mut self, query: &str) -> Result<Vec<Uid>>;

    /// Copies messages to another folder.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Store`] if the copy fails.
    fn uid_copy(&mut self, uids: &[Uid], destination: &str) -> Result<()>;

    /// Adds the `\Deleted` flag to messages.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Store`] if the store fails.
    fn uid_store_deleted(&mut self, uids: &[Uid]) -> Result<()>;

    /// Permanently removes messages flagged `\Deleted`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Store`] if the expunge fails.
    fn expunge(&mut self) -> Result<()>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_uid_zero_rejected() {
        assert!(Uid::new(0).is_none());
        assert_eq!(Uid::new(7).unwrap().get(), 7);
    }

    #[test]
    fn test_uid_set() {
        let uids: Vec<Uid> = [3, 1, 42].into_iter().filter_map(Uid::new).collect();
        assert_eq!(uid_set(&uids), "3,1,42");
        assert_eq!(uid_set(&[]), "");
    }
}
