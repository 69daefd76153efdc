//! Identifier allocation for filter documents.
//!
//! Identifiers are minted per [`EntryKind`] from counters owned by a single
//! document, and rendered as tag URIs of the form
//! `tag:mail.google.com,2008:<kind>:<n>` in feed documents.

use std::fmt;

/// Authority part of minted tag URIs.
pub const TAG_AUTHORITY: &str = "mail.google.com";

/// Date part of minted tag URIs.
pub const TAG_YEAR: u16 = 2008;

/// Namespace an identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Filter rule entries.
    Filter,
    /// Canned response entries.
    CannedResponse,
}

impl EntryKind {
    /// Returns the category term used for this kind in feed documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Filter => "filter",
            Self::CannedResponse => "cannedResponse",
        }
    }

    /// Parses a category term.
    #[must_use]
    pub fn parse(term: &str) -> Option<Self> {
        match term {
            "filter" => Some(Self::Filter),
            "cannedResponse" => Some(Self::CannedResponse),
            _ => None,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monotonic identifier allocator.
///
/// Each kind has its own counter starting at zero. An allocator belongs to one
/// document and is never shared between conversion runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdAllocator {
    filters: u64,
    responses: u64,
}

impl IdAllocator {
    /// Creates an allocator with both counters at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            filters: 0,
            responses: 0,
        }
    }

    /// Returns the next identifier for `kind` and advances its counter.
    pub fn next(&mut self, kind: EntryKind) -> u64 {
        let counter = match kind {
            EntryKind::Filter => &mut self.filters,
            EntryKind::CannedResponse => &mut self.responses,
        };
        let n = *counter;
        *counter += 1;
        n
    }

    /// Returns the identifier the next call to [`IdAllocator::next`] would produce.
    #[must_use]
    pub const fn peek(&self, kind: EntryKind) -> u64 {
        match kind {
            EntryKind::Filter => self.filters,
            EntryKind::CannedResponse => self.responses,
        }
    }
}

/// Wraps a document id into a tag URI.
///
/// Ids that already contain a scheme separator are returned unchanged.
#[must_use]
pub fn tag_uri(kind: EntryKind, id: &str) -> String {
    if id.contains(':') {
        id.to_string()
    } else {
        format!("{}{id}", tag_prefix(kind))
    }
}

/// Strips the tag URI template from `uri`, if it carries one for `kind`.
#[must_use]
pub fn strip_tag_uri(kind: EntryKind, uri: &str) -> &str {
    let uri = uri.trim();
    uri.strip_prefix(tag_prefix(kind).as_str())
        .filter(|rest| !rest.is_empty())
        .unwrap_or(uri)
}

fn tag_prefix(kind: EntryKind) -> String {
    format!("tag:{TAG_AUTHORITY},{TAG_YEAR}:{}:", kind.as_str())
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next(EntryKind::Filter), 0);
        assert_eq!(ids.next(EntryKind::Filter), 1);
    }

    #[test]
    fn test_counters_are_per_kind() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next(EntryKind::Filter), 0);
        assert_eq!(ids.next(EntryKind::CannedResponse), 0);
        assert_eq!(ids.next(EntryKind::Filter), 1);
        assert_eq!(ids.peek(EntryKind::CannedResponse), 1);
    }

    #[test]
    fn test_uniqueness() {
        let mut ids = IdAllocator::default();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(ids.next(EntryKind::Filter)), "duplicate id");
        }
    }

    #[test]
    fn test_tag_uri_format() {
        assert_eq!(
            tag_uri(EntryKind::Filter, "42"),
            "tag:mail.google.com,2008:filter:42"
        );
        assert_eq!(
            tag_uri(EntryKind::CannedResponse, "7"),
            "tag:mail.google.com,2008:cannedResponse:7"
        );
    }

    #[test]
    fn test_tag_uri_passthrough() {
        let uri = "tag:example.org,2020:custom";
        assert_eq!(tag_uri(EntryKind::Filter, uri), uri);
    }

    #[test]
    fn test_strip_tag_uri() {
        assert_eq!(
            strip_tag_uri(EntryKind::Filter, "tag:mail.google.com,2008:filter:1234"),
            "1234"
        );
        // Wrong kind is left alone
        assert_eq!(
            strip_tag_uri(EntryKind::CannedResponse, "tag:mail.google.com,2008:filter:1"),
            "tag:mail.google.com,2008:filter:1"
        );
        assert_eq!(strip_tag_uri(EntryKind::Filter, "plain"), "plain");
    }
}
