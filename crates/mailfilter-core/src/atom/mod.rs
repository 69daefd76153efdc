//! Hierarchical (Atom feed) representation of filter documents.
//!
//! This is the format Gmail uses for filter import/export:
//!
//! ```xml
//! <feed xmlns="http://www.w3.org/2005/Atom" xmlns:apps="http://schemas.google.com/apps/2006">
//!   <title>Mail Filters</title>
//!   <author><name>Jane</name><email>jane@example.com</email></author>
//!   <entry>
//!     <category term="filter"/>
//!     <title>Mail Filter</title>
//!     <id>tag:mail.google.com,2008:filter:100</id>
//!     <content/>
//!     <apps:property name="from" value="x@y.com"/>
//!     <apps:property name="label" value="Work"/>
//!   </entry>
//! </feed>
//! ```
//!
//! The format has no multi-valued properties: a rule with several labels is
//! written as sibling entries sharing one id, each carrying one label.

mod emitter;
mod parser;

use std::fmt;
use std::str::FromStr;

pub use emitter::emit;
pub use parser::parse;

use crate::error::Error;

/// Atom namespace.
pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// Google Apps property namespace.
pub const APPS_NS: &str = "http://schemas.google.com/apps/2006";

/// Format generation of the parser/emitter pair.
///
/// Generations disagree on how canned responses are keyed and whether unused
/// responses are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Generation {
    /// Responses keyed by entry id; only responses used by a filter are
    /// emitted. Canonical.
    #[default]
    ById,
    /// Responses keyed by title and emitted with freshly minted ids; all
    /// responses are emitted.
    ByTitle,
}

impl Generation {
    /// Returns the CLI name of this generation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ById => "by-id",
            Self::ByTitle => "by-title",
        }
    }

    /// Checks if this generation omits canned responses no filter uses.
    #[must_use]
    pub const fn tracks_usage(self) -> bool {
        matches!(self, Self::ById)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Generation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "by-id" | "id" => Ok(Self::ById),
            "by-title" | "title" => Ok(Self::ByTitle),
            other => Err(Error::UnsupportedFormat(format!("generation '{other}'"))),
        }
    }
}

/// Whether a feed must carry an author block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorPolicy {
    /// Author block may be absent.
    #[default]
    Optional,
    /// A missing author block is a malformed document.
    Required,
}

/// Options of the hierarchical parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// Format generation.
    pub generation: Generation,
    /// Author block policy.
    pub author: AuthorPolicy,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_parse() {
        assert_eq!("by-id".parse::<Generation>().unwrap(), Generation::ById);
        assert_eq!("By-Title".parse::<Generation>().unwrap(), Generation::ByTitle);
        assert!(matches!(
            "by-color".parse::<Generation>(),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_generation_usage_tracking() {
        assert!(Generation::ById.tracks_usage());
        assert!(!Generation::ByTitle.tracks_usage());
        assert_eq!(Generation::default(), Generation::ById);
    }
}
