//! Flat, section-based representation of filter documents.
//!
//! ```ini
//! [author]
//! name = Jane Doe
//! email = jane@example.com
//!
//! [filter:default]
//! shouldArchive = true
//!
//! [filter:100]
//! from = x@y.com
//! label = Work, Later
//! cannedResponse = 7
//!
//! [response:7]
//! title = Out of office
//! content = """I am away.
//! Back Monday."""
//! ```
//!
//! `label` is always written list-typed so that multiple labels survive a
//! round trip without duplicating sections.

mod convert;
mod document;
mod parser;
mod writer;

pub use convert::{from_document, to_document};
pub use document::{FlatDocument, FlatValue, Section};
pub use parser::parse;
pub use writer::render;

/// Section holding the document author.
pub const AUTHOR_SECTION: &str = "author";

/// Section holding fallback properties for every filter.
pub const DEFAULTS_SECTION: &str = "filter:default";

/// Prefix of keyed filter sections.
pub const FILTER_PREFIX: &str = "filter:";

/// Prefix of canned response sections.
pub const RESPONSE_PREFIX: &str = "response:";

/// Name of filter sections without an id; may repeat.
pub const UNKEYED_FILTER_SECTION: &str = "filter";

impl FlatDocument {
    /// Parses flat document text.
    ///
    /// # Errors
    ///
    /// See [`parse`].
    pub fn parse(text: &str) -> crate::Result<Self> {
        parser::parse(text)
    }

    /// Renders this document as text.
    ///
    /// # Errors
    ///
    /// See [`render`].
    pub fn render(&self) -> crate::Result<String> {
        writer::render(self)
    }
}
