//! # mailfilter-core
//!
//! Mail filter documents in two interchangeable formats.
//!
//! ## Features
//!
//! - **Document model**: Filter rules, canned responses and author with typed
//!   filter properties
//! - **Atom feeds**: Read and write the Gmail filter export format
//! - **Flat documents**: Read and write hand-editable section files
//! - **Schema validation**: Typed keys, required flags and defaults, with every
//!   violation reported at once
//! - **Identifiers**: Per-document allocation and tag URI rendering
//!
//! ## Quick Start
//!
//! ### Converting a feed
//!
//! ```ignore
//! use mailfilter_core::{ConvertOptions, Format, convert};
//!
//! let xml = std::fs::read_to_string("mailFilters.xml")?;
//! let flat = convert(&xml, &ConvertOptions::new(Format::Hierarchical, Format::Flat))?;
//! println!("{flat}");
//! ```
//!
//! ### Building a document
//!
//! ```ignore
//! use mailfilter_core::{Document, FilterRule, PropertyName, atom};
//!
//! let mut doc = Document::new();
//! doc.insert_filter(
//!     FilterRule::new("1")
//!         .with(PropertyName::From, "boss@example.com")
//!         .with_label("Work"),
//! )?;
//!
//! let xml = atom::emit(&doc, atom::Generation::ById)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod convert;
mod error;

pub mod atom;
pub mod flat;
pub mod ids;
pub mod model;
pub mod schema;

pub use convert::{ConvertOptions, Format, convert, read, validate, write};
pub use error::{Error, Result};
pub use flat::FlatDocument;
pub use ids::{EntryKind, IdAllocator};
pub use model::{
    Author, CannedResponse, DEFAULTS_ID, Document, FilterRule, Properties, PropertyName, PropertyValue,
};
pub use schema::{Schema, Violation};
