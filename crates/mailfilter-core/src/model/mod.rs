//! In-memory filter document model.
//!
//! A [`Document`] is built fresh for every conversion run and owns all of its
//! [`FilterRule`]s and [`CannedResponse`]s.

mod document;
mod filter;
mod property;

pub use document::{DEFAULTS_ID, Document};
pub use filter::{Author, CannedResponse, FilterRule};
pub use property::{Properties, PropertyName, PropertyValue};
