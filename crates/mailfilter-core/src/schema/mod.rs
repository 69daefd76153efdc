//! Declarative validation of flat documents.
//!
//! A [`Schema`] lists section specs with typed keys, required flags and
//! defaults. [`Schema::validate`] is a pure check that reports every
//! [`Violation`] at once.

mod builtin;
mod spec;
mod validate;

pub use builtin::{filter_document_schema, property_kind};
pub use spec::{KeySpec, Schema, SectionMatch, SectionSpec, UnknownPolicy, ValueKind, parse_bool};
pub use validate::{ValidationResult, Violation, ViolationKind, lookup};
