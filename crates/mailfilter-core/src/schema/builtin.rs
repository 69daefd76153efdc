//! Schema of flat filter documents.

use super::spec::{KeySpec, Schema, SectionSpec, ValueKind};
use crate::flat::{
    AUTHOR_SECTION, DEFAULTS_SECTION, FILTER_PREFIX, RESPONSE_PREFIX, UNKEYED_FILTER_SECTION,
};
use crate::model::PropertyName;

/// Returns the expected value type of a filter property.
#[must_use]
pub fn property_kind(name: &PropertyName) -> ValueKind {
    match name {
        PropertyName::Label => ValueKind::List,
        PropertyName::HasAttachment
        | PropertyName::ExcludeChats
        | PropertyName::ShouldArchive
        | PropertyName::ShouldMarkAsRead
        | PropertyName::ShouldStar
        | PropertyName::ShouldTrash
        | PropertyName::ShouldNeverSpam
        | PropertyName::ShouldAlwaysMarkAsImportant
        | PropertyName::ShouldNeverMarkAsImportant => ValueKind::Boolean,
        PropertyName::Size => ValueKind::Integer,
        PropertyName::ForwardTo => ValueKind::Email,
        _ => ValueKind::String,
    }
}

fn filter_section(spec: SectionSpec) -> SectionSpec {
    PropertyName::KNOWN
        .iter()
        .fold(spec, |spec, name| {
            spec.key(KeySpec::optional(name.as_str(), property_kind(name)))
        })
        .allow_unknown_keys()
}

/// Schema of the flat filter document format.
///
/// - `[author]`: `name` and `email` required, nothing else.
/// - `[filter:<id>]`, `[filter]` and `[filter:default]`: known properties are
///   type-checked, unknown properties are accepted.
/// - `[response:<id>]`: `title` required, `content` defaults to empty.
/// - Any other section is a violation.
#[must_use]
pub fn filter_document_schema() -> Schema {
    Schema::new()
        .section(
            SectionSpec::exact(AUTHOR_SECTION)
                .key(KeySpec::required("name", ValueKind::String))
                .key(KeySpec::required("email", ValueKind::Email)),
        )
        .section(filter_section(SectionSpec::exact(UNKEYED_FILTER_SECTION)).fallback(DEFAULTS_SECTION))
        .section(filter_section(SectionSpec::prefixed(FILTER_PREFIX)).fallback(DEFAULTS_SECTION))
        .section(
            SectionSpec::prefixed(RESPONSE_PREFIX)
                .key(KeySpec::required("title", ValueKind::String))
                .key(KeySpec::optional("content", ValueKind::String).with_default("")),
        )
}
