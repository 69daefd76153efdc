//! Mapping between [`FlatDocument`] and the [`Document`] model.

use tracing::debug;

use super::document::{FlatDocument, FlatValue, Section};
use super::{
    AUTHOR_SECTION, DEFAULTS_SECTION, FILTER_PREFIX, RESPONSE_PREFIX, UNKEYED_FILTER_SECTION,
};
use crate::error::{Error, Result};
use crate::model::{
    Author, CannedResponse, Document, FilterRule, Properties, PropertyName, PropertyValue,
};

/// Role of a section, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionRole<'a> {
    Author,
    Defaults,
    Filter(&'a str),
    UnkeyedFilter,
    Response(&'a str),
}

fn role(name: &str) -> Result<SectionRole<'_>> {
    if name == AUTHOR_SECTION {
        return Ok(SectionRole::Author);
    }
    if name == DEFAULTS_SECTION {
        return Ok(SectionRole::Defaults);
    }
    if name == UNKEYED_FILTER_SECTION {
        return Ok(SectionRole::UnkeyedFilter);
    }
    if let Some(id) = name.strip_prefix(FILTER_PREFIX) {
        return non_empty_id(name, id).map(SectionRole::Filter);
    }
    if let Some(id) = name.strip_prefix(RESPONSE_PREFIX) {
        return non_empty_id(name, id).map(SectionRole::Response);
    }
    Err(Error::malformed(format!("[{name}]"), "unknown section"))
}

fn non_empty_id<'a>(name: &str, id: &'a str) -> Result<&'a str> {
    let id = id.trim();
    if id.is_empty() {
        Err(Error::malformed(format!("[{name}]"), "section id is empty"))
    } else {
        Ok(id)
    }
}

/// Builds a [`Document`] from a flat document.
///
/// Keyed sections are loaded first so that unkeyed `[filter]` sections never
/// receive an id that a later keyed section claims.
///
/// # Errors
///
/// Returns [`Error::Malformed`] for unknown sections, missing author or title
/// keys and multi-valued properties other than `label`, and
/// [`Error::ReferentialIntegrity`] for dangling canned response references.
pub fn to_document(flat: &FlatDocument) -> Result<Document> {
    let mut doc = Document::new();
    let mut unkeyed = Vec::new();

    for section in flat.sections() {
        match role(&section.name)? {
            SectionRole::Author => {
                doc.author = Some(Author::new(
                    required_scalar(section, "name")?,
                    required_scalar(section, "email")?,
                ));
            }
            SectionRole::Defaults => doc.defaults = properties(section)?,
            SectionRole::Filter(id) => {
                doc.insert_filter(FilterRule {
                    id: id.to_string(),
                    properties: properties(section)?,
                })?;
            }
            SectionRole::UnkeyedFilter => unkeyed.push(section),
            SectionRole::Response(id) => {
                let title = required_scalar(section, "title")?;
                let content = section.scalar("content").unwrap_or_default();
                doc.insert_response(CannedResponse::new(id, title, content))?;
            }
        }
    }

    for section in unkeyed {
        let id = doc.add_filter(properties(section)?);
        debug!("Loaded unkeyed filter as {id}");
    }

    doc.check_references()?;
    Ok(doc)
}

/// Projects a [`Document`] onto its flat representation.
///
/// Every canned response is kept; the flat format does not track usage.
#[must_use]
pub fn from_document(doc: &Document) -> FlatDocument {
    let mut flat = FlatDocument::new();

    if let Some(author) = &doc.author {
        flat.push(
            Section::new(AUTHOR_SECTION)
                .with("name", author.name.as_str())
                .with("email", author.email.as_str()),
        );
    }

    if !doc.defaults.is_empty() {
        flat.push(properties_section(DEFAULTS_SECTION, &doc.defaults));
    }

    for rule in doc.filters() {
        flat.push(properties_section(
            &format!("{FILTER_PREFIX}{}", rule.id),
            &rule.properties,
        ));
    }

    for response in doc.responses() {
        flat.push(
            Section::new(format!("{RESPONSE_PREFIX}{}", response.id))
                .with("title", response.title.as_str())
                .with("content", response.content.as_str()),
        );
    }

    flat
}

fn properties_section(name: &str, props: &Properties) -> Section {
    let mut section = Section::new(name);
    for (prop, value) in props.iter() {
        let value = match value {
            PropertyValue::Scalar(text) => FlatValue::Scalar(text.clone()),
            PropertyValue::List(items) => FlatValue::List(items.clone()),
        };
        section.set(prop.as_str(), value);
    }
    section
}

fn properties(section: &Section) -> Result<Properties> {
    let mut props = Properties::new();
    for (key, value) in section.iter() {
        match (PropertyName::parse(key), value) {
            (PropertyName::Label, FlatValue::List(labels)) => props.set_labels(labels.clone()),
            (PropertyName::Label, FlatValue::Scalar(label)) if label.is_empty() => {
                props.set_labels(Vec::new());
            }
            (name, FlatValue::Scalar(text)) => props.set(name, text.as_str()),
            (_, FlatValue::List(_)) => {
                return Err(Error::malformed(
                    format!("[{}] {key}", section.name),
                    "only 'label' may hold multiple values",
                ));
            }
        }
    }
    Ok(props)
}

fn required_scalar<'a>(section: &'a Section, key: &str) -> Result<&'a str> {
    section.scalar(key).ok_or_else(|| {
        Error::malformed(
            format!("[{}]", section.name),
            format!("missing required key '{key}'"),
        )
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::flat::parser::parse;

    const SAMPLE: &str = "\
[author]
name = Jane Doe
email = jane@example.com

[filter:default]
shouldArchive = true

[filter:100]
from = x@y.com
label = Work, Later
cannedResponse = 7

[response:7]
title = Away
content = Back soon
";

    #[test]
    fn test_to_document() {
        let doc = to_document(&parse(SAMPLE).unwrap()).unwrap();

        assert_eq!(doc.author, Some(Author::new("Jane Doe", "jane@example.com")));
        assert_eq!(doc.defaults.scalar(&PropertyName::ShouldArchive), Some("true"));

        let rule = doc.filter("100").unwrap();
        assert_eq!(rule.labels(), ["Work", "Later"]);
        assert_eq!(rule.canned_response(), Some("7"));

        let response = doc.response("7").unwrap();
        assert_eq!(response.title, "Away");
        assert_eq!(response.content, "Back soon");
    }

    #[test]
    fn test_scalar_label_is_single_label() {
        let doc = to_document(&parse("[filter:1]\nlabel = Work\n").unwrap()).unwrap();
        assert_eq!(doc.filter("1").unwrap().labels(), ["Work"]);
    }

    #[test]
    fn test_list_on_scalar_property_rejected() {
        let err = to_document(&parse("[filter:1]\nfrom = a, b\n").unwrap()).unwrap_err();
        assert!(matches!(err, Error::Malformed { .. }));
    }

    #[test]
    fn test_unknown_section_rejected() {
        let err = to_document(&parse("[server]\nhost = x\n").unwrap()).unwrap_err();
        assert!(matches!(err, Error::Malformed { .. }));
    }

    #[test]
    fn test_defaults_id_with_spacing_is_not_a_filter() {
        let err = to_document(&parse("[filter: default ]\nfrom = a\n").unwrap()).unwrap_err();
        assert!(matches!(err, Error::Malformed { .. }));
    }

    #[test]
    fn test_empty_section_id_rejected() {
        assert!(to_document(&parse("[filter:]\nfrom = a\n").unwrap()).is_err());
    }

    #[test]
    fn test_dangling_reference() {
        let err = to_document(&parse("[filter:1]\ncannedResponse = nope\n").unwrap()).unwrap_err();
        assert!(matches!(err, Error::ReferentialIntegrity { .. }));
    }

    #[test]
    fn test_unkeyed_filters_get_fresh_ids() {
        let text = "[filter]\nfrom = a\n[filter:0]\nfrom = keyed\n[filter]\nfrom = b\n";
        let doc = to_document(&parse(text).unwrap()).unwrap();

        assert_eq!(doc.filter_count(), 3);
        assert_eq!(
            doc.filter("0").unwrap().properties.scalar(&PropertyName::From),
            Some("keyed")
        );
        assert_eq!(
            doc.filter("1").unwrap().properties.scalar(&PropertyName::From),
            Some("a")
        );
        assert_eq!(
            doc.filter("2").unwrap().properties.scalar(&PropertyName::From),
            Some("b")
        );
    }

    #[test]
    fn test_roundtrip_through_model() {
        let flat = parse(SAMPLE).unwrap();
        let doc = to_document(&flat).unwrap();
        assert_eq!(from_document(&doc), flat);
    }
}
