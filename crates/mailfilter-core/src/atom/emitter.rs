//! Atom feed writer.

use std::collections::BTreeSet;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::debug;

use super::{APPS_NS, ATOM_NS, Generation};
use crate::error::{Error, Result};
use crate::ids::{EntryKind, tag_uri};
use crate::model::{Author, CannedResponse, Document, FilterRule, PropertyName, PropertyValue};

const FEED_TITLE: &str = "Mail Filters";
const FILTER_TITLE: &str = "Mail Filter";

/// Serializes a [`Document`] as an Atom filter feed.
///
/// Document defaults are folded into every rule. A rule with several labels
/// becomes one sibling entry per label. Under [`Generation::ById`] only canned
/// responses referenced by some filter are written; under
/// [`Generation::ByTitle`] every response is written with a minted id and
/// referenced by title.
///
/// # Errors
///
/// Returns [`Error::ReferentialIntegrity`] if a filter cites an unknown
/// response, or [`Error::Xml`] / [`Error::Io`] if writing fails.
pub fn emit(doc: &Document, generation: Generation) -> Result<String> {
    doc.check_references()?;

    let mut feed = FeedWriter::new(doc, generation);
    feed.write_header()?;

    for rule in doc.filters() {
        feed.write_filter(rule)?;
    }

    let used = used_responses(doc);
    let mut minted = doc.allocator().clone();
    for response in doc.responses() {
        let id = match generation {
            Generation::ById => {
                if !used.contains(response.id.as_str()) {
                    debug!("Omitting unused canned response {}", response.id);
                    continue;
                }
                tag_uri(EntryKind::CannedResponse, &response.id)
            }
            Generation::ByTitle => tag_uri(
                EntryKind::CannedResponse,
                &minted.next(EntryKind::CannedResponse).to_string(),
            ),
        };
        feed.write_response(&id, response)?;
    }

    feed.finish()
}

/// Ids of canned responses referenced by at least one filter.
fn used_responses(doc: &Document) -> BTreeSet<String> {
    doc.filters()
        .filter_map(|rule| {
            doc.effective_properties(rule)
                .scalar(&PropertyName::CannedResponse)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
        })
        .collect()
}

struct FeedWriter<'a> {
    doc: &'a Document,
    generation: Generation,
    writer: Writer<Vec<u8>>,
}

impl<'a> FeedWriter<'a> {
    fn new(doc: &'a Document, generation: Generation) -> Self {
        Self {
            doc,
            generation,
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn write_header(&mut self) -> Result<()> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.writer.write_event(Event::Start(
            BytesStart::new("feed").with_attributes([("xmlns", ATOM_NS), ("xmlns:apps", APPS_NS)]),
        ))?;
        self.text_element("title", FEED_TITLE)?;
        if let Some(author) = &self.doc.author {
            self.write_author(author)?;
        }
        Ok(())
    }

    fn write_author(&mut self, author: &Author) -> Result<()> {
        self.writer.write_event(Event::Start(BytesStart::new("author")))?;
        self.text_element("name", &author.name)?;
        self.text_element("email", &author.email)?;
        self.writer.write_event(Event::End(BytesEnd::new("author")))?;
        Ok(())
    }

    fn write_filter(&mut self, rule: &FilterRule) -> Result<()> {
        let props = self.doc.effective_properties(rule);
        let labels = props.labels();

        if labels.is_empty() {
            return self.write_filter_entry(rule, None);
        }
        if labels.len() > 1 {
            debug!("Expanding filter {} into {} entries", rule.id, labels.len());
        }
        for label in labels {
            self.write_filter_entry(rule, Some(label.as_str()))?;
        }
        Ok(())
    }

    /// Writes one entry of a rule, carrying at most one label.
    fn write_filter_entry(&mut self, rule: &FilterRule, label: Option<&str>) -> Result<()> {
        self.start_entry(EntryKind::Filter)?;
        self.text_element("title", FILTER_TITLE)?;
        self.text_element("id", &tag_uri(EntryKind::Filter, &rule.id))?;
        self.writer.write_event(Event::Empty(BytesStart::new("content")))?;

        let props = self.doc.effective_properties(rule);
        for (name, value) in props.iter() {
            match (name, value) {
                (PropertyName::Label, _) => {
                    if let Some(label) = label {
                        self.property(name.as_str(), label)?;
                    }
                }
                (PropertyName::CannedResponse, PropertyValue::Scalar(id)) => {
                    if !id.is_empty() {
                        let reference = self.response_reference(&rule.id, id)?;
                        self.property(name.as_str(), &reference)?;
                    }
                }
                (_, PropertyValue::Scalar(value)) => self.property(name.as_str(), value)?,
                (_, PropertyValue::List(values)) => {
                    return Err(Error::malformed(
                        format!("filter '{}'", rule.id),
                        format!("property '{name}' holds {} values", values.len()),
                    ));
                }
            }
        }

        self.writer.write_event(Event::End(BytesEnd::new("entry")))?;
        Ok(())
    }

    fn response_reference(&self, filter: &str, id: &str) -> Result<String> {
        match self.generation {
            Generation::ById => Ok(tag_uri(EntryKind::CannedResponse, id)),
            Generation::ByTitle => self
                .doc
                .response(id)
                .map(|response| response.title.clone())
                .ok_or_else(|| Error::ReferentialIntegrity {
                    filter: filter.to_string(),
                    response: id.to_string(),
                }),
        }
    }

    fn write_response(&mut self, id: &str, response: &CannedResponse) -> Result<()> {
        self.start_entry(EntryKind::CannedResponse)?;
        self.text_element("title", &response.title)?;
        self.text_element("id", id)?;

        let content = BytesStart::new("content").with_attributes([("type", "text")]);
        if response.content.is_empty() {
            self.writer.write_event(Event::Empty(content))?;
        } else {
            self.writer.write_event(Event::Start(content))?;
            self.writer
                .write_event(Event::Text(BytesText::new(&response.content)))?;
            self.writer.write_event(Event::End(BytesEnd::new("content")))?;
        }

        self.writer.write_event(Event::End(BytesEnd::new("entry")))?;
        Ok(())
    }

    fn start_entry(&mut self, kind: EntryKind) -> Result<()> {
        self.writer.write_event(Event::Start(BytesStart::new("entry")))?;
        self.writer.write_event(Event::Empty(
            BytesStart::new("category").with_attributes([("term", kind.as_str())]),
        ))?;
        Ok(())
    }

    fn property(&mut self, name: &str, value: &str) -> Result<()> {
        self.writer.write_event(Event::Empty(
            BytesStart::new("apps:property").with_attributes([("name", name), ("value", value)]),
        ))?;
        Ok(())
    }

    fn text_element(&mut self, tag: &str, text: &str) -> Result<()> {
        if text.is_empty() {
            self.writer.write_event(Event::Empty(BytesStart::new(tag)))?;
            return Ok(());
        }
        self.writer.write_event(Event::Start(BytesStart::new(tag)))?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.writer.write_event(Event::End(BytesEnd::new(tag)))?;
        Ok(())
    }

    fn finish(mut self) -> Result<String> {
        self.writer.write_event(Event::End(BytesEnd::new("feed")))?;
        let mut xml = String::from_utf8(self.writer.into_inner())
            .map_err(|e| Error::malformed("feed", format!("output is not UTF-8: {e}")))?;
        xml.push('\n');
        Ok(xml)
    }
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
    use crate::atom::{ParseOptions, parse};

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.author = Some(Author::new("Jane Doe", "jane@example.com"));
        doc.insert_response(CannedResponse::new("1", "Away", "Gone <fishing> & back"))
            .unwrap();
        doc.insert_response(CannedResponse::new("2", "Unused", "Nobody cites me"))
            .unwrap();
        doc.insert_filter(
            FilterRule::new("100")
                .with(PropertyName::From, "x@y.com")
                .with_label("A")
                .with_label("B")
                .with_label("C")
                .with(PropertyName::CannedResponse, "1"),
        )
        .unwrap();
        doc
    }

    #[test]
    fn test_labels_expand_into_sibling_entries() {
        let xml = emit(&sample(), Generation::ById).unwrap();

        assert_eq!(xml.matches("<category term=\"filter\"/>").count(), 3);
        assert_eq!(
            xml.matches("<id>tag:mail.google.com,2008:filter:100</id>").count(),
            3
        );
        for label in ["A", "B", "C"] {
            assert!(xml.contains(&format!(
                "<apps:property name=\"label\" value=\"{label}\"/>"
            )));
        }
    }

    #[test]
    fn test_feed_header() {
        let xml = emit(&sample(), Generation::ById).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("xmlns=\"http://www.w3.org/2005/Atom\""));
        assert!(xml.contains("xmlns:apps=\"http://schemas.google.com/apps/2006\""));
        assert!(xml.contains("<name>Jane Doe</name>"));
        assert!(xml.contains("<email>jane@example.com</email>"));
        assert!(xml.ends_with("</feed>\n"));
    }

    #[test]
    fn test_unused_response_omitted_by_id() {
        let xml = emit(&sample(), Generation::ById).unwrap();
        assert!(xml.contains("tag:mail.google.com,2008:cannedResponse:1"));
        assert!(!xml.contains("Unused"));
    }

    #[test]
    fn test_by_title_writes_every_response() {
        let xml = emit(&sample(), Generation::ByTitle).unwrap();
        assert!(xml.contains("<title>Unused</title>"));
        assert!(xml.contains("<apps:property name=\"cannedResponse\" value=\"Away\"/>"));
        assert!(xml.contains("<id>tag:mail.google.com,2008:cannedResponse:0</id>"));
        assert!(xml.contains("<id>tag:mail.google.com,2008:cannedResponse:1</id>"));
    }

    #[test]
    fn test_content_is_escaped() {
        let xml = emit(&sample(), Generation::ById).unwrap();
        assert!(xml.contains("Gone &lt;fishing&gt; &amp; back"));
    }

    #[test]
    fn test_dangling_reference_rejected() {
        let mut doc = Document::new();
        doc.insert_filter(FilterRule::new("1").with(PropertyName::CannedResponse, "nope"))
            .unwrap();
        assert!(matches!(
            emit(&doc, Generation::ById),
            Err(Error::ReferentialIntegrity { .. })
        ));
    }

    #[test]
    fn test_defaults_folded_into_entries() {
        let mut doc = Document::new();
        doc.defaults.set(PropertyName::ShouldArchive, "true");
        doc.insert_filter(FilterRule::new("1").with(PropertyName::Subject, "hi"))
            .unwrap();
        let xml = emit(&doc, Generation::ById).unwrap();
        assert!(xml.contains("<apps:property name=\"shouldArchive\" value=\"true\"/>"));
    }

    #[test]
    fn test_emitted_feed_parses_back() {
        let doc = sample();
        let xml = emit(&doc, Generation::ById).unwrap();
        let parsed = parse(&xml, &ParseOptions::default()).unwrap();

        assert_eq!(parsed.author, doc.author);
        assert_eq!(parsed.filter_count(), 1);
        assert_eq!(parsed.filter("100").unwrap().labels(), ["A", "B", "C"]);
        assert_eq!(parsed.filter("100").unwrap().canned_response(), Some("1"));
        assert_eq!(
            parsed.response("1").unwrap().content,
            "Gone <fishing> & back"
        );
        assert!(parsed.response("2").is_none());
    }

    #[test]
    fn test_by_title_parses_back_by_title() {
        let xml = emit(&sample(), Generation::ByTitle).unwrap();
        let options = ParseOptions {
            generation: Generation::ByTitle,
            ..ParseOptions::default()
        };
        let parsed = parse(&xml, &options).unwrap();
        assert_eq!(parsed.response_count(), 2);
        assert_eq!(parsed.filter("100").unwrap().canned_response(), Some("Away"));
    }
}
