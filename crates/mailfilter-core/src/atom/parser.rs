//! Atom feed reader.

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use tracing::{debug, warn};

use super::{APPS_NS, ATOM_NS, AuthorPolicy, Generation, ParseOptions};
use crate::error::{Error, Result};
use crate::ids::{EntryKind, strip_tag_uri};
use crate::model::{Author, CannedResponse, Document, FilterRule, Properties, PropertyName};

/// Namespace an element resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ns {
    Atom,
    Apps,
    Unbound,
    Foreign,
}

impl Ns {
    fn of(resolved: &ResolveResult<'_>) -> Self {
        match resolved {
            ResolveResult::Bound(Namespace(uri)) if *uri == ATOM_NS.as_bytes() => Self::Atom,
            ResolveResult::Bound(Namespace(uri)) if *uri == APPS_NS.as_bytes() => Self::Apps,
            ResolveResult::Unbound => Self::Unbound,
            _ => Self::Foreign,
        }
    }

    // Documents without namespace declarations are read as Atom.
    const fn is_atom(self) -> bool {
        matches!(self, Self::Atom | Self::Unbound)
    }

    const fn is_apps(self) -> bool {
        matches!(self, Self::Apps | Self::Unbound)
    }
}

/// Element of interest in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Feed,
    Author,
    AuthorName,
    AuthorEmail,
    Entry,
    EntryId,
    EntryTitle,
    EntryContent,
    Category,
    Property,
    Other,
}

impl Node {
    const fn captures_text(self) -> bool {
        matches!(
            self,
            Self::AuthorName | Self::AuthorEmail | Self::EntryId | Self::EntryTitle | Self::EntryContent
        )
    }
}

#[derive(Debug, Default)]
struct RawAuthor {
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Default)]
struct RawEntry {
    position: usize,
    kind: Option<EntryKind>,
    id: Option<String>,
    title: Option<String>,
    content: Option<String>,
    properties: Vec<(String, String)>,
}

impl RawEntry {
    fn context(&self) -> String {
        match &self.id {
            Some(id) => format!("entry '{id}'"),
            None => format!("entry #{}", self.position),
        }
    }

    fn require_id(&self) -> Result<&str> {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::malformed(self.context(), "entry has no id"))
    }
}

/// Collects the raw feed structure from reader events.
#[derive(Debug, Default)]
struct FeedCollector {
    path: Vec<Node>,
    text: String,
    saw_root: bool,
    author: Option<RawAuthor>,
    entries: Vec<RawEntry>,
    current: Option<RawEntry>,
}

impl FeedCollector {
    fn classify(&self, ns: Ns, local: &[u8]) -> Result<Node> {
        let Some(parent) = self.path.last().copied() else {
            if self.saw_root {
                return Err(Error::malformed("feed", "multiple root elements"));
            }
            if ns.is_atom() && local == b"feed" {
                return Ok(Node::Feed);
            }
            return Err(Error::malformed("feed", "root element is not an Atom feed"));
        };

        let node = match (parent, local) {
            (Node::Feed, b"author") if ns.is_atom() => Node::Author,
            (Node::Feed, b"entry") if ns.is_atom() => Node::Entry,
            (Node::Author, b"name") if ns.is_atom() => Node::AuthorName,
            (Node::Author, b"email") if ns.is_atom() => Node::AuthorEmail,
            (Node::Entry, b"id") if ns.is_atom() => Node::EntryId,
            (Node::Entry, b"title") if ns.is_atom() => Node::EntryTitle,
            (Node::Entry, b"content") if ns.is_atom() => Node::EntryContent,
            (Node::Entry, b"category") if ns.is_atom() => Node::Category,
            (Node::Entry, b"property") if ns.is_apps() => Node::Property,
            (Node::Entry, b"property") => {
                warn!("Ignoring property outside the apps namespace");
                Node::Other
            }
            _ => Node::Other,
        };
        Ok(node)
    }

    fn open(&mut self, ns: Ns, element: &BytesStart<'_>) -> Result<Node> {
        let node = self.classify(ns, element.local_name().as_ref())?;

        match node {
            Node::Feed => self.saw_root = true,
            Node::Author => {
                if self.author.is_some() {
                    warn!("Ignoring additional author block");
                } else {
                    self.author = Some(RawAuthor::default());
                }
            }
            Node::Entry => {
                self.current = Some(RawEntry {
                    position: self.entries.len() + 1,
                    ..RawEntry::default()
                });
            }
            Node::Category => {
                if let Some(entry) = self.current.as_mut() {
                    if entry.kind.is_none() {
                        entry.kind = attribute(element, b"term")?
                            .as_deref()
                            .and_then(EntryKind::parse);
                    }
                }
            }
            Node::Property => {
                if let Some(entry) = self.current.as_mut() {
                    let Some(name) = attribute(element, b"name")? else {
                        return Err(Error::malformed(
                            entry.context(),
                            "property without a name attribute",
                        ));
                    };
                    let value = attribute(element, b"value")?.unwrap_or_default();
                    entry.properties.push((name, value));
                }
            }
            _ if node.captures_text() => self.text.clear(),
            _ => {}
        }

        Ok(node)
    }

    fn close(&mut self, node: Node) {
        let text = std::mem::take(&mut self.text);
        match node {
            Node::AuthorName => {
                if let Some(author) = self.author.as_mut() {
                    author.name.get_or_insert_with(|| text.trim().to_string());
                }
            }
            Node::AuthorEmail => {
                if let Some(author) = self.author.as_mut() {
                    author.email.get_or_insert_with(|| text.trim().to_string());
                }
            }
            Node::EntryId => {
                if let Some(entry) = self.current.as_mut() {
                    entry.id = Some(text.trim().to_string());
                }
            }
            Node::EntryTitle => {
                if let Some(entry) = self.current.as_mut() {
                    entry.title = Some(text.trim().to_string());
                }
            }
            // XML line endings are normalized to LF.
            Node::EntryContent => {
                if let Some(entry) = self.current.as_mut() {
                    entry.content = Some(text.replace("\r\n", "\n").replace('\r', "\n"));
                }
            }
            Node::Entry => {
                if let Some(entry) = self.current.take() {
                    self.entries.push(entry);
                }
            }
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.path.last().is_some_and(|node| node.captures_text()) {
            self.text.push_str(text);
        }
    }
}

fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Parses an Atom filter feed into a [`Document`].
///
/// Canned responses are keyed according to `options.generation`. Filter
/// entries sharing one id are merged: their labels accumulate, all other
/// properties must agree. References are checked once every entry is read.
///
/// # Errors
///
/// - [`Error::Xml`] if the input is not well-formed XML.
/// - [`Error::Malformed`] for a non-feed root, entries without ids, an
///   incomplete author block (or a missing one under
///   [`AuthorPolicy::Required`]), duplicate responses and disagreeing sibling
///   entries.
/// - [`Error::ReferentialIntegrity`] if a filter cites an unknown response.
pub fn parse(xml: &str, options: &ParseOptions) -> Result<Document> {
    let mut reader = NsReader::from_str(xml);
    let mut collector = FeedCollector::default();

    loop {
        let (resolved, event) = reader.read_resolved_event()?;
        let ns = Ns::of(&resolved);
        match event {
            Event::Start(element) => {
                let node = collector.open(ns, &element)?;
                collector.path.push(node);
            }
            Event::Empty(element) => {
                let node = collector.open(ns, &element)?;
                collector.close(node);
            }
            Event::End(_) => {
                if let Some(node) = collector.path.pop() {
                    collector.close(node);
                }
            }
            Event::Text(text) => collector.push_text(&text.unescape()?),
            Event::CData(data) => {
                let text = std::str::from_utf8(&data)
                    .map_err(|e| Error::malformed("feed", format!("invalid CDATA: {e}")))?;
                collector.push_text(text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !collector.saw_root {
        return Err(Error::malformed("feed", "document has no root element"));
    }

    build(collector, options)
}

fn build(collector: FeedCollector, options: &ParseOptions) -> Result<Document> {
    let mut doc = Document::new();

    match collector.author {
        Some(raw) => {
            let name = raw
                .name
                .ok_or_else(|| Error::malformed("author", "author block has no name"))?;
            let email = raw
                .email
                .ok_or_else(|| Error::malformed("author", "author block has no email"))?;
            doc.author = Some(Author::new(name, email));
        }
        None if options.author == AuthorPolicy::Required => {
            return Err(Error::malformed("feed", "missing author block"));
        }
        None => {}
    }

    let (responses, rest): (Vec<_>, Vec<_>) = collector
        .entries
        .into_iter()
        .partition(|entry| entry.kind == Some(EntryKind::CannedResponse));

    for entry in responses {
        let id = entry.require_id()?;
        let title = entry.title.clone().unwrap_or_default();
        let key = match options.generation {
            Generation::ById => strip_tag_uri(EntryKind::CannedResponse, id).to_string(),
            Generation::ByTitle => {
                if title.is_empty() {
                    return Err(Error::malformed(entry.context(), "canned response has no title"));
                }
                title.clone()
            }
        };
        debug!("Loaded canned response {key}");
        doc.insert_response(CannedResponse::new(
            key,
            title,
            entry.content.clone().unwrap_or_default(),
        ))?;
    }

    for entry in rest {
        if entry.kind != Some(EntryKind::Filter) {
            debug!("Skipping {} without a known category", entry.context());
            continue;
        }
        let id = strip_tag_uri(EntryKind::Filter, entry.require_id()?).to_string();
        let properties = collect_properties(&entry, options.generation)?;

        match doc.filter_mut(&id) {
            Some(existing) => merge_sibling(existing, properties)?,
            None => {
                debug!("Loaded filter {id}");
                doc.insert_filter(FilterRule { id, properties })?;
            }
        }
    }

    doc.check_references()?;
    Ok(doc)
}

fn collect_properties(entry: &RawEntry, generation: Generation) -> Result<Properties> {
    let mut props = Properties::new();

    for (name, value) in &entry.properties {
        let name = PropertyName::parse(name);
        if name == PropertyName::Label {
            if !value.is_empty() {
                props.add_label(value.as_str());
            }
            continue;
        }

        let value = match (&name, generation) {
            (PropertyName::CannedResponse, Generation::ById) => {
                strip_tag_uri(EntryKind::CannedResponse, value)
            }
            _ => value.as_str(),
        };
        if let Some(existing) = props.scalar(&name) {
            if existing != value {
                return Err(Error::malformed(
                    entry.context(),
                    format!("conflicting values for property '{name}'"),
                ));
            }
            continue;
        }
        props.set(name, value);
    }

    Ok(props)
}

/// Folds a sibling entry's properties into an already loaded rule.
fn merge_sibling(rule: &mut FilterRule, incoming: Properties) -> Result<()> {
    let scalars = |props: &Properties| {
        let mut pairs: Vec<(String, String)> = props
            .iter()
            .filter_map(|(name, value)| {
                value
                    .as_scalar()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        pairs.sort();
        pairs
    };

    if scalars(&rule.properties) != scalars(&incoming) {
        return Err(Error::malformed(
            format!("filter '{}'", rule.id),
            "sibling entries differ in properties other than label",
        ));
    }

    for label in incoming.labels() {
        rule.properties.add_label(label.as_str());
    }
    Ok(())
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

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:apps="http://schemas.google.com/apps/2006">
  <title>Mail Filters</title>
  <author>
    <name> Jane Doe </name>
    <email>jane@example.com</email>
  </author>
  <entry>
    <category term="filter"></category>
    <title>Mail Filter</title>
    <id>tag:mail.google.com,2008:filter:100</id>
    <content></content>
    <apps:property name="from" value="x@y.com"/>
    <apps:property name="label" value="Work"/>
    <apps:property name="label" value="Later"/>
    <apps:property name="cannedResponse" value="tag:mail.google.com,2008:cannedResponse:7"/>
  </entry>
  <entry>
    <category term="cannedResponse"></category>
    <title>Away</title>
    <id>tag:mail.google.com,2008:cannedResponse:7</id>
    <content type="text">I am away &amp; offline.</content>
  </entry>
</feed>
"#;

    fn parse_default(xml: &str) -> Result<Document> {
        parse(xml, &ParseOptions::default())
    }

    #[test]
    fn test_parse_feed() {
        let doc = parse_default(FEED).unwrap();

        assert_eq!(doc.author, Some(Author::new("Jane Doe", "jane@example.com")));

        let rule = doc.filter("100").unwrap();
        assert_eq!(rule.properties.scalar(&PropertyName::From), Some("x@y.com"));
        assert_eq!(rule.labels(), ["Work", "Later"]);
        assert_eq!(rule.canned_response(), Some("7"));

        let response = doc.response("7").unwrap();
        assert_eq!(response.title, "Away");
        assert_eq!(response.content, "I am away & offline.");
    }

    #[test]
    fn test_property_order_preserved() {
        let doc = parse_default(FEED).unwrap();
        let names: Vec<_> = doc
            .filter("100")
            .unwrap()
            .properties
            .iter()
            .map(|(name, _)| name.as_str().to_string())
            .collect();
        assert_eq!(names, ["from", "label", "cannedResponse"]);
    }

    #[test]
    fn test_by_title_generation() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:apps="http://schemas.google.com/apps/2006">
  <entry>
    <category term="filter"/>
    <id>1</id>
    <apps:property name="cannedResponse" value="Away"/>
  </entry>
  <entry>
    <category term="cannedResponse"/>
    <title>Away</title>
    <id>tag:mail.google.com,2008:cannedResponse:99</id>
    <content>Gone</content>
  </entry>
</feed>"#;
        let options = ParseOptions {
            generation: Generation::ByTitle,
            ..ParseOptions::default()
        };
        let doc = parse(xml, &options).unwrap();
        assert_eq!(doc.response("Away").unwrap().content, "Gone");
        assert_eq!(doc.filter("1").unwrap().canned_response(), Some("Away"));

        // The same feed read by id has a dangling reference
        assert!(matches!(
            parse_default(xml),
            Err(Error::ReferentialIntegrity { .. })
        ));
    }

    #[test]
    fn test_sibling_entries_merge_labels() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:apps="http://schemas.google.com/apps/2006">
  <entry><category term="filter"/><id>5</id>
    <apps:property name="from" value="a@b.com"/><apps:property name="label" value="L1"/></entry>
  <entry><category term="filter"/><id>5</id>
    <apps:property name="from" value="a@b.com"/><apps:property name="label" value="L2"/></entry>
</feed>"#;
        let doc = parse_default(xml).unwrap();
        assert_eq!(doc.filter_count(), 1);
        assert_eq!(doc.filter("5").unwrap().labels(), ["L1", "L2"]);
    }

    #[test]
    fn test_disagreeing_siblings_rejected() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:apps="http://schemas.google.com/apps/2006">
  <entry><category term="filter"/><id>5</id><apps:property name="from" value="a@b.com"/></entry>
  <entry><category term="filter"/><id>5</id><apps:property name="from" value="c@d.com"/></entry>
</feed>"#;
        assert!(matches!(parse_default(xml), Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_dangling_reference() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:apps="http://schemas.google.com/apps/2006">
  <entry><category term="filter"/><id>1</id>
    <apps:property name="cannedResponse" value="missing"/></entry>
</feed>"#;
        match parse_default(xml).unwrap_err() {
            Error::ReferentialIntegrity { filter, response } => {
                assert_eq!(filter, "1");
                assert_eq!(response, "missing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reference_resolved_regardless_of_entry_order() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:apps="http://schemas.google.com/apps/2006">
  <entry><category term="filter"/><id>1</id>
    <apps:property name="cannedResponse" value="r"/></entry>
  <entry><category term="cannedResponse"/><id>r</id><title>T</title><content>C</content></entry>
</feed>"#;
        assert!(parse_default(xml).is_ok());
    }

    #[test]
    fn test_author_policy() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>x</title></feed>"#;
        assert!(parse_default(xml).unwrap().author.is_none());

        let options = ParseOptions {
            author: AuthorPolicy::Required,
            ..ParseOptions::default()
        };
        assert!(matches!(parse(xml, &options), Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_incomplete_author() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><author><name>J</name></author></feed>"#;
        assert!(matches!(parse_default(xml), Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_entry_without_id() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry><category term="filter"/></entry></feed>"#;
        assert!(matches!(parse_default(xml), Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_unknown_category_skipped() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry><category term="other"/><id>1</id></entry></feed>"#;
        let doc = parse_default(xml).unwrap();
        assert_eq!(doc.filter_count(), 0);
        assert_eq!(doc.response_count(), 0);
    }

    #[test]
    fn test_wrong_root() {
        assert!(matches!(
            parse_default("<rss><channel/></rss>"),
            Err(Error::Malformed { .. })
        ));
        assert!(parse_default("").is_err());
    }

    #[test]
    fn test_mismatched_tags() {
        assert!(matches!(
            parse_default(r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry></feed>"#),
            Err(Error::Xml(_))
        ));
    }

    #[test]
    fn test_cdata_content() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry><category term="cannedResponse"/><id>r</id><title>T</title><content><![CDATA[<b>hi</b>]]></content></entry></feed>"#;
        let doc = parse_default(xml).unwrap();
        assert_eq!(doc.response("r").unwrap().content, "<b>hi</b>");
    }

    #[test]
    fn test_reserved_filter_id_rejected() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:apps="http://schemas.google.com/apps/2006">
  <entry><category term="filter"/><id>tag:mail.google.com,2008:filter:default</id>
    <apps:property name="from" value="spam@x.com"/><apps:property name="shouldTrash" value="true"/></entry>
  <entry><category term="filter"/><id>1</id>
    <apps:property name="from" value="boss@x.com"/></entry>
</feed>"#;
        match parse_default(xml).unwrap_err() {
            Error::Malformed { context, .. } => assert_eq!(context, "filter 'default'"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_property_outside_apps_namespace_ignored() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:apps="http://schemas.google.com/apps/2006">
  <entry><category term="filter"/><id>1</id>
    <property name="from" value="a@b.com"/><apps:property name="to" value="c@d.com"/></entry>
</feed>"#;
        let doc = parse_default(xml).unwrap();
        let rule = doc.filter("1").unwrap();
        assert_eq!(rule.properties.scalar(&PropertyName::From), None);
        assert_eq!(rule.properties.scalar(&PropertyName::To), Some("c@d.com"));
    }

    #[test]
    fn test_content_line_endings_normalized() {
        let xml = "<feed xmlns=\"http://www.w3.org/2005/Atom\"><entry><category term=\"cannedResponse\"/>\
                   <id>r</id><title>T</title><content>line one\r\nline two\rthree</content></entry></feed>";
        let doc = parse_default(xml).unwrap();
        assert_eq!(doc.response("r").unwrap().content, "line one\nline two\nthree");
    }
}
