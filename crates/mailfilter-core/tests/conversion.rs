//! Integration tests for whole-document conversion.
//!
//! These tests drive the public API with realistic exports and hand-written
//! flat files in both directions.

use mailfilter_core::atom::{self, Generation, ParseOptions};
use mailfilter_core::{
    ConvertOptions, Document, Error, FlatDocument, Format, PropertyName, convert, flat, read,
};

const EXPORT: &str = r#"<?xml version='1.0' encoding='UTF-8'?>
<feed xmlns='http://www.w3.org/2005/Atom' xmlns:apps='http://schemas.google.com/apps/2006'>
  <title>Mail Filters</title>
  <id>tag:mail.google.com,2008:filters:1286,1287,1288</id>
  <updated>2024-03-01T10:00:00Z</updated>
  <author>
    <name>Jane Doe</name>
    <email>jane@example.com</email>
  </author>
  <entry>
    <category term='filter'></category>
    <title>Mail Filter</title>
    <id>tag:mail.google.com,2008:filter:1286</id>
    <updated>2024-03-01T10:00:00Z</updated>
    <content></content>
    <apps:property name='from' value='alerts@ci.example.com'/>
    <apps:property name='label' value='CI'/>
    <apps:property name='shouldArchive' value='true'/>
  </entry>
  <entry>
    <category term='filter'></category>
    <title>Mail Filter</title>
    <id>tag:mail.google.com,2008:filter:1286</id>
    <updated>2024-03-01T10:00:00Z</updated>
    <content></content>
    <apps:property name='from' value='alerts@ci.example.com'/>
    <apps:property name='label' value='Noise'/>
    <apps:property name='shouldArchive' value='true'/>
  </entry>
  <entry>
    <category term='filter'></category>
    <title>Mail Filter</title>
    <id>tag:mail.google.com,2008:filter:1287</id>
    <updated>2024-03-01T10:00:00Z</updated>
    <content></content>
    <apps:property name='to' value='support@example.com'/>
    <apps:property name='cannedResponse' value='tag:mail.google.com,2008:cannedResponse:1288'/>
    <apps:property name='sizeOperator' value='s_sl'/>
    <apps:property name='sizeUnit' value='s_smb'/>
  </entry>
  <entry>
    <category term='cannedResponse'></category>
    <title>Support reply</title>
    <id>tag:mail.google.com,2008:cannedResponse:1288</id>
    <updated>2024-03-01T10:00:00Z</updated>
    <content type='text'>Thanks for reaching out.
We will get back to you shortly.</content>
  </entry>
</feed>
"#;

fn hierarchical_to_flat() -> ConvertOptions {
    ConvertOptions::new(Format::Hierarchical, Format::Flat)
}

fn flat_to_hierarchical() -> ConvertOptions {
    ConvertOptions::new(Format::Flat, Format::Hierarchical)
}

#[test]
fn test_export_to_flat() {
    let output = convert(EXPORT, &hierarchical_to_flat()).unwrap();
    let flat = FlatDocument::parse(&output).unwrap();

    let author = flat.section("author").unwrap();
    assert_eq!(author.scalar("name"), Some("Jane Doe"));
    assert_eq!(author.scalar("email"), Some("jane@example.com"));

    let ci = flat.section("filter:1286").unwrap();
    assert_eq!(ci.scalar("from"), Some("alerts@ci.example.com"));
    assert_eq!(
        ci.get("label").unwrap().to_list(),
        ["CI".to_string(), "Noise".to_string()]
    );

    let support = flat.section("filter:1287").unwrap();
    assert_eq!(support.scalar("cannedResponse"), Some("1288"));

    let response = flat.section("response:1288").unwrap();
    assert_eq!(response.scalar("title"), Some("Support reply"));
    assert_eq!(
        response.scalar("content"),
        Some("Thanks for reaching out.\nWe will get back to you shortly.")
    );
}

#[test]
fn test_export_round_trip() {
    let flat = convert(EXPORT, &hierarchical_to_flat()).unwrap();
    let xml = convert(&flat, &flat_to_hierarchical()).unwrap();

    let original = atom::parse(EXPORT, &ParseOptions::default()).unwrap();
    let reparsed = atom::parse(&xml, &ParseOptions::default()).unwrap();

    assert_eq!(original.author, reparsed.author);
    let original_rules: Vec<_> = original.filters().collect();
    let reparsed_rules: Vec<_> = reparsed.filters().collect();
    assert_eq!(original_rules, reparsed_rules);
    let original_responses: Vec<_> = original.responses().collect();
    let reparsed_responses: Vec<_> = reparsed.responses().collect();
    assert_eq!(original_responses, reparsed_responses);
}

#[test]
fn test_hand_written_flat_file() {
    let input = r#"
# Personal filters
[author]
name = Jane Doe
email = jane@example.com

[filter:default]
shouldNeverSpam = true

[filter]
from = newsletter@example.org
label = Reading,

[filter]
hasTheWord = "invoice, receipt"
label = Finance, Paperwork

[filter:legacy]
subject = [JIRA]
cannedResponse = ooo

[response:ooo]
title = Out of office
content = """I am away until Monday.
For urgent issues call the front desk."""
"#;

    let doc = read(input, &flat_to_hierarchical()).unwrap();
    assert_eq!(doc.filter_count(), 3);
    assert_eq!(doc.filter("0").unwrap().labels(), ["Reading"]);
    assert_eq!(
        doc.filter("1")
            .unwrap()
            .properties
            .scalar(&PropertyName::HasTheWord),
        Some("invoice, receipt")
    );
    assert_eq!(doc.filter("1").unwrap().labels(), ["Finance", "Paperwork"]);

    let xml = convert(input, &flat_to_hierarchical()).unwrap();
    // Two-label filter expands into two entries, defaults land on every entry
    assert_eq!(xml.matches("<category term=\"filter\"/>").count(), 4);
    assert_eq!(
        xml.matches("<apps:property name=\"shouldNeverSpam\" value=\"true\"/>")
            .count(),
        4
    );
    assert!(xml.contains("<id>tag:mail.google.com,2008:cannedResponse:ooo</id>"));
}

#[test]
fn test_unused_response_dropped_from_feed() {
    let input = "[filter:1]\ncannedResponse = used\n\n\
                 [response:used]\ntitle = Used\n\n\
                 [response:spare]\ntitle = Spare\ncontent = never sent\n";

    let xml = convert(input, &flat_to_hierarchical()).unwrap();
    assert!(xml.contains("<title>Used</title>"));
    assert!(!xml.contains("Spare"));

    // Flat output keeps every response
    let flat = convert(input, &ConvertOptions::new(Format::Flat, Format::Flat)).unwrap();
    assert!(flat.contains("[response:spare]"));
}

#[test]
fn test_dangling_reference_in_flat_input() {
    let input = "[filter:1]\ncannedResponse = ghost\n";
    match convert(input, &flat_to_hierarchical()).unwrap_err() {
        Error::ReferentialIntegrity { filter, response } => {
            assert_eq!(filter, "1");
            assert_eq!(response, "ghost");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_validation_reports_every_violation() {
    let input = "[author]\nname = Jane\n\n\
                 [filter:1]\nshouldStar = often\nsize = large\n\n\
                 [response:1]\ncontent = no title\n\n\
                 [mystery]\nkey = value\n";

    let Error::Validation(violations) = convert(input, &flat_to_hierarchical()).unwrap_err()
    else {
        panic!("expected validation failure");
    };

    let rendered: Vec<String> = violations.iter().map(ToString::to_string).collect();
    assert_eq!(violations.len(), 5, "{rendered:#?}");
    assert!(rendered.contains(&"[author] email: required key is missing".to_string()));
    assert!(rendered.contains(&"[response:1] title: required key is missing".to_string()));
    assert!(rendered.contains(&"[mystery]: unknown section".to_string()));
}

#[test]
fn test_filter_named_default_never_becomes_defaults() {
    let input = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:apps="http://schemas.google.com/apps/2006">
  <entry><category term="filter"/><id>tag:mail.google.com,2008:filter:default</id>
    <apps:property name="from" value="spam@x.com"/>
    <apps:property name="shouldTrash" value="true"/></entry>
  <entry><category term="filter"/><id>tag:mail.google.com,2008:filter:1</id>
    <apps:property name="from" value="boss@x.com"/></entry>
</feed>"#;

    match convert(input, &hierarchical_to_flat()).unwrap_err() {
        Error::Malformed { context, .. } => assert_eq!(context, "filter 'default'"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_malformed_inputs() {
    assert!(matches!(
        convert("<feed><entry></feed>", &hierarchical_to_flat()),
        Err(Error::Xml(_))
    ));
    assert!(matches!(
        convert("[filter:1]\nfrom = a\nfrom = b\n", &flat_to_hierarchical()),
        Err(Error::Malformed { .. })
    ));
}

#[test]
fn test_by_title_generation_round_trip() {
    let options = ConvertOptions::new(Format::Hierarchical, Format::Hierarchical)
        .generation(Generation::ByTitle);

    let mut doc = Document::new();
    doc.insert_response(mailfilter_core::CannedResponse::new("a", "Thanks", "Cheers"))
        .unwrap();
    doc.insert_filter(
        mailfilter_core::FilterRule::new("9").with(PropertyName::CannedResponse, "a"),
    )
    .unwrap();

    let by_id = atom::emit(&doc, Generation::ById).unwrap();
    assert!(matches!(
        convert(&by_id, &options),
        Err(Error::ReferentialIntegrity { .. })
    ));

    let by_title = atom::emit(&doc, Generation::ByTitle).unwrap();
    let output = convert(&by_title, &options).unwrap();
    assert!(output.contains("<apps:property name=\"cannedResponse\" value=\"Thanks\"/>"));
}

#[test]
fn test_flat_projection_is_renderable() {
    let doc = atom::parse(EXPORT, &ParseOptions::default()).unwrap();
    let text = flat::from_document(&doc).render().unwrap();
    let back = flat::to_document(&FlatDocument::parse(&text).unwrap()).unwrap();
    assert_eq!(back.filter_count(), doc.filter_count());
    assert_eq!(back.response_count(), doc.response_count());
}
