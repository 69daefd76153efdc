//! JSON round trip of the document model (`--features serde`).

#![cfg(feature = "serde")]
#![allow(clippy::unwrap_used)]

use mailfilter_core::{Document, FlatDocument, PropertyName, flat};

const FLAT: &str = r#"[author]
name = Jane Doe
email = jane@example.com

[filter:default]
shouldArchive = true

[filter:100]
from = x@y.com
label = Work, "Later, maybe"
cannedResponse = 7

[filter:101]
label = ,
customHeader = X-Priority

[response:7]
title = Away
content = """I am away.
Back Monday."""
"#;

#[test]
fn document_round_trips_through_json() {
    let doc = flat::to_document(&FlatDocument::parse(FLAT).unwrap()).unwrap();

    let json = serde_json::to_string(&doc).unwrap();
    let restored: Document = serde_json::from_str(&json).unwrap();

    assert_eq!(restored, doc);
}

#[test]
fn property_names_serialize_as_gmail_names() {
    let doc = flat::to_document(&FlatDocument::parse(FLAT).unwrap()).unwrap();
    let value = serde_json::to_value(doc.filter("100").unwrap()).unwrap();

    let entries = &value["properties"]["entries"];
    assert_eq!(entries[0][0], "from");
    assert_eq!(entries[1][0], "label");
    assert_eq!(entries[1][1], serde_json::json!(["Work", "Later, maybe"]));
    assert_eq!(entries[2][0], PropertyName::CannedResponse.as_str());
}
