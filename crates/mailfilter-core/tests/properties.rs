//! Property tests for the flat codec and feed label expansion.

use proptest::prelude::*;

use mailfilter_core::atom::{self, Generation, ParseOptions};
use mailfilter_core::{
    Author, CannedResponse, Document, FilterRule, FlatDocument, Properties, PropertyName, flat,
};

const SCALAR_PROPERTIES: [PropertyName; 6] = [
    PropertyName::From,
    PropertyName::To,
    PropertyName::Subject,
    PropertyName::HasTheWord,
    PropertyName::DoesNotHaveTheWord,
    PropertyName::SmartLabelToApply,
];

fn arb_line() -> impl Strategy<Value = String> {
    "\\PC{0,24}"
}

fn arb_multiline() -> impl Strategy<Value = String> {
    prop::collection::vec("\\PC{0,12}", 2..5).prop_map(|lines| lines.join("\n"))
}

fn arb_value() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => arb_line(),
        1 => arb_multiline(),
        1 => Just("from:(a@b.com OR c@d.com) subject:\"weekly, report\" -#tag".to_string()),
    ]
}

fn arb_properties() -> impl Strategy<Value = Vec<(usize, String)>> {
    prop::collection::vec((0..SCALAR_PROPERTIES.len(), arb_value()), 0..5)
}

fn arb_response() -> impl Strategy<Value = (u32, String, String)> {
    (0u32..1000, arb_line(), prop_oneof![arb_line(), arb_multiline()])
}

fn properties(pairs: Vec<(usize, String)>) -> Properties {
    let mut props = Properties::new();
    for (index, value) in pairs {
        props.set(SCALAR_PROPERTIES[index].clone(), value);
    }
    props
}

fn arb_document() -> impl Strategy<Value = Document> {
    (
        prop::option::of((arb_line(), arb_line())),
        arb_properties(),
        prop::collection::vec((0u32..100_000, arb_properties()), 0..6),
        prop::collection::vec(arb_response(), 0..3),
    )
        .prop_map(|(author, defaults, rules, responses)| {
            let mut doc = Document::new();
            doc.author = author.map(|(name, email)| Author::new(name, email));
            doc.defaults = properties(defaults);
            for (id, props) in rules {
                let mut rule = FilterRule::new(id.to_string());
                rule.properties = properties(props);
                // Ids may collide; the first rule wins
                let _ = doc.insert_filter(rule);
            }
            for (id, title, content) in responses {
                let _ = doc.insert_response(CannedResponse::new(id.to_string(), title, content));
            }
            doc
        })
}

fn arb_labels() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[A-Za-z][A-Za-z0-9/ _-]{0,10}[A-Za-z0-9]", 1..6)
        .prop_map(|labels| labels.into_iter().collect())
}

proptest! {
    #[test]
    fn scalar_documents_round_trip_through_flat(doc in arb_document()) {
        // Values holding both quote styles around a line break have no flat form
        let rendered = flat::from_document(&doc).render();
        prop_assume!(rendered.is_ok());
        let text = rendered.unwrap();
        let parsed = flat::to_document(&FlatDocument::parse(&text).unwrap()).unwrap();

        prop_assert_eq!(&parsed.author, &doc.author);
        prop_assert_eq!(&parsed.defaults, &doc.defaults);
        prop_assert_eq!(parsed.filters().collect::<Vec<_>>(), doc.filters().collect::<Vec<_>>());
        prop_assert_eq!(
            parsed.responses().collect::<Vec<_>>(),
            doc.responses().collect::<Vec<_>>()
        );
    }

    #[test]
    fn labels_expand_into_one_entry_each(labels in arb_labels()) {
        let mut rule = FilterRule::new("42").with(PropertyName::From, "x@y.com");
        for label in &labels {
            rule = rule.with_label(label.as_str());
        }
        let mut doc = Document::new();
        doc.insert_filter(rule).unwrap();

        let xml = atom::emit(&doc, Generation::ById).unwrap();
        prop_assert_eq!(
            xml.matches("<id>tag:mail.google.com,2008:filter:42</id>").count(),
            labels.len()
        );

        let parsed = atom::parse(&xml, &ParseOptions::default()).unwrap();
        prop_assert_eq!(parsed.filter_count(), 1);
        prop_assert_eq!(parsed.filter("42").unwrap().labels(), labels.as_slice());
    }

    #[test]
    fn fresh_filters_get_sequential_ids(count in 1usize..20) {
        let text: String = (0..count)
            .map(|n| format!("[filter]\nsubject = s{n}\n\n"))
            .collect();
        let doc = flat::to_document(&FlatDocument::parse(&text).unwrap()).unwrap();

        let ids: Vec<_> = doc.filters().map(|rule| rule.id.parse::<usize>().unwrap()).collect();
        let mut expected: Vec<_> = (0..count).collect();
        expected.sort_by_key(ToString::to_string);
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        prop_assert_eq!(sorted, (0..count).collect::<Vec<_>>());
        prop_assert_eq!(ids, expected);
    }
}
