//! End-to-end conversion between document formats.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, info};

use crate::atom::{self, AuthorPolicy, Generation, ParseOptions};
use crate::error::{Error, Result};
use crate::flat::{self, FlatDocument};
use crate::model::Document;
use crate::schema::{Schema, filter_document_schema};

/// Document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Atom feed.
    Hierarchical,
    /// Section-based configuration.
    Flat,
}

impl Format {
    /// Returns the canonical name of this format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hierarchical => "hierarchical",
            Self::Flat => "flat",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "hierarchical" | "xml" | "atom" => Ok(Self::Hierarchical),
            "flat" | "ini" => Ok(Self::Flat),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Options of a conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Input format.
    pub source: Format,
    /// Output format.
    pub target: Format,
    /// Feed generation used for reading and writing.
    pub generation: Generation,
    /// Whether a feed must carry an author.
    pub author_policy: AuthorPolicy,
    /// Schema the flat projection must satisfy.
    pub schema: Schema,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            source: Format::Hierarchical,
            target: Format::Flat,
            generation: Generation::default(),
            author_policy: AuthorPolicy::default(),
            schema: filter_document_schema(),
        }
    }
}

impl ConvertOptions {
    /// Creates options converting `source` to `target` with default settings.
    #[must_use]
    pub fn new(source: Format, target: Format) -> Self {
        Self {
            source,
            target,
            ..Self::default()
        }
    }

    /// Sets the feed generation.
    #[must_use]
    pub const fn generation(mut self, generation: Generation) -> Self {
        self.generation = generation;
        self
    }

    /// Sets the author policy.
    #[must_use]
    pub const fn author_policy(mut self, policy: AuthorPolicy) -> Self {
        self.author_policy = policy;
        self
    }
}

/// Reads a document in the given format.
///
/// Flat input is validated against `options.schema` before it is interpreted.
///
/// # Errors
///
/// Returns the parser's error, or [`Error::Validation`] for flat input that
/// violates the schema.
pub fn read(input: &str, options: &ConvertOptions) -> Result<Document> {
    match options.source {
        Format::Hierarchical => {
            let parse_options = ParseOptions {
                generation: options.generation,
                author: options.author_policy,
            };
            atom::parse(input, &parse_options)
        }
        Format::Flat => {
            let raw = FlatDocument::parse(input)?;
            options.schema.validate(&raw).map_err(Error::Validation)?;
            flat::to_document(&raw)
        }
    }
}

/// Validates a document through its flat projection.
///
/// # Errors
///
/// Returns [`Error::Validation`] with every violation found.
pub fn validate(doc: &Document, schema: &Schema) -> Result<()> {
    schema
        .validate(&flat::from_document(doc))
        .map_err(Error::Validation)
}

/// Writes a document in the given format.
///
/// # Errors
///
/// Returns the emitter's error.
pub fn write(doc: &Document, target: Format, generation: Generation) -> Result<String> {
    match target {
        Format::Hierarchical => atom::emit(doc, generation),
        Format::Flat => flat::from_document(doc).render(),
    }
}

/// Converts `input` from `options.source` to `options.target`.
///
/// The document is validated before anything is emitted, so a failed run
/// never yields partial output.
///
/// # Errors
///
/// Returns the first error of the parse, validate or emit stage.
pub fn convert(input: &str, options: &ConvertOptions) -> Result<String> {
    debug!(
        "Converting {} -> {} ({})",
        options.source, options.target, options.generation
    );

    let doc = read(input, options)?;
    info!(
        "Read {} filter(s) and {} canned response(s)",
        doc.filter_count(),
        doc.response_count()
    );

    validate(&doc, &options.schema)?;
    let output = write(&doc, options.target, options.generation)?;

    info!("Wrote {} document ({} bytes)", options.target, output.len());
    Ok(output)
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
    use crate::model::PropertyName;

    const FLAT: &str = "[author]
name = Jane Doe
email = jane@example.com

[filter:1]
from = boss@example.com
label = Work, Urgent
cannedResponse = 1

[response:1]
title = Ack
content = Got it.
";

    #[test]
    fn test_format_parse() {
        assert_eq!("xml".parse::<Format>().unwrap(), Format::Hierarchical);
        assert_eq!("Atom".parse::<Format>().unwrap(), Format::Hierarchical);
        assert_eq!("ini".parse::<Format>().unwrap(), Format::Flat);
        assert!(matches!(
            "yaml".parse::<Format>(),
            Err(Error::UnsupportedFormat(name)) if name == "yaml"
        ));
    }

    #[test]
    fn test_default_options() {
        let options = ConvertOptions::default();
        assert_eq!(options.source, Format::Hierarchical);
        assert_eq!(options.target, Format::Flat);
        assert_eq!(options.generation, Generation::ById);
    }

    #[test]
    fn test_flat_to_hierarchical() {
        let options = ConvertOptions::new(Format::Flat, Format::Hierarchical);
        let xml = convert(FLAT, &options).unwrap();
        assert_eq!(xml.matches("<category term=\"filter\"/>").count(), 2);
        assert!(xml.contains("<title>Ack</title>"));
    }

    #[test]
    fn test_flat_round_trip_through_feed() {
        let xml = convert(FLAT, &ConvertOptions::new(Format::Flat, Format::Hierarchical)).unwrap();
        let flat = convert(&xml, &ConvertOptions::new(Format::Hierarchical, Format::Flat)).unwrap();

        let doc = read(&flat, &ConvertOptions::new(Format::Flat, Format::Flat)).unwrap();
        let rule = doc.filter("1").unwrap();
        assert_eq!(rule.labels(), ["Work", "Urgent"]);
        assert_eq!(
            rule.properties.scalar(&PropertyName::From),
            Some("boss@example.com")
        );
        assert_eq!(doc.response("1").unwrap().content, "Got it.");
    }

    #[test]
    fn test_invalid_flat_input_reports_violations() {
        let input = "[author]\nname = Jane\nemail = not-an-address\n\n[filter:1]\nsize = big\n";
        let err = convert(input, &ConvertOptions::new(Format::Flat, Format::Hierarchical))
            .unwrap_err();
        match err {
            Error::Validation(violations) => assert_eq!(violations.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_feed_fails_validation() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:apps="http://schemas.google.com/apps/2006">
  <entry><category term="filter"/><id>1</id><apps:property name="shouldStar" value="maybe"/></entry>
</feed>"#;
        assert!(matches!(
            convert(xml, &ConvertOptions::default()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_flat_to_flat_normalizes() {
        let input = "[filter]\nsubject = a\n\n[filter]\nsubject = b\n";
        let output = convert(input, &ConvertOptions::new(Format::Flat, Format::Flat)).unwrap();
        assert!(output.contains("[filter:0]"));
        assert!(output.contains("[filter:1]"));
    }
}
