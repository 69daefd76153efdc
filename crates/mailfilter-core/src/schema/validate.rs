//! Schema validation of flat documents.

use std::fmt;

use super::spec::{Schema, SectionMatch, UnknownPolicy, ValueKind};
use crate::flat::{FlatDocument, FlatValue, Section};

/// What is wrong with a section or key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// A required section is absent.
    MissingSection,
    /// A required key is absent.
    MissingKey,
    /// A value has the wrong type.
    WrongType {
        /// Declared type.
        expected: ValueKind,
        /// The offending value.
        found: String,
    },
    /// The key is not declared and the section rejects unknown keys.
    UnknownKey,
    /// No spec matches the section and the schema rejects unknown sections.
    UnknownSection,
}

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Section the violation was found in.
    pub section: String,
    /// Key the violation concerns, if any.
    pub key: Option<String>,
    /// What is wrong.
    pub kind: ViolationKind,
}

impl Violation {
    fn section(section: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            section: section.into(),
            key: None,
            kind,
        }
    }

    fn key(section: &str, key: &str, kind: ViolationKind) -> Self {
        Self {
            section: section.to_string(),
            key: Some(key.to_string()),
            kind,
        }
    }

    /// Get human-readable error message.
    #[must_use]
    pub fn message(&self) -> String {
        match &self.kind {
            ViolationKind::MissingSection => "required section is missing".to_string(),
            ViolationKind::MissingKey => "required key is missing".to_string(),
            ViolationKind::WrongType { expected, found } => {
                format!("expected {expected}, found '{found}'")
            }
            ViolationKind::UnknownKey => "unknown key".to_string(),
            ViolationKind::UnknownSection => "unknown section".to_string(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "[{}] {key}: {}", self.section, self.message()),
            None => write!(f, "[{}]: {}", self.section, self.message()),
        }
    }
}

impl std::error::Error for Violation {}

/// Result of validating a document.
pub type ValidationResult = Result<(), Vec<Violation>>;

impl Schema {
    /// Validates a flat document.
    ///
    /// Returns `Ok(())` if valid, or `Err(Vec<Violation>)` with all violations.
    ///
    /// # Errors
    ///
    /// Returns every [`Violation`] found.
    pub fn validate(&self, doc: &FlatDocument) -> ValidationResult {
        let mut violations = Vec::new();

        for spec in self.sections.iter().filter(|spec| spec.required) {
            if !doc.sections().any(|s| spec.matches(&s.name)) {
                violations.push(Violation::section(
                    spec.label(),
                    ViolationKind::MissingSection,
                ));
            }
        }

        for section in doc.sections() {
            let Some(spec) = self.spec_for(&section.name) else {
                if self.unknown_sections == UnknownPolicy::Reject {
                    violations.push(Violation::section(
                        section.name.as_str(),
                        ViolationKind::UnknownSection,
                    ));
                }
                continue;
            };

            let fallback = spec
                .fallback
                .as_deref()
                .filter(|name| *name != section.name)
                .and_then(|name| doc.section(name));

            for key in &spec.keys {
                let present =
                    section.contains(&key.name) || fallback.is_some_and(|f| f.contains(&key.name));
                if key.required && !present {
                    violations.push(Violation::key(
                        &section.name,
                        &key.name,
                        ViolationKind::MissingKey,
                    ));
                }
            }

            for (name, value) in section.iter() {
                match spec.key_spec(name) {
                    Some(key) if !key.kind.accepts(value) => {
                        violations.push(Violation::key(
                            &section.name,
                            name,
                            ViolationKind::WrongType {
                                expected: key.kind,
                                found: value.to_string(),
                            },
                        ));
                    }
                    Some(_) => {}
                    None if spec.unknown_keys == UnknownPolicy::Reject => {
                        violations.push(Violation::key(
                            &section.name,
                            name,
                            ViolationKind::UnknownKey,
                        ));
                    }
                    None => {}
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Returns a copy of `doc` with declared defaults filled in.
    ///
    /// Keys supplied by a section's fallback section are left alone. Required
    /// exact sections that are missing entirely are created when any of their
    /// keys has a default.
    #[must_use]
    pub fn with_defaults(&self, doc: &FlatDocument) -> FlatDocument {
        let mut filled = doc.clone();

        for spec in &self.sections {
            if let SectionMatch::Exact(name) = &spec.matcher {
                if filled.section(name).is_none() && spec.keys.iter().any(|k| k.default.is_some()) {
                    filled.push(Section::new(name.as_str()));
                }
            }
        }

        let fallbacks: Vec<Option<Section>> = filled
            .sections()
            .map(|section| {
                self.spec_for(&section.name)
                    .and_then(|spec| spec.fallback.as_deref())
                    .filter(|name| *name != section.name)
                    .and_then(|name| doc.section(name))
                    .cloned()
            })
            .collect();

        for (section, fallback) in filled.sections_mut().zip(fallbacks) {
            let Some(spec) = self.spec_for(&section.name) else {
                continue;
            };
            for key in &spec.keys {
                let Some(default) = &key.default else {
                    continue;
                };
                let supplied = section.contains(&key.name)
                    || fallback.as_ref().is_some_and(|f| f.contains(&key.name));
                if !supplied {
                    section.set(key.name.as_str(), default.clone());
                }
            }
        }

        filled
    }
}

/// Returns the value of `key` in `section`, falling back to `fallback`.
#[must_use]
pub fn lookup<'a>(
    section: &'a Section,
    fallback: Option<&'a Section>,
    key: &str,
) -> Option<&'a FlatValue> {
    section.get(key).or_else(|| fallback.and_then(|f| f.get(key)))
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
    use crate::schema::spec::{KeySpec, SectionSpec};

    fn server_schema() -> Schema {
        Schema::new()
            .section(
                SectionSpec::exact("server")
                    .required()
                    .key(KeySpec::required("host", ValueKind::String))
                    .key(KeySpec::optional("port", ValueKind::Integer).with_default("993")),
            )
            .section(
                SectionSpec::prefixed("filter:")
                    .fallback("filter:default")
                    .key(KeySpec::required("folder", ValueKind::String))
                    .key(KeySpec::required("age", ValueKind::Integer)),
            )
    }

    #[test]
    fn test_valid_document() {
        let doc = FlatDocument::new()
            .with(Section::new("server").with("host", "imap.example.com"))
            .with(
                Section::new("filter:old")
                    .with("folder", "INBOX")
                    .with("age", "30"),
            );
        assert!(server_schema().validate(&doc).is_ok());
    }

    #[test]
    fn test_collects_all_violations() {
        let doc = FlatDocument::new()
            .with(Section::new("filter:old").with("age", "soon").with("extra", "x"))
            .with(Section::new("mystery"));

        let violations = server_schema().validate(&doc).unwrap_err();
        let kinds: Vec<_> = violations.iter().map(|v| &v.kind).collect();

        assert!(kinds.contains(&&ViolationKind::MissingSection));
        assert!(kinds.contains(&&ViolationKind::MissingKey));
        assert!(kinds.contains(&&ViolationKind::UnknownKey));
        assert!(kinds.contains(&&ViolationKind::UnknownSection));
        assert!(violations.iter().any(|v| matches!(
            v.kind,
            ViolationKind::WrongType {
                expected: ValueKind::Integer,
                ..
            }
        )));
    }

    #[test]
    fn test_fallback_satisfies_required_keys() {
        let doc = FlatDocument::new()
            .with(Section::new("server").with("host", "h"))
            .with(Section::new("filter:default").with("folder", "INBOX").with("age", "1"))
            .with(Section::new("filter:old").with("age", "30"));
        assert!(server_schema().validate(&doc).is_ok());
    }

    #[test]
    fn test_violation_display() {
        let violation = Violation::key("filter:1", "age", ViolationKind::MissingKey);
        assert_eq!(violation.to_string(), "[filter:1] age: required key is missing");

        let violation = Violation::section("server", ViolationKind::MissingSection);
        assert_eq!(violation.to_string(), "[server]: required section is missing");
    }

    #[test]
    fn test_with_defaults() {
        let doc = FlatDocument::new().with(Section::new("server").with("host", "h"));
        let filled = server_schema().with_defaults(&doc);
        assert_eq!(filled.section("server").unwrap().scalar("port"), Some("993"));
        // Pure: the input is untouched
        assert!(doc.section("server").unwrap().get("port").is_none());
    }

    #[test]
    fn test_with_defaults_creates_missing_section() {
        let filled = server_schema().with_defaults(&FlatDocument::new());
        assert_eq!(filled.section("server").unwrap().scalar("port"), Some("993"));
    }

    #[test]
    fn test_lookup_falls_back() {
        let own = Section::new("filter:1").with("age", "5");
        let defaults = Section::new("filter:default").with("folder", "INBOX");
        assert_eq!(lookup(&own, Some(&defaults), "folder"), Some(&FlatValue::from("INBOX")));
        assert_eq!(lookup(&own, Some(&defaults), "age"), Some(&FlatValue::from("5")));
        assert_eq!(lookup(&own, None, "folder"), None);
    }
}
