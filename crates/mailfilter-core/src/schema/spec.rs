//! Declarative schema types.

use std::fmt;

use crate::flat::FlatValue;

/// Expected type of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Any single value.
    String,
    /// Signed integer.
    Integer,
    /// `true`/`false`, `yes`/`no`, `on`/`off`, `1`/`0`.
    Boolean,
    /// Email address.
    Email,
    /// List of values; a single value counts as a list of one.
    List,
}

impl ValueKind {
    /// Returns the name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Email => "email",
            Self::List => "list",
        }
    }

    /// Checks if `value` is of this kind.
    #[must_use]
    pub fn accepts(self, value: &FlatValue) -> bool {
        match (self, value) {
            (Self::List, _) => true,
            (_, FlatValue::List(_)) => false,
            (Self::String, FlatValue::Scalar(_)) => true,
            (Self::Integer, FlatValue::Scalar(text)) => text.trim().parse::<i64>().is_ok(),
            (Self::Boolean, FlatValue::Scalar(text)) => parse_bool(text).is_some(),
            (Self::Email, FlatValue::Scalar(text)) => is_valid_email(text),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a boolean config value.
#[must_use]
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Basic email validation.
fn is_valid_email(email: &str) -> bool {
    let email = email.trim();

    // Must contain exactly one @
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    // Domain must contain at least one dot and no empty labels
    domain.contains('.') && domain.split('.').all(|part| !part.is_empty())
}

/// Declared key of a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpec {
    /// Key name.
    pub name: String,
    /// Expected value type.
    pub kind: ValueKind,
    /// Whether the key must be present.
    pub required: bool,
    /// Value used when the key is absent.
    pub default: Option<FlatValue>,
}

impl KeySpec {
    /// Declares a required key.
    #[must_use]
    pub fn required(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            default: None,
        }
    }

    /// Declares an optional key.
    #[must_use]
    pub fn optional(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: None,
        }
    }

    /// Sets the default value. A key with a default is never missing.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<FlatValue>) -> Self {
        self.default = Some(value.into());
        self.required = false;
        self
    }
}

/// What to do with keys or sections the schema does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownPolicy {
    /// Accept silently.
    Allow,
    /// Report a violation.
    #[default]
    Reject,
}

/// How a section spec selects sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionMatch {
    /// Section name equals the string.
    Exact(String),
    /// Section name starts with the string.
    Prefix(String),
}

/// Declared section (or family of sections).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSpec {
    /// Which sections this spec applies to.
    pub matcher: SectionMatch,
    /// Declared keys.
    pub keys: Vec<KeySpec>,
    /// Policy for undeclared keys.
    pub unknown_keys: UnknownPolicy,
    /// Whether at least one matching section must exist.
    pub required: bool,
    /// Section whose keys fill in for missing keys of every matching section.
    pub fallback: Option<String>,
}

impl SectionSpec {
    /// Spec for the section named exactly `name`.
    #[must_use]
    pub fn exact(name: impl Into<String>) -> Self {
        Self::new(SectionMatch::Exact(name.into()))
    }

    /// Spec for every section whose name starts with `prefix`.
    #[must_use]
    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self::new(SectionMatch::Prefix(prefix.into()))
    }

    const fn new(matcher: SectionMatch) -> Self {
        Self {
            matcher,
            keys: Vec::new(),
            unknown_keys: UnknownPolicy::Reject,
            required: false,
            fallback: None,
        }
    }

    /// Declares a key.
    #[must_use]
    pub fn key(mut self, key: KeySpec) -> Self {
        self.keys.push(key);
        self
    }

    /// Accepts undeclared keys.
    #[must_use]
    pub const fn allow_unknown_keys(mut self) -> Self {
        self.unknown_keys = UnknownPolicy::Allow;
        self
    }

    /// Requires at least one matching section.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Names the fallback section.
    #[must_use]
    pub fn fallback(mut self, section: impl Into<String>) -> Self {
        self.fallback = Some(section.into());
        self
    }

    /// Checks if this spec applies to the section `name`.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match &self.matcher {
            SectionMatch::Exact(exact) => name == exact,
            SectionMatch::Prefix(prefix) => name.starts_with(prefix.as_str()),
        }
    }

    /// Looks up a declared key.
    #[must_use]
    pub fn key_spec(&self, name: &str) -> Option<&KeySpec> {
        self.keys.iter().find(|k| k.name == name)
    }

    /// Human-readable label of the matched sections.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.matcher {
            SectionMatch::Exact(name) => name.clone(),
            SectionMatch::Prefix(prefix) => format!("{prefix}*"),
        }
    }
}

/// Declarative specification of a flat document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    /// Section specs, tried in order; the first match applies.
    pub sections: Vec<SectionSpec>,
    /// Policy for sections no spec matches.
    pub unknown_sections: UnknownPolicy,
}

impl Schema {
    /// Creates an empty schema that rejects every section.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a section.
    #[must_use]
    pub fn section(mut self, spec: SectionSpec) -> Self {
        self.sections.push(spec);
        self
    }

    /// Accepts sections no spec matches.
    #[must_use]
    pub const fn allow_unknown_sections(mut self) -> Self {
        self.unknown_sections = UnknownPolicy::Allow;
        self
    }

    /// Returns the spec applying to the section `name`.
    #[must_use]
    pub fn spec_for(&self, name: &str) -> Option<&SectionSpec> {
        self.sections.iter().find(|spec| spec.matches(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kinds() {
        assert!(ValueKind::Integer.accepts(&FlatValue::from("30")));
        assert!(!ValueKind::Integer.accepts(&FlatValue::from("thirty")));
        assert!(ValueKind::Boolean.accepts(&FlatValue::from("Yes")));
        assert!(!ValueKind::Boolean.accepts(&FlatValue::from("maybe")));
        assert!(ValueKind::List.accepts(&FlatValue::from("single")));
        assert!(!ValueKind::String.accepts(&FlatValue::List(vec![])));
    }

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user.name@sub.example.com"));
    }

    #[test]
    fn test_invalid_email() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("user"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user@example..com"));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("2"), None);
    }

    #[test]
    fn test_section_matching() {
        let schema = Schema::new()
            .section(SectionSpec::exact("author"))
            .section(SectionSpec::prefixed("filter:"));

        assert_eq!(schema.spec_for("author").map(SectionSpec::label), Some("author".to_string()));
        assert_eq!(
            schema.spec_for("filter:12").map(SectionSpec::label),
            Some("filter:*".to_string())
        );
        assert!(schema.spec_for("server").is_none());
    }

    #[test]
    fn test_default_makes_key_optional() {
        let key = KeySpec::required("port", ValueKind::Integer).with_default("993");
        assert!(!key.required);
        assert_eq!(key.default, Some(FlatValue::from("993")));
    }
}
