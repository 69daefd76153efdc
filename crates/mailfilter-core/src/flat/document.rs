//! Section/key-value document structure.

use std::fmt;

/// Value stored under a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlatValue {
    /// Single value.
    Scalar(String),
    /// Comma-separated list.
    List(Vec<String>),
}

impl FlatValue {
    /// Returns the scalar value, if this is one.
    #[must_use]
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(value) => Some(value),
            Self::List(_) => None,
        }
    }

    /// Returns the values as a list. A scalar is a list of one.
    #[must_use]
    pub fn to_list(&self) -> Vec<String> {
        match self {
            Self::Scalar(value) => vec![value.clone()],
            Self::List(values) => values.clone(),
        }
    }
}

impl fmt::Display for FlatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(value) => f.write_str(value),
            Self::List(values) => write!(f, "[{}]", values.join(", ")),
        }
    }
}

impl From<&str> for FlatValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<String> for FlatValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<String>> for FlatValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

/// Named section holding ordered key-value pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Section name as written between brackets.
    pub name: String,
    entries: Vec<(String, FlatValue)>,
}

impl Section {
    /// Creates an empty section.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Sets a value, replacing an existing one in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FlatValue>) {
        let key = key.into();
        let value = value.into();
        if let Some((_, existing)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            *existing = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Sets a value. Builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FlatValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Gets a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FlatValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    /// Gets a scalar value.
    #[must_use]
    pub fn scalar(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FlatValue::as_scalar)
    }

    /// Checks if a key is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns an iterator over entries in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlatValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks if the section has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Flat configuration document: an ordered list of sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatDocument {
    sections: Vec<Section>,
}

impl FlatDocument {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a section.
    pub fn push(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Appends a section. Builder style.
    #[must_use]
    pub fn with(mut self, section: Section) -> Self {
        self.push(section);
        self
    }

    /// Gets the first section with the given name.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Returns sections in file order.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    /// Returns mutable sections in file order.
    pub fn sections_mut(&mut self) -> impl Iterator<Item = &mut Section> {
        self.sections.iter_mut()
    }

    /// Number of sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Checks if the document has no sections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
