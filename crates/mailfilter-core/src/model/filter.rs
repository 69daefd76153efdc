//! Filter rules, canned responses and the document author.

use super::property::{Properties, PropertyName};

/// Owner of a filter document.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Author {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
}

impl Author {
    /// Creates an author.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// A named mail-handling directive.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterRule {
    /// Identifier, unique among filters.
    pub id: String,
    /// Match criteria and actions.
    pub properties: Properties,
}

impl FilterRule {
    /// Creates a rule without properties.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            properties: Properties::new(),
        }
    }

    /// Sets a property. Builder style.
    #[must_use]
    pub fn with(mut self, name: PropertyName, value: impl Into<String>) -> Self {
        self.properties.set(name, value);
        self
    }

    /// Adds a label. Builder style.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.properties.add_label(label);
        self
    }

    /// Returns the id of the canned response this rule sends, if any.
    #[must_use]
    pub fn canned_response(&self) -> Option<&str> {
        self.properties
            .scalar(&PropertyName::CannedResponse)
            .filter(|id| !id.is_empty())
    }

    /// Returns the labels this rule applies.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        self.properties.labels()
    }
}

/// A reusable auto-reply template.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CannedResponse {
    /// Identifier, unique among responses.
    pub id: String,
    /// Title shown in the mail client.
    pub title: String,
    /// Reply body.
    pub content: String,
}

impl CannedResponse {
    /// Creates a canned response.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
        }
    }
}
