//! Filter properties.

use std::fmt;

/// Name of a filter property.
///
/// Known Gmail filter properties have their own variant; anything else is
/// carried verbatim in [`PropertyName::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "String", from = "String")
)]
pub enum PropertyName {
    /// Sender match.
    From,
    /// Recipient match.
    To,
    /// Subject match.
    Subject,
    /// Free-text search query.
    HasTheWord,
    /// Negated free-text search query.
    DoesNotHaveTheWord,
    /// Only messages with attachments.
    HasAttachment,
    /// Skip chat messages.
    ExcludeChats,
    /// Label to apply. The only multi-valued property.
    Label,
    /// Skip the inbox.
    ShouldArchive,
    /// Mark as read.
    ShouldMarkAsRead,
    /// Star the message.
    ShouldStar,
    /// Move to trash.
    ShouldTrash,
    /// Never send to spam.
    ShouldNeverSpam,
    /// Always mark as important.
    ShouldAlwaysMarkAsImportant,
    /// Never mark as important.
    ShouldNeverMarkAsImportant,
    /// Category to apply (e.g. `^smartlabel_social`).
    SmartLabelToApply,
    /// Forwarding address.
    ForwardTo,
    /// Message size threshold.
    Size,
    /// Size comparison (`s_sl` / `s_ss`).
    SizeOperator,
    /// Size unit (`s_sb`, `s_skb`, `s_smb`).
    SizeUnit,
    /// Reference to a canned response by id.
    CannedResponse,
    /// Any property not known to this crate.
    Other(String),
}

impl PropertyName {
    /// All known property names, in canonical order.
    pub const KNOWN: [Self; 21] = [
        Self::From,
        Self::To,
        Self::Subject,
        Self::HasTheWord,
        Self::DoesNotHaveTheWord,
        Self::HasAttachment,
        Self::ExcludeChats,
        Self::Label,
        Self::ShouldArchive,
        Self::ShouldMarkAsRead,
        Self::ShouldStar,
        Self::ShouldTrash,
        Self::ShouldNeverSpam,
        Self::ShouldAlwaysMarkAsImportant,
        Self::ShouldNeverMarkAsImportant,
        Self::SmartLabelToApply,
        Self::ForwardTo,
        Self::Size,
        Self::SizeOperator,
        Self::SizeUnit,
        Self::CannedResponse,
    ];

    /// Returns the wire name of this property.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::From => "from",
            Self::To => "to",
            Self::Subject => "subject",
            Self::HasTheWord => "hasTheWord",
            Self::DoesNotHaveTheWord => "doesNotHaveTheWord",
            Self::HasAttachment => "hasAttachment",
            Self::ExcludeChats => "excludeChats",
            Self::Label => "label",
            Self::ShouldArchive => "shouldArchive",
            Self::ShouldMarkAsRead => "shouldMarkAsRead",
            Self::ShouldStar => "shouldStar",
            Self::ShouldTrash => "shouldTrash",
            Self::ShouldNeverSpam => "shouldNeverSpam",
            Self::ShouldAlwaysMarkAsImportant => "shouldAlwaysMarkAsImportant",
            Self::ShouldNeverMarkAsImportant => "shouldNeverMarkAsImportant",
            Self::SmartLabelToApply => "smartLabelToApply",
            Self::ForwardTo => "forwardTo",
            Self::Size => "size",
            Self::SizeOperator => "sizeOperator",
            Self::SizeUnit => "sizeUnit",
            Self::CannedResponse => "cannedResponse",
            Self::Other(name) => name,
        }
    }

    /// Parses a wire name. Unknown names become [`PropertyName::Other`].
    #[must_use]
    pub fn parse(name: &str) -> Self {
        Self::KNOWN
            .iter()
            .find(|known| known.as_str() == name)
            .cloned()
            .unwrap_or_else(|| Self::Other(name.to_string()))
    }

    /// Checks if this is one of the known property names.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for PropertyName {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<PropertyName> for String {
    fn from(name: PropertyName) -> Self {
        name.as_str().to_string()
    }
}

/// Value of a filter property.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum PropertyValue {
    /// Single value.
    Scalar(String),
    /// Ordered values; only used for [`PropertyName::Label`].
    List(Vec<String>),
}

impl PropertyValue {
    /// Returns the scalar value, if this is one.
    #[must_use]
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(value) => Some(value),
            Self::List(_) => None,
        }
    }
}

/// Ordered property mapping of a filter rule.
///
/// Properties keep the order in which they were first set. `label` is stored
/// as a list at the position of its first value; every other property holds
/// exactly one scalar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Properties {
    entries: Vec<(PropertyName, PropertyValue)>,
}

impl Properties {
    /// Creates an empty property mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a property, replacing any existing value in place.
    ///
    /// Setting `label` replaces all labels with the single given value.
    pub fn set(&mut self, name: PropertyName, value: impl Into<String>) {
        let value = value.into();
        if name == PropertyName::Label {
            self.set_labels(vec![value]);
        } else {
            self.put(name, PropertyValue::Scalar(value));
        }
    }

    /// Replaces all labels.
    pub fn set_labels(&mut self, labels: Vec<String>) {
        self.put(PropertyName::Label, PropertyValue::List(labels));
    }

    /// Appends a label unless it is already present.
    ///
    /// Returns `true` if the label was added.
    pub fn add_label(&mut self, label: impl Into<String>) -> bool {
        let label = label.into();
        match self.get_mut(&PropertyName::Label) {
            Some(PropertyValue::List(labels)) => {
                if labels.contains(&label) {
                    false
                } else {
                    labels.push(label);
                    true
                }
            }
            _ => {
                self.set_labels(vec![label]);
                true
            }
        }
    }

    /// Gets a property value.
    #[must_use]
    pub fn get(&self, name: &PropertyName) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Gets a scalar property value.
    #[must_use]
    pub fn scalar(&self, name: &PropertyName) -> Option<&str> {
        self.get(name).and_then(PropertyValue::as_scalar)
    }

    /// Returns the labels, empty if none are set.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        match self.get(&PropertyName::Label) {
            Some(PropertyValue::List(labels)) => labels,
            _ => &[],
        }
    }

    /// Checks if a property is set.
    #[must_use]
    pub fn contains(&self, name: &PropertyName) -> bool {
        self.get(name).is_some()
    }

    /// Removes a property, returning its value.
    pub fn remove(&mut self, name: &PropertyName) -> Option<PropertyValue> {
        let index = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Returns an iterator over properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&PropertyName, &PropertyValue)> {
        self.entries.iter().map(|(name, value)| (name, value))
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks if no property is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns these properties with `fallback` filling in missing names.
    ///
    /// Own properties keep their order; fallback-only properties follow.
    #[must_use]
    pub fn with_fallback(&self, fallback: &Self) -> Self {
        let mut merged = self.clone();
        for (name, value) in fallback.iter() {
            if !merged.contains(name) {
                merged.entries.push((name.clone(), value.clone()));
            }
        }
        merged
    }

    fn get_mut(&mut self, name: &PropertyName) -> Option<&mut PropertyValue> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    fn put(&mut self, name: PropertyName, value: PropertyValue) {
        if let Some(existing) = self.get_mut(&name) {
            *existing = value;
        } else {
            self.entries.push((name, value));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_property_name_roundtrip() {
        for name in PropertyName::KNOWN {
            assert_eq!(PropertyName::parse(name.as_str()), name);
            assert!(name.is_known());
        }
    }

    #[test]
    fn test_property_name_other() {
        let name = PropertyName::parse("somethingNew");
        assert_eq!(name, PropertyName::Other("somethingNew".to_string()));
        assert_eq!(name.as_str(), "somethingNew");
        assert!(!name.is_known());
    }

    #[test]
    fn test_set_keeps_position() {
        let mut props = Properties::new();
        props.set(PropertyName::From, "a@example.com");
        props.set(PropertyName::ShouldArchive, "true");
        props.set(PropertyName::From, "b@example.com");

        let names: Vec<_> = props.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["from", "shouldArchive"]);
        assert_eq!(props.scalar(&PropertyName::From), Some("b@example.com"));
    }

    #[test]
    fn test_labels_accumulate() {
        let mut props = Properties::new();
        assert!(props.labels().is_empty());
        assert!(props.add_label("Work"));
        assert!(props.add_label("Later"));
        assert!(!props.add_label("Work"));
        assert_eq!(props.labels(), ["Work", "Later"]);

        props.set(PropertyName::Label, "Only");
        assert_eq!(props.labels(), ["Only"]);
    }

    #[test]
    fn test_with_fallback() {
        let mut defaults = Properties::new();
        defaults.set(PropertyName::ShouldArchive, "true");
        defaults.set(PropertyName::From, "ignored@example.com");

        let mut own = Properties::new();
        own.set(PropertyName::From, "me@example.com");

        let merged = own.with_fallback(&defaults);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.scalar(&PropertyName::From), Some("me@example.com"));
        assert_eq!(merged.scalar(&PropertyName::ShouldArchive), Some("true"));
    }

    #[test]
    fn test_remove() {
        let mut props = Properties::new();
        props.set(PropertyName::Subject, "hi");
        assert_eq!(
            props.remove(&PropertyName::Subject),
            Some(PropertyValue::Scalar("hi".to_string()))
        );
        assert!(props.is_empty());
        assert!(props.remove(&PropertyName::Subject).is_none());
    }
}
