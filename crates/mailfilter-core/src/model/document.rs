//! The filter document aggregate.

use std::collections::BTreeMap;

use tracing::debug;

use super::filter::{Author, CannedResponse, FilterRule};
use super::property::{Properties, PropertyName};
use crate::error::{Error, Result};
use crate::ids::{EntryKind, IdAllocator};

/// Filter id reserved for the document defaults.
pub const DEFAULTS_ID: &str = "default";

/// Root aggregate owning every filter rule and canned response.
///
/// Filters and responses are keyed by id in two independent namespaces and
/// iterate in ascending id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    /// Document owner.
    pub author: Option<Author>,
    /// Fallback properties applied to every filter.
    pub defaults: Properties,
    filters: BTreeMap<String, FilterRule>,
    responses: BTreeMap<String, CannedResponse>,
    #[cfg_attr(feature = "serde", serde(skip))]
    ids: IdAllocator,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a filter rule.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] if a filter with the same id exists or
    /// the id is [`DEFAULTS_ID`].
    pub fn insert_filter(&mut self, rule: FilterRule) -> Result<()> {
        if rule.id == DEFAULTS_ID {
            return Err(Error::malformed(
                format!("filter '{}'", rule.id),
                "filter id is reserved for defaults",
            ));
        }
        if self.filters.contains_key(&rule.id) {
            return Err(Error::malformed(
                format!("filter '{}'", rule.id),
                "duplicate filter id",
            ));
        }
        self.filters.insert(rule.id.clone(), rule);
        Ok(())
    }

    /// Inserts a filter rule under a freshly allocated id and returns that id.
    ///
    /// Allocated numbers already used as keyed ids are skipped.
    pub fn add_filter(&mut self, properties: Properties) -> String {
        let id = loop {
            let candidate = self.ids.next(EntryKind::Filter).to_string();
            if !self.filters.contains_key(&candidate) {
                break candidate;
            }
        };
        debug!("Allocated filter id {id}");
        self.filters.insert(
            id.clone(),
            FilterRule {
                id: id.clone(),
                properties,
            },
        );
        id
    }

    /// Inserts a canned response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] if a response with the same id exists.
    pub fn insert_response(&mut self, response: CannedResponse) -> Result<()> {
        if self.responses.contains_key(&response.id) {
            return Err(Error::malformed(
                format!("response '{}'", response.id),
                "duplicate canned response id",
            ));
        }
        self.responses.insert(response.id.clone(), response);
        Ok(())
    }

    /// Gets a filter rule by id.
    #[must_use]
    pub fn filter(&self, id: &str) -> Option<&FilterRule> {
        self.filters.get(id)
    }

    /// Gets a mutable filter rule by id.
    pub fn filter_mut(&mut self, id: &str) -> Option<&mut FilterRule> {
        self.filters.get_mut(id)
    }

    /// Gets a canned response by id.
    #[must_use]
    pub fn response(&self, id: &str) -> Option<&CannedResponse> {
        self.responses.get(id)
    }

    /// Returns filter rules in id order.
    pub fn filters(&self) -> impl Iterator<Item = &FilterRule> {
        self.filters.values()
    }

    /// Returns canned responses in id order.
    pub fn responses(&self) -> impl Iterator<Item = &CannedResponse> {
        self.responses.values()
    }

    /// Number of filter rules.
    #[must_use]
    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    /// Number of canned responses.
    #[must_use]
    pub fn response_count(&self) -> usize {
        self.responses.len()
    }

    /// Returns a rule's properties with the document defaults filled in.
    #[must_use]
    pub fn effective_properties(&self, rule: &FilterRule) -> Properties {
        rule.properties.with_fallback(&self.defaults)
    }

    /// Returns the identifier allocator of this document.
    #[must_use]
    pub const fn allocator(&self) -> &IdAllocator {
        &self.ids
    }

    /// Allocates the next identifier of `kind`.
    pub fn allocate(&mut self, kind: EntryKind) -> u64 {
        self.ids.next(kind)
    }

    /// Checks that every canned response reference resolves.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReferentialIntegrity`] for the first dangling reference.
    pub fn check_references(&self) -> Result<()> {
        for rule in self.filters() {
            let props = self.effective_properties(rule);
            let reference = props
                .scalar(&PropertyName::CannedResponse)
                .filter(|id| !id.is_empty());
            if let Some(response) = reference {
                if !self.responses.contains_key(response) {
                    return Err(Error::ReferentialIntegrity {
                        filter: rule.id.clone(),
                        response: response.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_add_filter_allocates_sequential_ids() {
        let mut doc = Document::new();
        let first = doc.add_filter(Properties::new());
        let second = doc.add_filter(Properties::new());
        assert_eq!(first, "0");
        assert_eq!(second, "1");
        assert_eq!(doc.filter_count(), 2);
    }

    #[test]
    fn test_add_filter_skips_keyed_ids() {
        let mut doc = Document::new();
        doc.insert_filter(FilterRule::new("0")).unwrap();
        assert_eq!(doc.add_filter(Properties::new()), "1");
    }

    #[test]
    fn test_duplicate_filter_rejected() {
        let mut doc = Document::new();
        doc.insert_filter(FilterRule::new("a")).unwrap();
        let err = doc.insert_filter(FilterRule::new("a")).unwrap_err();
        assert!(matches!(err, Error::Malformed { .. }));
    }

    #[test]
    fn test_reserved_filter_id_rejected() {
        let mut doc = Document::new();
        let err = doc.insert_filter(FilterRule::new(DEFAULTS_ID)).unwrap_err();
        assert!(matches!(err, Error::Malformed { .. }));
        assert_eq!(doc.filter_count(), 0);

        doc.insert_response(CannedResponse::new(DEFAULTS_ID, "t", "c"))
            .unwrap();
    }

    #[test]
    fn test_namespaces_are_independent() {
        let mut doc = Document::new();
        doc.insert_filter(FilterRule::new("1")).unwrap();
        doc.insert_response(CannedResponse::new("1", "t", "c"))
            .unwrap();
        assert!(doc.filter("1").is_some());
        assert!(doc.response("1").is_some());
    }

    #[test]
    fn test_check_references() {
        let mut doc = Document::new();
        doc.insert_response(CannedResponse::new("r1", "Away", "Gone fishing"))
            .unwrap();
        doc.insert_filter(FilterRule::new("f1").with(PropertyName::CannedResponse, "r1"))
            .unwrap();
        assert!(doc.check_references().is_ok());

        doc.insert_filter(FilterRule::new("f2").with(PropertyName::CannedResponse, "nope"))
            .unwrap();
        match doc.check_references().unwrap_err() {
            Error::ReferentialIntegrity { filter, response } => {
                assert_eq!(filter, "f2");
                assert_eq!(response, "nope");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_defaults_reference_is_checked() {
        let mut doc = Document::new();
        doc.defaults.set(PropertyName::CannedResponse, "missing");
        doc.insert_filter(FilterRule::new("f1")).unwrap();
        assert!(matches!(
            doc.check_references(),
            Err(Error::ReferentialIntegrity { .. })
        ));
    }
}
