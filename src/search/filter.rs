//! Filter assembly
//!
//! A filter is accumulated into a list of predicates which are then
//! evaluated as one conjunction. Filter values are never interpolated into
//! any query text.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::document::DocumentView;

/// All-optional conjunctive filter over active documents
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentFilter {
    pub entity_type: Option<String>,
    pub external_entity_id: Option<i64>,
    pub type_name: Option<String>,
    pub is_verified: Option<bool>,
    pub expiring_before: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    /// Applied only when `limit` is present
    pub offset: Option<usize>,
}

impl DocumentFilter {
    /// Constrain to one entity type
    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    /// Constrain to one external entity id
    pub fn with_external_entity_id(mut self, id: i64) -> Self {
        self.external_entity_id = Some(id);
        self
    }

    /// Constrain to one document type
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Constrain by verification state
    pub fn with_is_verified(mut self, is_verified: bool) -> Self {
        self.is_verified = Some(is_verified);
        self
    }

    /// Constrain to documents expiring on or before a bound
    pub fn with_expiring_before(mut self, bound: DateTime<Utc>) -> Self {
        self.expiring_before = Some(bound);
        self
    }

    /// Page size
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Page offset; ignored without a limit
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// One accumulated filter condition
#[derive(Debug, Clone)]
pub(crate) enum Predicate {
    EntityType(String),
    ExternalEntityId(i64),
    TypeName(String),
    Verified(bool),
    ExpiringBefore(DateTime<Utc>),
}

impl Predicate {
    /// Evaluate against a joined document
    pub(crate) fn matches(&self, view: &DocumentView) -> bool {
        match self {
            Predicate::EntityType(entity_type) => view.entity_type == *entity_type,
            Predicate::ExternalEntityId(id) => view.external_entity_id == *id,
            Predicate::TypeName(type_name) => view.type_name == *type_name,
            Predicate::Verified(verified) => view.document.is_verified == *verified,
            // Documents without an expiry date never match an expiry bound
            Predicate::ExpiringBefore(bound) => {
                view.document.expiry_date.map_or(false, |d| d <= *bound)
            }
        }
    }
}

/// Accumulate the present filter fields into predicates
pub(crate) fn build_predicates(filter: &DocumentFilter) -> Vec<Predicate> {
    let mut predicates = Vec::new();

    if let Some(entity_type) = &filter.entity_type {
        predicates.push(Predicate::EntityType(entity_type.clone()));
    }
    if let Some(id) = filter.external_entity_id {
        predicates.push(Predicate::ExternalEntityId(id));
    }
    if let Some(type_name) = &filter.type_name {
        predicates.push(Predicate::TypeName(type_name.clone()));
    }
    if let Some(verified) = filter.is_verified {
        predicates.push(Predicate::Verified(verified));
    }
    if let Some(bound) = filter.expiring_before {
        predicates.push(Predicate::ExpiringBefore(bound));
    }

    predicates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_accumulates_nothing() {
        assert!(build_predicates(&DocumentFilter::default()).is_empty());
    }

    #[test]
    fn test_each_field_adds_one_predicate() {
        let filter = DocumentFilter::default()
            .with_entity_type("client")
            .with_external_entity_id(42)
            .with_type_name("pan_card")
            .with_is_verified(true)
            .with_expiring_before(Utc::now());

        assert_eq!(build_predicates(&filter).len(), 5);
    }

    #[test]
    fn test_pagination_fields_are_not_predicates() {
        let filter = DocumentFilter::default().with_limit(10).with_offset(5);
        assert!(build_predicates(&filter).is_empty());
    }
}
