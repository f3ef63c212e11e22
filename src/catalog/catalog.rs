//! Catalog lookup over seeded document types

use uuid::Uuid;

use super::errors::{CatalogError, CatalogResult};
use super::types::{DocumentType, DocumentTypeSeed};

/// Read-only catalog of document types
pub struct DocumentTypeCatalog {
    types: Vec<DocumentType>,
}

impl DocumentTypeCatalog {
    /// Build a catalog from seeds
    pub fn from_seeds(seeds: Vec<DocumentTypeSeed>) -> Self {
        Self {
            types: seeds.into_iter().map(DocumentType::from_seed).collect(),
        }
    }

    /// Build a catalog with the built-in KYC/business seed set
    pub fn with_defaults() -> Self {
        Self::from_seeds(default_seeds())
    }

    /// Active types, optionally filtered by category, ordered by display name
    pub fn list(&self, category: Option<&str>) -> Vec<&DocumentType> {
        let mut types: Vec<&DocumentType> = self
            .types
            .iter()
            .filter(|t| t.is_active)
            .filter(|t| category.map_or(true, |c| t.category == c))
            .collect();
        types.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        types
    }

    /// Resolve an active type by name; unknown or inactive names fail
    pub fn get_by_name(&self, type_name: &str) -> CatalogResult<&DocumentType> {
        self.types
            .iter()
            .find(|t| t.type_name == type_name && t.is_active)
            .ok_or_else(|| CatalogError::TypeNotFound(type_name.to_string()))
    }

    /// Resolve by id, active or not (for joins against historical rows)
    pub fn get(&self, id: &Uuid) -> Option<&DocumentType> {
        self.types.iter().find(|t| t.id == *id)
    }
}

const MB: u64 = 1024 * 1024;

fn default_seeds() -> Vec<DocumentTypeSeed> {
    let pdf_and_images = || {
        vec![
            "application/pdf".to_string(),
            "image/jpeg".to_string(),
            "image/png".to_string(),
        ]
    };

    vec![
        DocumentTypeSeed {
            type_name: "pan_card".into(),
            display_name: "PAN Card".into(),
            category: "identity".into(),
            allowed_mime_types: pdf_and_images(),
            max_file_size: 50 * MB,
            is_active: true,
        },
        DocumentTypeSeed {
            type_name: "gst_certificate".into(),
            display_name: "GST Certificate".into(),
            category: "business".into(),
            allowed_mime_types: pdf_and_images(),
            max_file_size: 50 * MB,
            is_active: true,
        },
        DocumentTypeSeed {
            type_name: "address_proof".into(),
            display_name: "Address Proof".into(),
            category: "identity".into(),
            allowed_mime_types: pdf_and_images(),
            max_file_size: 50 * MB,
            is_active: true,
        },
        DocumentTypeSeed {
            type_name: "bank_statement".into(),
            display_name: "Bank Statement".into(),
            category: "financial".into(),
            allowed_mime_types: vec!["application/pdf".to_string()],
            max_file_size: 100 * MB,
            is_active: true,
        },
        DocumentTypeSeed {
            type_name: "photograph".into(),
            display_name: "Photograph".into(),
            category: "identity".into(),
            allowed_mime_types: vec!["image/*".to_string()],
            max_file_size: 10 * MB,
            is_active: true,
        },
        DocumentTypeSeed {
            type_name: "agreement".into(),
            display_name: "Agreement".into(),
            category: "business".into(),
            allowed_mime_types: vec!["application/pdf".to_string()],
            max_file_size: 100 * MB,
            is_active: true,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_ordered_by_display_name() {
        let catalog = DocumentTypeCatalog::with_defaults();
        let names: Vec<&str> = catalog
            .list(None)
            .iter()
            .map(|t| t.display_name.as_str())
            .collect();

        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_list_filters_by_category() {
        let catalog = DocumentTypeCatalog::with_defaults();
        let identity = catalog.list(Some("identity"));
        assert!(!identity.is_empty());
        assert!(identity.iter().all(|t| t.category == "identity"));
    }

    #[test]
    fn test_get_by_name_rejects_unknown() {
        let catalog = DocumentTypeCatalog::with_defaults();
        assert!(catalog.get_by_name("pan_card").is_ok());
        assert!(matches!(
            catalog.get_by_name("voter_id"),
            Err(CatalogError::TypeNotFound(_))
        ));
    }

    #[test]
    fn test_get_by_name_rejects_inactive() {
        let catalog = DocumentTypeCatalog::from_seeds(vec![DocumentTypeSeed {
            type_name: "old_form".into(),
            display_name: "Old Form".into(),
            category: "legacy".into(),
            allowed_mime_types: vec![],
            max_file_size: 0,
            is_active: false,
        }]);

        assert!(matches!(
            catalog.get_by_name("old_form"),
            Err(CatalogError::TypeNotFound(_))
        ));
        // Inactive types are also hidden from listings
        assert!(catalog.list(None).is_empty());
    }
}
