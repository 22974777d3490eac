//! Synonym model.
//!
//! # Responsibility
//! - Define the shared synonym record attached to catalog terms.
//!
//! # Invariants
//! - `name` is unique catalog-wide.
//! - Synonyms have an independent lifecycle: removing a term removes only the
//!   link rows, never the synonym itself.

use crate::model::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a synonym.
pub type SynonymId = Uuid;

/// A shared alternative name for one or more terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synonym {
    pub uuid: SynonymId,
    pub name: String,
}

impl Synonym {
    /// Creates a synonym with a generated stable ID.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    /// Creates a synonym with a caller-provided stable ID.
    pub fn with_id(uuid: SynonymId, name: impl Into<String>) -> Self {
        Self {
            uuid,
            name: name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptySynonymName);
        }
        Ok(())
    }
}

/// Normalizes one synonym name: trims surrounding whitespace, keeps case.
pub fn normalize_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_rejects_empty() {
        assert_eq!(normalize_name("  MFS1 "), Some("MFS1".to_string()));
        assert_eq!(normalize_name("   "), None);
    }

    #[test]
    fn validate_rejects_blank_names() {
        let blank = Synonym::new("  ");
        assert_eq!(blank.validate(), Err(ValidationError::EmptySynonymName));
        Synonym::new("Marfan's syndrome").validate().unwrap();
    }
}
