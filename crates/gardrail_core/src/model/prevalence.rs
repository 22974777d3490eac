//! Epidemiology model.
//!
//! # Responsibility
//! - Define structured prevalence statements attachable to diseases.
//!
//! # Invariants
//! - A prevalence record exists independently of any disease and may be
//!   attached to several diseases at once (shared geography figures).
//! - The four coded dimensions are stored as raw codes and decoded for
//!   display only.

use crate::model::ValidationError;
use crate::vocab::{PrevalenceClass, PrevalenceQualification, PrevalenceStatus, PrevalenceType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a prevalence record.
pub type PrevalenceId = Uuid;

/// A structured disease-frequency statement for one population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prevalence {
    pub uuid: PrevalenceId,
    pub ptype: PrevalenceType,
    pub pqual: PrevalenceQualification,
    pub pclass: PrevalenceClass,
    /// Mean value of the given prevalence type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valmoy: Option<f64>,
    /// Geographic scope, e.g. `Worldwide`, `United States`.
    pub geo: String,
    pub status: PrevalenceStatus,
}

impl Prevalence {
    /// Creates a record with the catalog defaults (point prevalence, value
    /// and class, 1-9 / 1 000 000, validated).
    pub fn new(geo: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            ptype: PrevalenceType::default(),
            pqual: PrevalenceQualification::default(),
            pclass: PrevalenceClass::default(),
            valmoy: None,
            geo: geo.into(),
            status: PrevalenceStatus::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.geo.trim().is_empty() {
            return Err(ValidationError::EmptyGeography);
        }
        Ok(())
    }

    /// Short display form used by disease epidemiology listings: decoded
    /// type and class.
    pub fn summary(&self) -> String {
        format!("{}, {}", self.ptype.label(), self.pclass.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_catalog_conventions() {
        let record = Prevalence::new("Worldwide");
        assert_eq!(record.ptype, PrevalenceType::Point);
        assert_eq!(record.pqual, PrevalenceQualification::ValueAndClass);
        assert_eq!(record.pclass, PrevalenceClass::OneToNinePerMillion);
        assert_eq!(record.status, PrevalenceStatus::Validated);
    }

    #[test]
    fn summary_decodes_type_and_class() {
        let record = Prevalence::new("Europe");
        assert_eq!(record.summary(), "Point prevalence, 1-9 / 1 000 000");
    }

    #[test]
    fn validate_rejects_empty_geography() {
        let record = Prevalence::new(" ");
        assert_eq!(record.validate(), Err(ValidationError::EmptyGeography));
    }
}
