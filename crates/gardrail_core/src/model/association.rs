//! Relationship layer model: typed, audited associations between terms.
//!
//! # Responsibility
//! - Define the disease–gene and disease–phenotype association records and
//!   the frequency annotation they reference.
//!
//! # Invariants
//! - One association per `(disease, gene)` pair and per `(disease, phenotype)`
//!   pair (enforced in SQL, surfaced as uniqueness errors).
//! - A `Frequency` always carries a coded value, free text, or both — never
//!   neither (SQL check constraint; `validate` mirrors it).

use crate::model::term::TermId;
use crate::model::ValidationError;
use crate::vocab::{
    Aspect, Evidence, FrequencyBand, GeneAssociationType, Onset, RelationStatus, Sex,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for an association record.
pub type AssociationId = Uuid;

/// Stable identifier for a frequency annotation.
pub type FrequencyId = Uuid;

/// Frequency annotation: an HPO-coded band, free text, or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frequency {
    pub uuid: FrequencyId,
    /// HPO-coded frequency band, decoded for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FrequencyBand>,
    /// Free-text frequency, returned verbatim when no coded value exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,
}

impl Frequency {
    pub fn new(value: Option<FrequencyBand>, other: Option<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            value,
            other,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.value.is_none() && self.other.is_none() {
            return Err(ValidationError::EmptyFrequencyEncoding);
        }
        Ok(())
    }

    /// Decodes this record for display: the coded band wins, otherwise the
    /// free text is returned verbatim. `None` only for an invalid encoding,
    /// which the storage layer never lets through.
    pub fn decode(&self) -> Option<&str> {
        match (&self.value, &self.other) {
            (Some(band), _) => Some(band.label()),
            (None, Some(other)) => Some(other.as_str()),
            (None, None) => None,
        }
    }
}

/// Typed association between a disease and a causative/related gene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseGeneAssociation {
    pub uuid: AssociationId,
    pub name: String,
    pub status: RelationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    pub disease: TermId,
    pub gene: TermId,
    pub assoc_type: GeneAssociationType,
    /// Provenance references (reference-kind terms).
    #[serde(default)]
    pub references: Vec<TermId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,
}

impl DiseaseGeneAssociation {
    pub fn new(disease: TermId, gene: TermId, assoc_type: GeneAssociationType) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: "DiseaseGeneAssociation".to_string(),
            status: RelationStatus::default(),
            comments: None,
            disease,
            gene,
            assoc_type,
            references: Vec::new(),
            created_by: None,
            modified_by: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyRelationshipName);
        }
        Ok(())
    }
}

/// Typed annotation linking a disease to one of its phenotypes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseasePhenotypeAssociation {
    pub uuid: AssociationId,
    pub name: String,
    pub status: RelationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    pub disease: TermId,
    pub phenotype: TermId,
    pub evidence: Evidence,
    /// Optional frequency annotation, decoded at display time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<FrequencyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onset: Option<Onset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    /// Optional modifier term (any catalog kind).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<TermId>,
    pub aspect: Aspect,
    #[serde(default)]
    pub references: Vec<TermId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,
}

impl DiseasePhenotypeAssociation {
    pub fn new(disease: TermId, phenotype: TermId, evidence: Evidence) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: "DiseasePhenotypeAssociation".to_string(),
            status: RelationStatus::default(),
            comments: None,
            disease,
            phenotype,
            evidence,
            frequency: None,
            onset: None,
            sex: None,
            modifier: None,
            aspect: Aspect::default(),
            references: Vec::new(),
            created_by: None,
            modified_by: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyRelationshipName);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_decode_prefers_the_coded_band() {
        let coded = Frequency::new(Some(FrequencyBand::Frequent), None);
        assert_eq!(
            coded.decode(),
            Some("Frequent (present in 30% to 79% of the cases)")
        );

        let free_text = Frequency::new(None, Some("2 of 10 families".to_string()));
        assert_eq!(free_text.decode(), Some("2 of 10 families"));

        let both = Frequency::new(
            Some(FrequencyBand::Occasional),
            Some("seen twice".to_string()),
        );
        assert_eq!(
            both.decode(),
            Some("Occasional (present in 5% to 29% of the cases)")
        );
    }

    #[test]
    fn frequency_validate_rejects_the_empty_encoding() {
        let empty = Frequency::new(None, None);
        assert_eq!(
            empty.validate(),
            Err(ValidationError::EmptyFrequencyEncoding)
        );
        assert_eq!(empty.decode(), None);
    }
}
