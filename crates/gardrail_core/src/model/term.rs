//! Term catalog model.
//!
//! # Responsibility
//! - Define the polymorphic `Term` record shared by disease/gene/phenotype/
//!   inheritance/reference entries.
//! - Validate identity and labeling invariants before persistence.
//!
//! # Invariants
//! - `cui` is unique across the whole term hierarchy (enforced in SQL, shaped
//!   here).
//! - Identity (`uuid`, `cui`, kind) is immutable after creation; only label,
//!   url, description, synonyms and the variant payload may change.

use crate::model::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for every catalog term.
pub type TermId = Uuid;

// Curie-style codes: `HP:0003581`, `Orphanet_317343`, `OMIM:154700`.
static CUI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9.-]*[:_][A-Za-z0-9.-]+$").expect("valid cui regex"));

/// Discriminator for the closed set of term variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermKind {
    Disease,
    Gene,
    Phenotype,
    Inheritance,
    Reference,
}

impl TermKind {
    pub const ALL: &'static [Self] = &[
        Self::Disease,
        Self::Gene,
        Self::Phenotype,
        Self::Inheritance,
        Self::Reference,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disease => "disease",
            Self::Gene => "gene",
            Self::Phenotype => "phenotype",
            Self::Inheritance => "inheritance",
            Self::Reference => "reference",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == value)
    }
}

/// Variant payload of a term.
///
/// The catalog is a closed set of tagged variants sharing base attributes;
/// resolving the concrete variant of a stored row is a tag lookup on the
/// `kind` column, never dynamic dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TermDetail {
    Disease,
    Gene {
        /// HGNC-style gene symbol, e.g. `FBN1`.
        symbol: String,
        /// Cytogenetic locus, e.g. `2q33`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        locus: Option<String>,
    },
    Phenotype,
    Inheritance,
    Reference,
}

impl TermDetail {
    pub fn kind(&self) -> TermKind {
        match self {
            Self::Disease => TermKind::Disease,
            Self::Gene { .. } => TermKind::Gene,
            Self::Phenotype => TermKind::Phenotype,
            Self::Inheritance => TermKind::Inheritance,
            Self::Reference => TermKind::Reference,
        }
    }
}

/// Canonical catalog record for one named, coded biomedical concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// Stable global ID used for linking and audit attribution.
    pub uuid: TermId,
    /// Unique curie-style code across the whole hierarchy.
    pub cui: String,
    /// Preferred human-readable label.
    pub label: String,
    /// Optional upstream URL for the concept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Optional curator description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Variant tag plus variant-specific payload.
    #[serde(flatten)]
    pub detail: TermDetail,
}

impl Term {
    /// Creates a term with a generated stable ID.
    pub fn new(cui: impl Into<String>, label: impl Into<String>, detail: TermDetail) -> Self {
        Self::with_id(Uuid::new_v4(), cui, label, detail)
    }

    /// Creates a term with a caller-provided stable ID (import paths).
    pub fn with_id(
        uuid: TermId,
        cui: impl Into<String>,
        label: impl Into<String>,
        detail: TermDetail,
    ) -> Self {
        Self {
            uuid,
            cui: cui.into(),
            label: label.into(),
            url: None,
            description: None,
            detail,
        }
    }

    /// Returns the variant discriminator of this term.
    pub fn kind(&self) -> TermKind {
        self.detail.kind()
    }

    /// Checks identity and labeling invariants.
    ///
    /// Write paths must call this before any SQL mutation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.label.trim().is_empty() {
            return Err(ValidationError::EmptyLabel);
        }
        if !CUI_RE.is_match(&self.cui) {
            return Err(ValidationError::MalformedCui(self.cui.clone()));
        }
        if let TermDetail::Gene { symbol, .. } = &self.detail {
            if symbol.trim().is_empty() {
                return Err(ValidationError::EmptyGeneSymbol);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_round_trip_through_tags() {
        for kind in TermKind::ALL {
            assert_eq!(TermKind::parse(kind.as_str()), Some(*kind));
        }
        assert_eq!(TermKind::parse("specimen"), None);
    }

    #[test]
    fn validate_accepts_curie_shapes() {
        let disease = Term::new("Orphanet:558", "Marfan syndrome", TermDetail::Disease);
        disease.validate().unwrap();

        let onset = Term::new("HP:0003581", "Adult onset", TermDetail::Phenotype);
        onset.validate().unwrap();

        let gene = Term::new(
            "HGNC_3603",
            "fibrillin 1",
            TermDetail::Gene {
                symbol: "FBN1".to_string(),
                locus: Some("15q21.1".to_string()),
            },
        );
        gene.validate().unwrap();
    }

    #[test]
    fn validate_rejects_bad_identity() {
        let bad_cui = Term::new("not a curie", "label", TermDetail::Disease);
        assert_eq!(
            bad_cui.validate(),
            Err(ValidationError::MalformedCui("not a curie".to_string()))
        );

        let empty_label = Term::new("HP:0000001", "   ", TermDetail::Phenotype);
        assert_eq!(empty_label.validate(), Err(ValidationError::EmptyLabel));

        let empty_symbol = Term::new(
            "HGNC:1100",
            "BRCA1",
            TermDetail::Gene {
                symbol: " ".to_string(),
                locus: None,
            },
        );
        assert_eq!(empty_symbol.validate(), Err(ValidationError::EmptyGeneSymbol));
    }

    #[test]
    fn serde_flattens_the_variant_tag() {
        let gene = Term::new(
            "HGNC:3603",
            "fibrillin 1",
            TermDetail::Gene {
                symbol: "FBN1".to_string(),
                locus: None,
            },
        );
        let value = serde_json::to_value(&gene).unwrap();
        assert_eq!(value["kind"], "gene");
        assert_eq!(value["symbol"], "FBN1");
        assert_eq!(value["cui"], "HGNC:3603");
    }
}
