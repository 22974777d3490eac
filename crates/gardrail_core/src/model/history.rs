//! Audit history model.
//!
//! # Responsibility
//! - Define the append-only snapshot record written alongside every mutation
//!   of a tracked entity.
//!
//! # Invariants
//! - History rows are immutable once written and are never themselves
//!   versioned.
//! - `(entity, entity_uuid)` plus the monotonically growing row id give the
//!   chronological change sequence for one entity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of entity types covered by the audit overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedEntity {
    Disease,
    Gene,
    Phenotype,
    Inheritance,
    Reference,
    DiseaseGeneAssociation,
    DiseasePhenotypeAssociation,
}

impl TrackedEntity {
    pub const ALL: &'static [Self] = &[
        Self::Disease,
        Self::Gene,
        Self::Phenotype,
        Self::Inheritance,
        Self::Reference,
        Self::DiseaseGeneAssociation,
        Self::DiseasePhenotypeAssociation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disease => "disease",
            Self::Gene => "gene",
            Self::Phenotype => "phenotype",
            Self::Inheritance => "inheritance",
            Self::Reference => "reference",
            Self::DiseaseGeneAssociation => "disease_gene_association",
            Self::DiseasePhenotypeAssociation => "disease_phenotype_association",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|item| item.as_str() == value)
    }
}

impl From<crate::model::term::TermKind> for TrackedEntity {
    fn from(kind: crate::model::term::TermKind) -> Self {
        use crate::model::term::TermKind;
        match kind {
            TermKind::Disease => Self::Disease,
            TermKind::Gene => Self::Gene,
            TermKind::Phenotype => Self::Phenotype,
            TermKind::Inheritance => Self::Inheritance,
            TermKind::Reference => Self::Reference,
        }
    }
}

/// Mutation class recorded by a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

impl ChangeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// One immutable, timestamped, user-attributed snapshot of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Monotonic row id; orders snapshots chronologically per entity.
    pub id: i64,
    pub entity: TrackedEntity,
    pub entity_uuid: Uuid,
    pub action: ChangeAction,
    /// Acting curator, when known.
    pub actor: Option<String>,
    /// Unix epoch milliseconds.
    pub recorded_at: i64,
    /// Full field state of the entity at mutation time.
    pub snapshot: serde_json::Value,
}
