//! Core domain logic for the gardrail biomedical catalog.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod vocab;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::association::{
    AssociationId, DiseaseGeneAssociation, DiseasePhenotypeAssociation, Frequency, FrequencyId,
};
pub use model::history::{ChangeAction, HistoryEntry, TrackedEntity};
pub use model::prevalence::{Prevalence, PrevalenceId};
pub use model::synonym::{Synonym, SynonymId};
pub use model::term::{Term, TermDetail, TermId, TermKind};
pub use model::ValidationError;
pub use repo::association_repo::{
    AssociationRepository, GeneAssociationQuery, PhenotypeAssociationQuery,
    SqliteAssociationRepository,
};
pub use repo::history_repo::{HistoryRepository, SqliteHistoryRepository};
pub use repo::prevalence_repo::{
    PrevalenceListQuery, PrevalenceRepository, SqlitePrevalenceRepository,
};
pub use repo::synonym_repo::{SqliteSynonymRepository, SynonymListQuery, SynonymRepository};
pub use repo::term_repo::{SqliteTermRepository, TermListQuery, TermRepository};
pub use repo::{GeneLink, RepoError, RepoResult, TermLink};
pub use service::association_service::AssociationService;
pub use service::catalog_service::CatalogService;
pub use service::display::{
    disease_detail, disease_listing, link_text, DiseaseDetail, DiseaseListing,
    DISEASE_DISPLAY_LIMIT,
};
pub use service::epidemiology_service::EpidemiologyService;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
