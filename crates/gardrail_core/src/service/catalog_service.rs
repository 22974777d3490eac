//! Term catalog use-case service.
//!
//! # Responsibility
//! - Provide stable create/update/get/list entry points for catalog callers.
//! - Delegate persistence and invariant enforcement to the term repository.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - The acting curator is threaded through to history attribution.

use crate::model::synonym::{Synonym, SynonymId};
use crate::model::term::{Term, TermDetail, TermId};
use crate::repo::term_repo::{TermListQuery, TermRepository};
use crate::repo::RepoResult;

/// Use-case service wrapper for term catalog operations.
pub struct CatalogService<R: TermRepository> {
    repo: R,
}

impl<R: TermRepository> CatalogService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a term of any variant through repository persistence.
    pub fn create_term(&mut self, term: &Term, actor: Option<&str>) -> RepoResult<TermId> {
        self.repo.create_term(term, actor)
    }

    /// Creates a disease entry.
    pub fn create_disease(
        &mut self,
        cui: impl Into<String>,
        label: impl Into<String>,
        actor: Option<&str>,
    ) -> RepoResult<Term> {
        let term = Term::new(cui, label, TermDetail::Disease);
        self.repo.create_term(&term, actor)?;
        Ok(term)
    }

    /// Creates a gene entry with its symbol and optional locus.
    pub fn create_gene(
        &mut self,
        cui: impl Into<String>,
        label: impl Into<String>,
        symbol: impl Into<String>,
        locus: Option<String>,
        actor: Option<&str>,
    ) -> RepoResult<Term> {
        let term = Term::new(
            cui,
            label,
            TermDetail::Gene {
                symbol: symbol.into(),
                locus,
            },
        );
        self.repo.create_term(&term, actor)?;
        Ok(term)
    }

    /// Updates a term's mutable fields.
    pub fn update_term(&mut self, term: &Term, actor: Option<&str>) -> RepoResult<()> {
        self.repo.update_term(term, actor)
    }

    /// Hard-deletes a term; its association rows cascade away.
    pub fn delete_term(&mut self, id: TermId, actor: Option<&str>) -> RepoResult<()> {
        self.repo.delete_term(id, actor)
    }

    /// Resolves one term to its concrete variant by stable id alone.
    pub fn get_term(&self, id: TermId) -> RepoResult<Option<Term>> {
        self.repo.get_term(id)
    }

    /// Looks a term up by its unique cui.
    pub fn get_term_by_cui(&self, cui: &str) -> RepoResult<Option<Term>> {
        self.repo.get_term_by_cui(cui)
    }

    /// Lists terms using kind/prefix filters and pagination.
    pub fn list_terms(&self, query: &TermListQuery) -> RepoResult<Vec<Term>> {
        self.repo.list_terms(query)
    }

    /// Replaces a term's whole synonym set.
    pub fn set_synonyms(
        &mut self,
        id: TermId,
        synonyms: &[SynonymId],
        actor: Option<&str>,
    ) -> RepoResult<()> {
        self.repo.set_synonyms(id, synonyms, actor)
    }

    /// Attaches one synonym to a term.
    pub fn attach_synonym(
        &mut self,
        id: TermId,
        synonym: SynonymId,
        actor: Option<&str>,
    ) -> RepoResult<()> {
        self.repo.attach_synonym(id, synonym, actor)
    }

    /// Detaches one synonym from a term.
    pub fn detach_synonym(
        &mut self,
        id: TermId,
        synonym: SynonymId,
        actor: Option<&str>,
    ) -> RepoResult<()> {
        self.repo.detach_synonym(id, synonym, actor)
    }

    /// Returns a term's synonyms sorted by name.
    pub fn synonyms_of(&self, id: TermId) -> RepoResult<Vec<Synonym>> {
        self.repo.synonyms_of(id)
    }

    /// Returns every term carrying the given synonym.
    pub fn terms_with_synonym(&self, synonym: SynonymId) -> RepoResult<Vec<Term>> {
        self.repo.terms_with_synonym(synonym)
    }

    /// Replaces a disease's inheritance-pattern set.
    pub fn set_inheritance(
        &mut self,
        disease: TermId,
        inheritances: &[TermId],
        actor: Option<&str>,
    ) -> RepoResult<()> {
        self.repo.set_inheritance(disease, inheritances, actor)
    }

    /// Returns the inheritance patterns attached to a disease.
    pub fn inheritance_of(&self, disease: TermId) -> RepoResult<Vec<Term>> {
        self.repo.inheritance_of(disease)
    }

    /// Returns the diseases carrying one inheritance pattern.
    pub fn diseases_with_inheritance(&self, inheritance: TermId) -> RepoResult<Vec<Term>> {
        self.repo.diseases_with_inheritance(inheritance)
    }
}
