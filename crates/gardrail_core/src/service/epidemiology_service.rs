//! Epidemiology use-case service.
//!
//! # Responsibility
//! - Provide CRUD and disease-link entry points for prevalence records.

use crate::model::prevalence::{Prevalence, PrevalenceId};
use crate::model::term::TermId;
use crate::repo::prevalence_repo::{PrevalenceListQuery, PrevalenceRepository};
use crate::repo::{RepoResult, TermLink};

/// Use-case service wrapper for epidemiology records.
pub struct EpidemiologyService<R: PrevalenceRepository> {
    repo: R,
}

impl<R: PrevalenceRepository> EpidemiologyService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a prevalence record, independent of any disease.
    pub fn create_prevalence(&mut self, prevalence: &Prevalence) -> RepoResult<PrevalenceId> {
        self.repo.create_prevalence(prevalence)
    }

    pub fn update_prevalence(&mut self, prevalence: &Prevalence) -> RepoResult<()> {
        self.repo.update_prevalence(prevalence)
    }

    pub fn delete_prevalence(&mut self, id: PrevalenceId) -> RepoResult<()> {
        self.repo.delete_prevalence(id)
    }

    pub fn get_prevalence(&self, id: PrevalenceId) -> RepoResult<Option<Prevalence>> {
        self.repo.get_prevalence(id)
    }

    pub fn list_prevalences(&self, query: &PrevalenceListQuery) -> RepoResult<Vec<Prevalence>> {
        self.repo.list_prevalences(query)
    }

    /// Attaches a prevalence record to a disease. The same record may be
    /// attached to any number of diseases.
    pub fn attach_to_disease(
        &mut self,
        id: PrevalenceId,
        disease: TermId,
        actor: Option<&str>,
    ) -> RepoResult<()> {
        self.repo.attach_to_disease(id, disease, actor)
    }

    pub fn detach_from_disease(
        &mut self,
        id: PrevalenceId,
        disease: TermId,
        actor: Option<&str>,
    ) -> RepoResult<()> {
        self.repo.detach_from_disease(id, disease, actor)
    }

    /// Replaces a disease's whole epidemiology set.
    pub fn set_disease_epidemiology(
        &mut self,
        disease: TermId,
        prevalences: &[PrevalenceId],
        actor: Option<&str>,
    ) -> RepoResult<()> {
        self.repo.set_disease_epidemiology(disease, prevalences, actor)
    }

    pub fn epidemiology_of(&self, disease: TermId) -> RepoResult<Vec<Prevalence>> {
        self.repo.epidemiology_of(disease)
    }

    pub fn disease_links_with_prevalence(
        &self,
        id: PrevalenceId,
    ) -> RepoResult<Vec<TermLink>> {
        self.repo.disease_links_with_prevalence(id)
    }
}
