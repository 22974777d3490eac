//! Relationship layer use-case service.
//!
//! # Responsibility
//! - Provide create/update/get/list entry points for typed associations.
//! - Record the acting curator as `created_by`/`modified_by` on writes.
//!
//! # Invariants
//! - `created_by` is set once at creation; updates only touch `modified_by`.
//! - Endpoint-kind and pair-uniqueness enforcement stays in the repository.

use crate::model::association::{
    AssociationId, DiseaseGeneAssociation, DiseasePhenotypeAssociation, Frequency, FrequencyId,
};
use crate::model::term::TermId;
use crate::repo::association_repo::{
    AssociationRepository, GeneAssociationQuery, PhenotypeAssociationQuery,
};
use crate::repo::{GeneLink, RepoResult, TermLink};
use crate::vocab::{Evidence, FrequencyBand, GeneAssociationType};

/// Use-case service wrapper for the relationship layer.
pub struct AssociationService<R: AssociationRepository> {
    repo: R,
}

impl<R: AssociationRepository> AssociationService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Associates a gene with a disease, attributed to the acting curator.
    pub fn associate_gene(
        &mut self,
        disease: TermId,
        gene: TermId,
        assoc_type: GeneAssociationType,
        actor: Option<&str>,
    ) -> RepoResult<DiseaseGeneAssociation> {
        let mut assoc = DiseaseGeneAssociation::new(disease, gene, assoc_type);
        assoc.created_by = actor.map(str::to_string);
        self.repo.create_gene_association(&assoc)?;
        Ok(assoc)
    }

    /// Creates a gene association from a fully-populated record.
    pub fn create_gene_association(
        &mut self,
        assoc: &DiseaseGeneAssociation,
    ) -> RepoResult<AssociationId> {
        self.repo.create_gene_association(assoc)
    }

    /// Updates a gene association, stamping `modified_by` with the curator.
    pub fn update_gene_association(
        &mut self,
        assoc: &DiseaseGeneAssociation,
        actor: Option<&str>,
    ) -> RepoResult<()> {
        let mut assoc = assoc.clone();
        assoc.modified_by = actor.map(str::to_string).or(assoc.modified_by);
        self.repo.update_gene_association(&assoc)
    }

    pub fn delete_gene_association(
        &mut self,
        id: AssociationId,
        actor: Option<&str>,
    ) -> RepoResult<()> {
        self.repo.delete_gene_association(id, actor)
    }

    pub fn get_gene_association(
        &self,
        id: AssociationId,
    ) -> RepoResult<Option<DiseaseGeneAssociation>> {
        self.repo.get_gene_association(id)
    }

    pub fn list_gene_associations(
        &self,
        query: &GeneAssociationQuery,
    ) -> RepoResult<Vec<DiseaseGeneAssociation>> {
        self.repo.list_gene_associations(query)
    }

    /// Replaces the provenance reference set of one gene association.
    pub fn set_gene_association_references(
        &mut self,
        id: AssociationId,
        references: &[TermId],
        actor: Option<&str>,
    ) -> RepoResult<()> {
        self.repo.set_gene_association_references(id, references, actor)
    }

    /// Annotates a disease with a phenotype, attributed to the curator.
    pub fn associate_phenotype(
        &mut self,
        disease: TermId,
        phenotype: TermId,
        evidence: Evidence,
        actor: Option<&str>,
    ) -> RepoResult<DiseasePhenotypeAssociation> {
        let mut assoc = DiseasePhenotypeAssociation::new(disease, phenotype, evidence);
        assoc.created_by = actor.map(str::to_string);
        self.repo.create_phenotype_association(&assoc)?;
        Ok(assoc)
    }

    /// Creates a phenotype association from a fully-populated record.
    pub fn create_phenotype_association(
        &mut self,
        assoc: &DiseasePhenotypeAssociation,
    ) -> RepoResult<AssociationId> {
        self.repo.create_phenotype_association(assoc)
    }

    /// Updates a phenotype association, stamping `modified_by`.
    pub fn update_phenotype_association(
        &mut self,
        assoc: &DiseasePhenotypeAssociation,
        actor: Option<&str>,
    ) -> RepoResult<()> {
        let mut assoc = assoc.clone();
        assoc.modified_by = actor.map(str::to_string).or(assoc.modified_by);
        self.repo.update_phenotype_association(&assoc)
    }

    pub fn delete_phenotype_association(
        &mut self,
        id: AssociationId,
        actor: Option<&str>,
    ) -> RepoResult<()> {
        self.repo.delete_phenotype_association(id, actor)
    }

    pub fn get_phenotype_association(
        &self,
        id: AssociationId,
    ) -> RepoResult<Option<DiseasePhenotypeAssociation>> {
        self.repo.get_phenotype_association(id)
    }

    pub fn list_phenotype_associations(
        &self,
        query: &PhenotypeAssociationQuery,
    ) -> RepoResult<Vec<DiseasePhenotypeAssociation>> {
        self.repo.list_phenotype_associations(query)
    }

    /// Replaces the provenance reference set of one phenotype association.
    pub fn set_phenotype_association_references(
        &mut self,
        id: AssociationId,
        references: &[TermId],
        actor: Option<&str>,
    ) -> RepoResult<()> {
        self.repo
            .set_phenotype_association_references(id, references, actor)
    }

    /// Creates a frequency annotation (coded band, free text, or both).
    pub fn create_frequency(
        &mut self,
        value: Option<FrequencyBand>,
        other: Option<String>,
    ) -> RepoResult<Frequency> {
        let frequency = Frequency::new(value, other);
        self.repo.create_frequency(&frequency)?;
        Ok(frequency)
    }

    pub fn get_frequency(&self, id: FrequencyId) -> RepoResult<Option<Frequency>> {
        self.repo.get_frequency(id)
    }

    pub fn list_frequencies(&self) -> RepoResult<Vec<Frequency>> {
        self.repo.list_frequencies()
    }

    pub fn delete_frequency(&mut self, id: FrequencyId, actor: Option<&str>) -> RepoResult<()> {
        self.repo.delete_frequency(id, actor)
    }

    /// Decodes the frequency annotation of one phenotype association for
    /// display: the coded band's label, or the free text verbatim, or `None`
    /// when the association carries no frequency.
    pub fn frequency_display(
        &self,
        assoc: &DiseasePhenotypeAssociation,
    ) -> RepoResult<Option<String>> {
        let Some(id) = assoc.frequency else {
            return Ok(None);
        };
        let Some(frequency) = self.repo.get_frequency(id)? else {
            return Ok(None);
        };
        Ok(frequency.decode().map(str::to_string))
    }

    pub fn gene_links_for_disease(&self, disease: TermId) -> RepoResult<Vec<GeneLink>> {
        self.repo.gene_links_for_disease(disease)
    }

    pub fn disease_links_for_gene(&self, gene: TermId) -> RepoResult<Vec<TermLink>> {
        self.repo.disease_links_for_gene(gene)
    }

    pub fn phenotype_links_for_disease(&self, disease: TermId) -> RepoResult<Vec<TermLink>> {
        self.repo.phenotype_links_for_disease(disease)
    }

    pub fn disease_links_for_phenotype(&self, phenotype: TermId) -> RepoResult<Vec<TermLink>> {
        self.repo.disease_links_for_phenotype(phenotype)
    }
}
