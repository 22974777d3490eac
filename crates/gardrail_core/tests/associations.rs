use gardrail_core::db::open_db_in_memory;
use gardrail_core::vocab::{
    Aspect, Evidence, FrequencyBand, GeneAssociationType, Onset, RelationStatus, Sex,
};
use gardrail_core::{
    AssociationRepository, DiseaseGeneAssociation, DiseasePhenotypeAssociation, Frequency,
    GeneAssociationQuery, RepoError, SqliteAssociationRepository, SqliteTermRepository, Term,
    TermDetail, TermRepository,
};
use rusqlite::Connection;

fn seed_terms(conn: &mut Connection) -> (Term, Term, Term, Term) {
    let mut repo = SqliteTermRepository::try_new(conn).unwrap();
    let disease = Term::new("Orphanet:558", "Marfan syndrome", TermDetail::Disease);
    let gene = Term::new(
        "HGNC:3603",
        "fibrillin 1",
        TermDetail::Gene {
            symbol: "FBN1".to_string(),
            locus: Some("15q21.1".to_string()),
        },
    );
    let phenotype = Term::new("HP:0001166", "Arachnodactyly", TermDetail::Phenotype);
    let reference = Term::new("PMID:1852208", "Dietz et al. 1991", TermDetail::Reference);
    repo.create_term(&disease, Some("alice")).unwrap();
    repo.create_term(&gene, Some("alice")).unwrap();
    repo.create_term(&phenotype, Some("alice")).unwrap();
    repo.create_term(&reference, Some("alice")).unwrap();
    (disease, gene, phenotype, reference)
}

#[test]
fn gene_association_round_trip_with_references() {
    let mut conn = open_db_in_memory().unwrap();
    let (disease, gene, _, reference) = seed_terms(&mut conn);

    let mut repo = SqliteAssociationRepository::try_new(&mut conn).unwrap();
    let mut assoc = DiseaseGeneAssociation::new(
        disease.uuid,
        gene.uuid,
        GeneAssociationType::GermlineMutation,
    );
    assoc.references = vec![reference.uuid];
    assoc.created_by = Some("alice".to_string());
    repo.create_gene_association(&assoc).unwrap();

    let loaded = repo.get_gene_association(assoc.uuid).unwrap().unwrap();
    assert_eq!(loaded.disease, disease.uuid);
    assert_eq!(loaded.gene, gene.uuid);
    assert_eq!(loaded.assoc_type, GeneAssociationType::GermlineMutation);
    assert_eq!(loaded.status, RelationStatus::Unknown);
    assert_eq!(loaded.references, vec![reference.uuid]);
    assert_eq!(loaded.created_by.as_deref(), Some("alice"));
    assert_eq!(loaded.modified_by, None);
}

#[test]
fn second_association_for_the_same_pair_is_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    let (disease, gene, _, _) = seed_terms(&mut conn);

    let mut repo = SqliteAssociationRepository::try_new(&mut conn).unwrap();
    let first = DiseaseGeneAssociation::new(
        disease.uuid,
        gene.uuid,
        GeneAssociationType::GermlineMutation,
    );
    repo.create_gene_association(&first).unwrap();

    // Same pair, different attributes: still a conflict, never a merge.
    let second = DiseaseGeneAssociation::new(
        disease.uuid,
        gene.uuid,
        GeneAssociationType::Biomarker,
    );
    let err = repo.create_gene_association(&second).unwrap_err();
    assert!(matches!(
        err,
        RepoError::DuplicatePair { disease: d, target: t }
            if d == disease.uuid && t == gene.uuid
    ));

    // The losing write left nothing behind.
    assert!(repo.get_gene_association(second.uuid).unwrap().is_none());
    let all = repo
        .list_gene_associations(&GeneAssociationQuery::default())
        .unwrap();
    assert_eq!(all.len(), 1);
}

#[test]
fn endpoint_kind_and_existence_are_verified_before_commit() {
    let mut conn = open_db_in_memory().unwrap();
    let (disease, gene, phenotype, _) = seed_terms(&mut conn);

    let mut repo = SqliteAssociationRepository::try_new(&mut conn).unwrap();

    // A phenotype is not a gene.
    let wrong_kind = DiseaseGeneAssociation::new(
        disease.uuid,
        phenotype.uuid,
        GeneAssociationType::GermlineMutation,
    );
    let err = repo.create_gene_association(&wrong_kind).unwrap_err();
    assert!(matches!(err, RepoError::KindMismatch { .. }));

    // Unknown endpoints surface as not-found.
    let ghost = uuid::Uuid::new_v4();
    let missing = DiseaseGeneAssociation::new(
        ghost,
        gene.uuid,
        GeneAssociationType::GermlineMutation,
    );
    let err = repo.create_gene_association(&missing).unwrap_err();
    assert!(matches!(err, RepoError::TermNotFound(id) if id == ghost));
}

#[test]
fn gene_association_update_stamps_modified_by() {
    let mut conn = open_db_in_memory().unwrap();
    let (disease, gene, _, reference) = seed_terms(&mut conn);

    let mut repo = SqliteAssociationRepository::try_new(&mut conn).unwrap();
    let mut assoc = DiseaseGeneAssociation::new(
        disease.uuid,
        gene.uuid,
        GeneAssociationType::CandidateGene,
    );
    assoc.created_by = Some("alice".to_string());
    repo.create_gene_association(&assoc).unwrap();

    assoc.status = RelationStatus::Validated;
    assoc.assoc_type = GeneAssociationType::GermlineLossOfFunction;
    assoc.references = vec![reference.uuid];
    assoc.modified_by = Some("bob".to_string());
    repo.update_gene_association(&assoc).unwrap();

    let loaded = repo.get_gene_association(assoc.uuid).unwrap().unwrap();
    assert_eq!(loaded.status, RelationStatus::Validated);
    assert_eq!(
        loaded.assoc_type,
        GeneAssociationType::GermlineLossOfFunction
    );
    assert_eq!(loaded.references, vec![reference.uuid]);
    assert_eq!(loaded.created_by.as_deref(), Some("alice"));
    assert_eq!(loaded.modified_by.as_deref(), Some("bob"));
}

#[test]
fn phenotype_association_carries_the_full_annotation() {
    let mut conn = open_db_in_memory().unwrap();
    let (disease, _, phenotype, reference) = seed_terms(&mut conn);

    let mut repo = SqliteAssociationRepository::try_new(&mut conn).unwrap();
    let frequency = Frequency::new(Some(FrequencyBand::Frequent), None);
    repo.create_frequency(&frequency).unwrap();

    let mut assoc = DiseasePhenotypeAssociation::new(
        disease.uuid,
        phenotype.uuid,
        Evidence::PublishedClinicalStudy,
    );
    assoc.frequency = Some(frequency.uuid);
    assoc.onset = Some(Onset::Congenital);
    assoc.sex = Some(Sex::Female);
    assoc.aspect = Aspect::PhenotypicAbnormality;
    assoc.references = vec![reference.uuid];
    repo.create_phenotype_association(&assoc).unwrap();

    let loaded = repo.get_phenotype_association(assoc.uuid).unwrap().unwrap();
    assert_eq!(loaded.evidence, Evidence::PublishedClinicalStudy);
    assert_eq!(loaded.frequency, Some(frequency.uuid));
    assert_eq!(loaded.onset, Some(Onset::Congenital));
    assert_eq!(loaded.sex, Some(Sex::Female));
    assert_eq!(loaded.references, vec![reference.uuid]);

    // Second annotation for the same pair is rejected.
    let second = DiseasePhenotypeAssociation::new(
        disease.uuid,
        phenotype.uuid,
        Evidence::TraceableAuthorStatement,
    );
    let err = repo.create_phenotype_association(&second).unwrap_err();
    assert!(matches!(err, RepoError::DuplicatePair { .. }));
}

#[test]
fn frequency_decode_matches_the_fixed_table() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteAssociationRepository::try_new(&mut conn).unwrap();

    let coded = Frequency::new(Some(FrequencyBand::Frequent), None);
    repo.create_frequency(&coded).unwrap();
    let loaded = repo.get_frequency(coded.uuid).unwrap().unwrap();
    assert_eq!(
        loaded.decode(),
        Some("Frequent (present in 30% to 79% of the cases)")
    );

    let free_text = Frequency::new(None, Some("2 of 10 families".to_string()));
    repo.create_frequency(&free_text).unwrap();
    let loaded = repo.get_frequency(free_text.uuid).unwrap().unwrap();
    assert_eq!(loaded.decode(), Some("2 of 10 families"));
}

#[test]
fn frequency_encoding_constraints_hold_at_write_time() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let repo = SqliteAssociationRepository::try_new(&mut conn).unwrap();

        // Neither value nor other: model validation rejects it.
        let empty = Frequency::new(None, None);
        let err = repo.create_frequency(&empty).unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));

        // Same encoding twice: uniqueness violation.
        let first = Frequency::new(Some(FrequencyBand::VeryRare), None);
        repo.create_frequency(&first).unwrap();
        let second = Frequency::new(Some(FrequencyBand::VeryRare), None);
        let err = repo.create_frequency(&second).unwrap_err();
        assert!(matches!(err, RepoError::DuplicateFrequency));
    }

    // The SQL check backstops writers that bypass the model layer.
    let raw = conn.execute(
        "INSERT INTO frequencies (uuid, value, other) VALUES ('raw', NULL, NULL);",
        [],
    );
    assert!(raw.is_err());
}

#[test]
fn deleting_a_disease_cascades_associations_but_keeps_endpoints() {
    let mut conn = open_db_in_memory().unwrap();
    let (disease, gene, phenotype, reference) = seed_terms(&mut conn);

    let (gene_assoc, pheno_assoc) = {
        let mut repo = SqliteAssociationRepository::try_new(&mut conn).unwrap();
        let mut gene_assoc = DiseaseGeneAssociation::new(
            disease.uuid,
            gene.uuid,
            GeneAssociationType::GermlineMutation,
        );
        gene_assoc.references = vec![reference.uuid];
        repo.create_gene_association(&gene_assoc).unwrap();

        let pheno_assoc = DiseasePhenotypeAssociation::new(
            disease.uuid,
            phenotype.uuid,
            Evidence::InferredFromElectronicAnnotation,
        );
        repo.create_phenotype_association(&pheno_assoc).unwrap();
        (gene_assoc, pheno_assoc)
    };

    {
        let mut repo = SqliteTermRepository::try_new(&mut conn).unwrap();
        repo.delete_term(disease.uuid, Some("alice")).unwrap();
    }

    {
        let repo = SqliteAssociationRepository::try_new(&mut conn).unwrap();
        assert!(repo.get_gene_association(gene_assoc.uuid).unwrap().is_none());
        assert!(repo
            .get_phenotype_association(pheno_assoc.uuid)
            .unwrap()
            .is_none());
    }

    let term_repo = SqliteTermRepository::try_new(&mut conn).unwrap();
    assert!(term_repo.get_term(gene.uuid).unwrap().is_some());
    assert!(term_repo.get_term(phenotype.uuid).unwrap().is_some());
    assert!(term_repo.get_term(reference.uuid).unwrap().is_some());
}

#[test]
fn deleting_a_frequency_cascades_the_annotations_using_it() {
    let mut conn = open_db_in_memory().unwrap();
    let (disease, _, phenotype, _) = seed_terms(&mut conn);

    let mut repo = SqliteAssociationRepository::try_new(&mut conn).unwrap();
    let frequency = Frequency::new(None, Some("1 family".to_string()));
    repo.create_frequency(&frequency).unwrap();

    let mut assoc = DiseasePhenotypeAssociation::new(
        disease.uuid,
        phenotype.uuid,
        Evidence::PublishedClinicalStudy,
    );
    assoc.frequency = Some(frequency.uuid);
    repo.create_phenotype_association(&assoc).unwrap();

    repo.delete_frequency(frequency.uuid, Some("alice")).unwrap();
    assert!(repo.get_frequency(frequency.uuid).unwrap().is_none());
    assert!(repo.get_phenotype_association(assoc.uuid).unwrap().is_none());
}

#[test]
fn list_gene_associations_filters_by_endpoint_and_status() {
    let mut conn = open_db_in_memory().unwrap();
    let (disease, gene, _, _) = seed_terms(&mut conn);

    let other_disease = {
        let mut repo = SqliteTermRepository::try_new(&mut conn).unwrap();
        let other = Term::new("Orphanet:60030", "Loeys-Dietz syndrome", TermDetail::Disease);
        repo.create_term(&other, None).unwrap();
        other
    };

    let mut repo = SqliteAssociationRepository::try_new(&mut conn).unwrap();
    let mut first = DiseaseGeneAssociation::new(
        disease.uuid,
        gene.uuid,
        GeneAssociationType::GermlineMutation,
    );
    first.status = RelationStatus::Validated;
    repo.create_gene_association(&first).unwrap();

    let second = DiseaseGeneAssociation::new(
        other_disease.uuid,
        gene.uuid,
        GeneAssociationType::CandidateGene,
    );
    repo.create_gene_association(&second).unwrap();

    let by_disease = repo
        .list_gene_associations(&GeneAssociationQuery {
            disease: Some(disease.uuid),
            ..GeneAssociationQuery::default()
        })
        .unwrap();
    assert_eq!(by_disease.len(), 1);
    assert_eq!(by_disease[0].uuid, first.uuid);

    let by_gene = repo
        .list_gene_associations(&GeneAssociationQuery {
            gene: Some(gene.uuid),
            ..GeneAssociationQuery::default()
        })
        .unwrap();
    assert_eq!(by_gene.len(), 2);

    let validated = repo
        .list_gene_associations(&GeneAssociationQuery {
            status: Some(RelationStatus::Validated),
            ..GeneAssociationQuery::default()
        })
        .unwrap();
    assert_eq!(validated.len(), 1);
    assert_eq!(validated[0].uuid, first.uuid);
}
