use gardrail_core::db::open_db_in_memory;
use gardrail_core::vocab::{Evidence, GeneAssociationType, RelationStatus};
use gardrail_core::{
    AssociationRepository, ChangeAction, DiseaseGeneAssociation, DiseasePhenotypeAssociation,
    HistoryRepository, SqliteAssociationRepository, SqliteHistoryRepository,
    SqliteTermRepository, Term, TermDetail, TermRepository, TrackedEntity,
};
use rusqlite::Connection;

fn seed_pair(conn: &mut Connection) -> (Term, Term) {
    let mut repo = SqliteTermRepository::try_new(conn).unwrap();
    let disease = Term::new("Orphanet:558", "Marfan syndrome", TermDetail::Disease);
    let gene = Term::new(
        "HGNC:3603",
        "fibrillin 1",
        TermDetail::Gene {
            symbol: "FBN1".to_string(),
            locus: None,
        },
    );
    repo.create_term(&disease, Some("alice")).unwrap();
    repo.create_term(&gene, Some("alice")).unwrap();
    (disease, gene)
}

#[test]
fn every_term_mutation_appends_exactly_one_snapshot() {
    let mut conn = open_db_in_memory().unwrap();

    let mut disease = {
        let mut repo = SqliteTermRepository::try_new(&mut conn).unwrap();
        let disease = Term::new("Orphanet:558", "Marfan syndrome", TermDetail::Disease);
        repo.create_term(&disease, Some("alice")).unwrap();
        disease
    };

    {
        let history = SqliteHistoryRepository::try_new(&conn).unwrap();
        let entries = history
            .history_for(TrackedEntity::Disease, disease.uuid)
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, ChangeAction::Create);
        assert_eq!(entries[0].actor.as_deref(), Some("alice"));
        assert_eq!(entries[0].snapshot["label"], "Marfan syndrome");
    }

    {
        let mut repo = SqliteTermRepository::try_new(&mut conn).unwrap();
        disease.label = "Marfan syndrome, classic".to_string();
        repo.update_term(&disease, Some("bob")).unwrap();
    }

    let history = SqliteHistoryRepository::try_new(&conn).unwrap();
    let entries = history
        .history_for(TrackedEntity::Disease, disease.uuid)
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].action, ChangeAction::Update);
    assert_eq!(entries[1].actor.as_deref(), Some("bob"));
    assert_eq!(entries[1].snapshot["label"], "Marfan syndrome, classic");
}

#[test]
fn pre_update_state_survives_in_the_log() {
    let mut conn = open_db_in_memory().unwrap();
    let (disease, gene) = seed_pair(&mut conn);

    let assoc_uuid = {
        let mut repo = SqliteAssociationRepository::try_new(&mut conn).unwrap();
        let mut assoc = DiseaseGeneAssociation::new(
            disease.uuid,
            gene.uuid,
            GeneAssociationType::CandidateGene,
        );
        assoc.created_by = Some("alice".to_string());
        repo.create_gene_association(&assoc).unwrap();

        // Snapshot of the pre-update state, captured before the change.
        assoc.status = RelationStatus::Validated;
        assoc.assoc_type = GeneAssociationType::GermlineMutation;
        assoc.modified_by = Some("bob".to_string());
        repo.update_gene_association(&assoc).unwrap();
        assoc.uuid
    };

    let history = SqliteHistoryRepository::try_new(&conn).unwrap();
    let entries = history
        .history_for(TrackedEntity::DiseaseGeneAssociation, assoc_uuid)
        .unwrap();
    assert_eq!(entries.len(), 2);

    // The create-time snapshot still reads exactly as it was written.
    assert_eq!(entries[0].action, ChangeAction::Create);
    assert_eq!(entries[0].snapshot["status"], "U");
    assert_eq!(entries[0].snapshot["assoc_type"], "Orphanet_327767");

    assert_eq!(entries[1].action, ChangeAction::Update);
    assert_eq!(entries[1].snapshot["status"], "V");
    assert_eq!(entries[1].snapshot["assoc_type"], "Orphanet_317343");
    assert_eq!(entries[1].actor.as_deref(), Some("bob"));
}

#[test]
fn delete_records_the_final_state() {
    let mut conn = open_db_in_memory().unwrap();

    let gene = {
        let mut repo = SqliteTermRepository::try_new(&mut conn).unwrap();
        let gene = Term::new(
            "HGNC:1100",
            "BRCA1 DNA repair associated",
            TermDetail::Gene {
                symbol: "BRCA1".to_string(),
                locus: Some("17q21.31".to_string()),
            },
        );
        repo.create_term(&gene, Some("alice")).unwrap();
        repo.delete_term(gene.uuid, Some("bob")).unwrap();
        gene
    };

    let history = SqliteHistoryRepository::try_new(&conn).unwrap();
    let entries = history.history_for(TrackedEntity::Gene, gene.uuid).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].action, ChangeAction::Delete);
    assert_eq!(entries[1].actor.as_deref(), Some("bob"));
    assert_eq!(entries[1].snapshot["symbol"], "BRCA1");

    let latest = history
        .latest_snapshot(TrackedEntity::Gene, gene.uuid)
        .unwrap()
        .unwrap();
    assert_eq!(latest.action, ChangeAction::Delete);
}

#[test]
fn cascaded_association_deletes_are_recorded_too() {
    let mut conn = open_db_in_memory().unwrap();
    let (disease, gene) = seed_pair(&mut conn);

    let phenotype = {
        let mut repo = SqliteTermRepository::try_new(&mut conn).unwrap();
        let phenotype = Term::new("HP:0001166", "Arachnodactyly", TermDetail::Phenotype);
        repo.create_term(&phenotype, None).unwrap();
        phenotype
    };

    let (gene_assoc, pheno_assoc) = {
        let mut repo = SqliteAssociationRepository::try_new(&mut conn).unwrap();
        let gene_assoc = DiseaseGeneAssociation::new(
            disease.uuid,
            gene.uuid,
            GeneAssociationType::GermlineMutation,
        );
        repo.create_gene_association(&gene_assoc).unwrap();
        let pheno_assoc = DiseasePhenotypeAssociation::new(
            disease.uuid,
            phenotype.uuid,
            Evidence::TraceableAuthorStatement,
        );
        repo.create_phenotype_association(&pheno_assoc).unwrap();
        (gene_assoc, pheno_assoc)
    };

    {
        let mut repo = SqliteTermRepository::try_new(&mut conn).unwrap();
        repo.delete_term(disease.uuid, Some("alice")).unwrap();
    }

    let history = SqliteHistoryRepository::try_new(&conn).unwrap();
    let gene_entries = history
        .history_for(TrackedEntity::DiseaseGeneAssociation, gene_assoc.uuid)
        .unwrap();
    assert_eq!(gene_entries.last().unwrap().action, ChangeAction::Delete);

    let pheno_entries = history
        .history_for(TrackedEntity::DiseasePhenotypeAssociation, pheno_assoc.uuid)
        .unwrap();
    assert_eq!(pheno_entries.last().unwrap().action, ChangeAction::Delete);
}

#[test]
fn snapshots_are_ordered_chronologically_per_entity() {
    let mut conn = open_db_in_memory().unwrap();

    let mut phenotype = {
        let mut repo = SqliteTermRepository::try_new(&mut conn).unwrap();
        let phenotype = Term::new("HP:0001250", "Seizure", TermDetail::Phenotype);
        repo.create_term(&phenotype, None).unwrap();
        phenotype
    };

    for label in ["Seizures", "Seizure disorder", "Seizure"] {
        let mut repo = SqliteTermRepository::try_new(&mut conn).unwrap();
        phenotype.label = label.to_string();
        repo.update_term(&phenotype, None).unwrap();
    }

    let history = SqliteHistoryRepository::try_new(&conn).unwrap();
    let entries = history
        .history_for(TrackedEntity::Phenotype, phenotype.uuid)
        .unwrap();
    assert_eq!(entries.len(), 4);
    assert!(entries.windows(2).all(|pair| pair[0].id < pair[1].id));
    let labels: Vec<_> = entries
        .iter()
        .map(|entry| entry.snapshot["label"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        labels,
        vec!["Seizure", "Seizures", "Seizure disorder", "Seizure"]
    );
}

#[test]
fn synonym_set_changes_are_part_of_the_term_audit_trail() {
    let mut conn = open_db_in_memory().unwrap();

    let disease = {
        let mut repo = SqliteTermRepository::try_new(&mut conn).unwrap();
        let disease = Term::new("Orphanet:558", "Marfan syndrome", TermDetail::Disease);
        repo.create_term(&disease, None).unwrap();
        disease
    };

    let synonym = {
        let synonym_repo = gardrail_core::SqliteSynonymRepository::try_new(&conn).unwrap();
        use gardrail_core::SynonymRepository;
        let synonym = gardrail_core::Synonym::new("MFS");
        synonym_repo.create_synonym(&synonym).unwrap();
        synonym
    };

    {
        let mut repo = SqliteTermRepository::try_new(&mut conn).unwrap();
        repo.attach_synonym(disease.uuid, synonym.uuid, Some("alice"))
            .unwrap();
    }

    let history = SqliteHistoryRepository::try_new(&conn).unwrap();
    let entries = history
        .history_for(TrackedEntity::Disease, disease.uuid)
        .unwrap();
    assert_eq!(entries.len(), 2);
    let synonyms = entries[1].snapshot["synonyms"].as_array().unwrap();
    assert_eq!(synonyms.len(), 1);
    assert_eq!(synonyms[0], synonym.uuid.to_string());
}
