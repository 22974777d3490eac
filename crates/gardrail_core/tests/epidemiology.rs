use gardrail_core::db::open_db_in_memory;
use gardrail_core::vocab::{
    PrevalenceClass, PrevalenceQualification, PrevalenceStatus, PrevalenceType,
};
use gardrail_core::{
    EpidemiologyService, Prevalence, PrevalenceListQuery, PrevalenceRepository, RepoError,
    SqlitePrevalenceRepository, SqliteTermRepository, Term, TermDetail, TermRepository,
};
use rusqlite::Connection;

fn seed_diseases(conn: &mut Connection) -> (Term, Term) {
    let mut repo = SqliteTermRepository::try_new(conn).unwrap();
    let marfan = Term::new("Orphanet:558", "Marfan syndrome", TermDetail::Disease);
    let loeys = Term::new("Orphanet:60030", "Loeys-Dietz syndrome", TermDetail::Disease);
    repo.create_term(&marfan, None).unwrap();
    repo.create_term(&loeys, None).unwrap();
    (marfan, loeys)
}

#[test]
fn prevalence_round_trip_preserves_all_dimensions() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqlitePrevalenceRepository::try_new(&mut conn).unwrap();

    let mut record = Prevalence::new("Worldwide");
    record.ptype = PrevalenceType::AtBirth;
    record.pqual = PrevalenceQualification::ClassOnly;
    record.pclass = PrevalenceClass::OneToFivePerTenThousand;
    record.valmoy = Some(1.3);
    record.status = PrevalenceStatus::NotYetValidated;
    repo.create_prevalence(&record).unwrap();

    let loaded = repo.get_prevalence(record.uuid).unwrap().unwrap();
    assert_eq!(loaded.ptype, PrevalenceType::AtBirth);
    assert_eq!(loaded.pqual, PrevalenceQualification::ClassOnly);
    assert_eq!(loaded.pclass, PrevalenceClass::OneToFivePerTenThousand);
    assert_eq!(loaded.valmoy, Some(1.3));
    assert_eq!(loaded.geo, "Worldwide");
    assert_eq!(loaded.status, PrevalenceStatus::NotYetValidated);

    // Decode is a pure lookup over the fixed tables.
    assert_eq!(loaded.ptype.label(), "Prevalence at birth");
    assert_eq!(loaded.pclass.label(), "1-5 / 10 000");
    assert_eq!(loaded.summary(), "Prevalence at birth, 1-5 / 10 000");
}

#[test]
fn the_same_record_attaches_to_several_diseases() {
    let mut conn = open_db_in_memory().unwrap();
    let (marfan, loeys) = seed_diseases(&mut conn);

    let mut repo = SqlitePrevalenceRepository::try_new(&mut conn).unwrap();
    let shared = Prevalence::new("Europe");
    repo.create_prevalence(&shared).unwrap();

    repo.attach_to_disease(shared.uuid, marfan.uuid, Some("alice"))
        .unwrap();
    repo.attach_to_disease(shared.uuid, loeys.uuid, Some("alice"))
        .unwrap();

    let carriers = repo.disease_links_with_prevalence(shared.uuid).unwrap();
    assert_eq!(carriers.len(), 2);

    // Re-attaching is a no-op, not an error.
    repo.attach_to_disease(shared.uuid, marfan.uuid, None).unwrap();
    let carriers = repo.disease_links_with_prevalence(shared.uuid).unwrap();
    assert_eq!(carriers.len(), 2);
}

#[test]
fn epidemiology_set_replacement_and_detach() {
    let mut conn = open_db_in_memory().unwrap();
    let (marfan, _) = seed_diseases(&mut conn);

    let mut repo = SqlitePrevalenceRepository::try_new(&mut conn).unwrap();
    let worldwide = Prevalence::new("Worldwide");
    let france = Prevalence::new("France");
    repo.create_prevalence(&worldwide).unwrap();
    repo.create_prevalence(&france).unwrap();

    repo.set_disease_epidemiology(marfan.uuid, &[worldwide.uuid, france.uuid], None)
        .unwrap();
    assert_eq!(repo.epidemiology_of(marfan.uuid).unwrap().len(), 2);

    repo.detach_from_disease(worldwide.uuid, marfan.uuid, None)
        .unwrap();
    let remaining = repo.epidemiology_of(marfan.uuid).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].uuid, france.uuid);

    // Detached records keep existing on their own.
    assert!(repo.get_prevalence(worldwide.uuid).unwrap().is_some());
}

#[test]
fn links_only_accept_disease_endpoints() {
    let mut conn = open_db_in_memory().unwrap();

    let phenotype = {
        let mut repo = SqliteTermRepository::try_new(&mut conn).unwrap();
        let phenotype = Term::new("HP:0001166", "Arachnodactyly", TermDetail::Phenotype);
        repo.create_term(&phenotype, None).unwrap();
        phenotype
    };

    let mut repo = SqlitePrevalenceRepository::try_new(&mut conn).unwrap();
    let record = Prevalence::new("Worldwide");
    repo.create_prevalence(&record).unwrap();

    let err = repo
        .attach_to_disease(record.uuid, phenotype.uuid, None)
        .unwrap_err();
    assert!(matches!(err, RepoError::KindMismatch { .. }));
}

#[test]
fn deleting_a_disease_keeps_shared_prevalence_records() {
    let mut conn = open_db_in_memory().unwrap();
    let (marfan, loeys) = seed_diseases(&mut conn);

    let shared = {
        let mut repo = SqlitePrevalenceRepository::try_new(&mut conn).unwrap();
        let shared = Prevalence::new("Worldwide");
        repo.create_prevalence(&shared).unwrap();
        repo.attach_to_disease(shared.uuid, marfan.uuid, None).unwrap();
        repo.attach_to_disease(shared.uuid, loeys.uuid, None).unwrap();
        shared
    };

    {
        let mut repo = SqliteTermRepository::try_new(&mut conn).unwrap();
        repo.delete_term(marfan.uuid, None).unwrap();
    }

    let repo = SqlitePrevalenceRepository::try_new(&mut conn).unwrap();
    assert!(repo.get_prevalence(shared.uuid).unwrap().is_some());
    let carriers = repo.disease_links_with_prevalence(shared.uuid).unwrap();
    assert_eq!(carriers.len(), 1);
    assert_eq!(carriers[0].uuid, loeys.uuid);
}

#[test]
fn validation_and_not_found_errors_are_typed() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqlitePrevalenceRepository::try_new(&mut conn).unwrap();

    let blank_geo = Prevalence::new("  ");
    let err = repo.create_prevalence(&blank_geo).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let ghost = Prevalence::new("Nowhere");
    let err = repo.update_prevalence(&ghost).unwrap_err();
    assert!(matches!(err, RepoError::PrevalenceNotFound(id) if id == ghost.uuid));
}

#[test]
fn service_wraps_repository_calls() {
    let mut conn = open_db_in_memory().unwrap();
    let (marfan, _) = seed_diseases(&mut conn);

    let repo = SqlitePrevalenceRepository::try_new(&mut conn).unwrap();
    let mut service = EpidemiologyService::new(repo);

    let record = Prevalence::new("United States");
    service.create_prevalence(&record).unwrap();
    service
        .attach_to_disease(record.uuid, marfan.uuid, Some("alice"))
        .unwrap();

    assert_eq!(service.epidemiology_of(marfan.uuid).unwrap().len(), 1);
    assert_eq!(
        service
            .list_prevalences(&PrevalenceListQuery::default())
            .unwrap()
            .len(),
        1
    );
}
