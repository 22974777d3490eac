//! Relationship layer repository: disease–gene and disease–phenotype
//! associations plus frequency annotations.
//!
//! # Responsibility
//! - Create/update/delete typed associations with endpoint-kind checks and
//!   uniqueness mapping, inside one transaction per mutation.
//! - Own reference-link replacement and frequency CRUD.
//! - Provide the link read models used by reverse listings.
//!
//! # Invariants
//! - Endpoint kinds are verified before commit; a wrong-kind endpoint never
//!   reaches the association tables.
//! - One association per endpoint pair; the second writer gets a typed
//!   uniqueness error, never a silent merge.
//! - Every tracked mutation writes its history snapshot in the same
//!   transaction.

use crate::model::association::{
    AssociationId, DiseaseGeneAssociation, DiseasePhenotypeAssociation, Frequency, FrequencyId,
};
use crate::model::history::{ChangeAction, TrackedEntity};
use crate::model::term::{TermId, TermKind};
use crate::repo::history_repo::record_entry;
use crate::repo::{
    ensure_catalog_ready, is_check_violation, is_unique_violation, parse_uuid, require_kind,
    require_term, GeneLink, RepoError, RepoResult, TermLink,
};
use crate::vocab::{
    Aspect, Evidence, FrequencyBand, GeneAssociationType, Onset, RelationStatus, Sex,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};

const GENE_ASSOC_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    status,
    comments,
    disease_uuid,
    gene_uuid,
    assoc_type,
    created_by,
    modified_by
FROM disease_gene_assocs";

const PHENOTYPE_ASSOC_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    status,
    comments,
    disease_uuid,
    phenotype_uuid,
    evidence,
    frequency_uuid,
    onset,
    sex,
    modifier_uuid,
    aspect,
    created_by,
    modified_by
FROM disease_phenotype_assocs";

const ASSOCS_DEFAULT_LIMIT: u32 = 50;
const ASSOCS_LIMIT_MAX: u32 = 200;

/// Query options for listing disease–gene associations.
#[derive(Debug, Clone, Default)]
pub struct GeneAssociationQuery {
    pub disease: Option<TermId>,
    pub gene: Option<TermId>,
    pub status: Option<RelationStatus>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Query options for listing disease–phenotype associations.
#[derive(Debug, Clone, Default)]
pub struct PhenotypeAssociationQuery {
    pub disease: Option<TermId>,
    pub phenotype: Option<TermId>,
    pub status: Option<RelationStatus>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for the relationship layer.
pub trait AssociationRepository {
    fn create_gene_association(
        &mut self,
        assoc: &DiseaseGeneAssociation,
    ) -> RepoResult<AssociationId>;
    fn update_gene_association(&mut self, assoc: &DiseaseGeneAssociation) -> RepoResult<()>;
    fn delete_gene_association(
        &mut self,
        id: AssociationId,
        actor: Option<&str>,
    ) -> RepoResult<()>;
    fn get_gene_association(
        &self,
        id: AssociationId,
    ) -> RepoResult<Option<DiseaseGeneAssociation>>;
    fn list_gene_associations(
        &self,
        query: &GeneAssociationQuery,
    ) -> RepoResult<Vec<DiseaseGeneAssociation>>;
    /// Replaces the provenance reference set of one gene association.
    fn set_gene_association_references(
        &mut self,
        id: AssociationId,
        references: &[TermId],
        actor: Option<&str>,
    ) -> RepoResult<()>;

    fn create_phenotype_association(
        &mut self,
        assoc: &DiseasePhenotypeAssociation,
    ) -> RepoResult<AssociationId>;
    fn update_phenotype_association(
        &mut self,
        assoc: &DiseasePhenotypeAssociation,
    ) -> RepoResult<()>;
    fn delete_phenotype_association(
        &mut self,
        id: AssociationId,
        actor: Option<&str>,
    ) -> RepoResult<()>;
    fn get_phenotype_association(
        &self,
        id: AssociationId,
    ) -> RepoResult<Option<DiseasePhenotypeAssociation>>;
    fn list_phenotype_associations(
        &self,
        query: &PhenotypeAssociationQuery,
    ) -> RepoResult<Vec<DiseasePhenotypeAssociation>>;
    /// Replaces the provenance reference set of one phenotype association.
    fn set_phenotype_association_references(
        &mut self,
        id: AssociationId,
        references: &[TermId],
        actor: Option<&str>,
    ) -> RepoResult<()>;

    fn create_frequency(&self, frequency: &Frequency) -> RepoResult<FrequencyId>;
    fn get_frequency(&self, id: FrequencyId) -> RepoResult<Option<Frequency>>;
    /// Finds the frequency row carrying exactly this `(value, other)`
    /// encoding, if one exists.
    fn find_frequency(
        &self,
        value: Option<FrequencyBand>,
        other: Option<&str>,
    ) -> RepoResult<Option<Frequency>>;
    fn list_frequencies(&self) -> RepoResult<Vec<Frequency>>;
    /// Deletes a frequency; phenotype associations using it cascade, with
    /// delete snapshots recorded for each.
    fn delete_frequency(&mut self, id: FrequencyId, actor: Option<&str>) -> RepoResult<()>;

    /// Genes associated with one disease, for detail displays.
    fn gene_links_for_disease(&self, disease: TermId) -> RepoResult<Vec<GeneLink>>;
    /// Diseases associated with one gene, for reverse listings.
    fn disease_links_for_gene(&self, gene: TermId) -> RepoResult<Vec<TermLink>>;
    /// Phenotypes associated with one disease, for detail displays.
    fn phenotype_links_for_disease(&self, disease: TermId) -> RepoResult<Vec<TermLink>>;
    /// Diseases associated with one phenotype, for reverse listings.
    fn disease_links_for_phenotype(&self, phenotype: TermId) -> RepoResult<Vec<TermLink>>;
}

/// SQLite-backed relationship repository.
pub struct SqliteAssociationRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteAssociationRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_catalog_ready(conn)?;
        Ok(Self { conn })
    }
}

impl AssociationRepository for SqliteAssociationRepository<'_> {
    fn create_gene_association(
        &mut self,
        assoc: &DiseaseGeneAssociation,
    ) -> RepoResult<AssociationId> {
        assoc.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        require_kind(&tx, assoc.disease, TermKind::Disease)?;
        require_kind(&tx, assoc.gene, TermKind::Gene)?;
        for reference in &assoc.references {
            require_kind(&tx, *reference, TermKind::Reference)?;
        }

        let insert = tx.execute(
            "INSERT INTO disease_gene_assocs (
                uuid,
                name,
                status,
                comments,
                disease_uuid,
                gene_uuid,
                assoc_type,
                created_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                assoc.uuid.to_string(),
                assoc.name.as_str(),
                assoc.status.code(),
                assoc.comments.as_deref(),
                assoc.disease.to_string(),
                assoc.gene.to_string(),
                assoc.assoc_type.code(),
                assoc.created_by.as_deref(),
            ],
        );
        if let Err(err) = insert {
            if is_unique_violation(&err) {
                return Err(RepoError::DuplicatePair {
                    disease: assoc.disease,
                    target: assoc.gene,
                });
            }
            return Err(err.into());
        }

        replace_reference_links(&tx, "disease_gene_assoc_refs", assoc.uuid, &assoc.references)?;
        record_gene_association_state(
            &tx,
            assoc.uuid,
            ChangeAction::Create,
            assoc.created_by.as_deref(),
        )?;
        tx.commit()?;
        Ok(assoc.uuid)
    }

    fn update_gene_association(&mut self, assoc: &DiseaseGeneAssociation) -> RepoResult<()> {
        assoc.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        require_kind(&tx, assoc.disease, TermKind::Disease)?;
        require_kind(&tx, assoc.gene, TermKind::Gene)?;
        for reference in &assoc.references {
            require_kind(&tx, *reference, TermKind::Reference)?;
        }

        let update = tx.execute(
            "UPDATE disease_gene_assocs
             SET
                name = ?2,
                status = ?3,
                comments = ?4,
                disease_uuid = ?5,
                gene_uuid = ?6,
                assoc_type = ?7,
                modified_by = ?8,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                assoc.uuid.to_string(),
                assoc.name.as_str(),
                assoc.status.code(),
                assoc.comments.as_deref(),
                assoc.disease.to_string(),
                assoc.gene.to_string(),
                assoc.assoc_type.code(),
                assoc.modified_by.as_deref(),
            ],
        );
        let changed = match update {
            Ok(changed) => changed,
            Err(err) if is_unique_violation(&err) => {
                return Err(RepoError::DuplicatePair {
                    disease: assoc.disease,
                    target: assoc.gene,
                });
            }
            Err(err) => return Err(err.into()),
        };
        if changed == 0 {
            return Err(RepoError::AssociationNotFound(assoc.uuid));
        }

        replace_reference_links(&tx, "disease_gene_assoc_refs", assoc.uuid, &assoc.references)?;
        record_gene_association_state(
            &tx,
            assoc.uuid,
            ChangeAction::Update,
            assoc.modified_by.as_deref(),
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete_gene_association(
        &mut self,
        id: AssociationId,
        actor: Option<&str>,
    ) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if load_gene_association(&tx, id)?.is_none() {
            return Err(RepoError::AssociationNotFound(id));
        }

        record_gene_association_delete(&tx, id, actor)?;
        tx.execute(
            "DELETE FROM disease_gene_assocs WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn get_gene_association(
        &self,
        id: AssociationId,
    ) -> RepoResult<Option<DiseaseGeneAssociation>> {
        load_gene_association(self.conn, id)
    }

    fn list_gene_associations(
        &self,
        query: &GeneAssociationQuery,
    ) -> RepoResult<Vec<DiseaseGeneAssociation>> {
        let mut sql = format!("{GENE_ASSOC_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(disease) = query.disease {
            sql.push_str(" AND disease_uuid = ?");
            bind_values.push(Value::Text(disease.to_string()));
        }
        if let Some(gene) = query.gene {
            sql.push_str(" AND gene_uuid = ?");
            bind_values.push(Value::Text(gene.to_string()));
        }
        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.code().to_string()));
        }

        sql.push_str(" ORDER BY updated_at DESC, uuid ASC");
        push_limit_offset(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut assocs = Vec::new();
        while let Some(row) = rows.next()? {
            let mut assoc = parse_gene_association_row(row)?;
            assoc.references =
                reference_ids_of(self.conn, "disease_gene_assoc_refs", assoc.uuid)?;
            assocs.push(assoc);
        }
        Ok(assocs)
    }

    fn set_gene_association_references(
        &mut self,
        id: AssociationId,
        references: &[TermId],
        actor: Option<&str>,
    ) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if load_gene_association(&tx, id)?.is_none() {
            return Err(RepoError::AssociationNotFound(id));
        }
        for reference in references {
            require_kind(&tx, *reference, TermKind::Reference)?;
        }

        replace_reference_links(&tx, "disease_gene_assoc_refs", id, references)?;
        if actor.is_some() {
            tx.execute(
                "UPDATE disease_gene_assocs
                 SET modified_by = ?2, updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?1;",
                params![id.to_string(), actor],
            )?;
        }
        record_gene_association_state(&tx, id, ChangeAction::Update, actor)?;
        tx.commit()?;
        Ok(())
    }

    fn create_phenotype_association(
        &mut self,
        assoc: &DiseasePhenotypeAssociation,
    ) -> RepoResult<AssociationId> {
        assoc.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        require_kind(&tx, assoc.disease, TermKind::Disease)?;
        require_kind(&tx, assoc.phenotype, TermKind::Phenotype)?;
        for reference in &assoc.references {
            require_kind(&tx, *reference, TermKind::Reference)?;
        }
        if let Some(modifier) = assoc.modifier {
            require_term(&tx, modifier)?;
        }
        if let Some(frequency) = assoc.frequency {
            require_frequency(&tx, frequency)?;
        }

        let insert = tx.execute(
            "INSERT INTO disease_phenotype_assocs (
                uuid,
                name,
                status,
                comments,
                disease_uuid,
                phenotype_uuid,
                evidence,
                frequency_uuid,
                onset,
                sex,
                modifier_uuid,
                aspect,
                created_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);",
            params![
                assoc.uuid.to_string(),
                assoc.name.as_str(),
                assoc.status.code(),
                assoc.comments.as_deref(),
                assoc.disease.to_string(),
                assoc.phenotype.to_string(),
                assoc.evidence.code(),
                assoc.frequency.map(|id| id.to_string()),
                assoc.onset.map(Onset::code),
                assoc.sex.map(Sex::code),
                assoc.modifier.map(|id| id.to_string()),
                assoc.aspect.code(),
                assoc.created_by.as_deref(),
            ],
        );
        if let Err(err) = insert {
            if is_unique_violation(&err) {
                return Err(RepoError::DuplicatePair {
                    disease: assoc.disease,
                    target: assoc.phenotype,
                });
            }
            return Err(err.into());
        }

        replace_reference_links(
            &tx,
            "disease_phenotype_assoc_refs",
            assoc.uuid,
            &assoc.references,
        )?;
        record_phenotype_association_state(
            &tx,
            assoc.uuid,
            ChangeAction::Create,
            assoc.created_by.as_deref(),
        )?;
        tx.commit()?;
        Ok(assoc.uuid)
    }

    fn update_phenotype_association(
        &mut self,
        assoc: &DiseasePhenotypeAssociation,
    ) -> RepoResult<()> {
        assoc.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        require_kind(&tx, assoc.disease, TermKind::Disease)?;
        require_kind(&tx, assoc.phenotype, TermKind::Phenotype)?;
        for reference in &assoc.references {
            require_kind(&tx, *reference, TermKind::Reference)?;
        }
        if let Some(modifier) = assoc.modifier {
            require_term(&tx, modifier)?;
        }
        if let Some(frequency) = assoc.frequency {
            require_frequency(&tx, frequency)?;
        }

        let update = tx.execute(
            "UPDATE disease_phenotype_assocs
             SET
                name = ?2,
                status = ?3,
                comments = ?4,
                disease_uuid = ?5,
                phenotype_uuid = ?6,
                evidence = ?7,
                frequency_uuid = ?8,
                onset = ?9,
                sex = ?10,
                modifier_uuid = ?11,
                aspect = ?12,
                modified_by = ?13,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                assoc.uuid.to_string(),
                assoc.name.as_str(),
                assoc.status.code(),
                assoc.comments.as_deref(),
                assoc.disease.to_string(),
                assoc.phenotype.to_string(),
                assoc.evidence.code(),
                assoc.frequency.map(|id| id.to_string()),
                assoc.onset.map(Onset::code),
                assoc.sex.map(Sex::code),
                assoc.modifier.map(|id| id.to_string()),
                assoc.aspect.code(),
                assoc.modified_by.as_deref(),
            ],
        );
        let changed = match update {
            Ok(changed) => changed,
            Err(err) if is_unique_violation(&err) => {
                return Err(RepoError::DuplicatePair {
                    disease: assoc.disease,
                    target: assoc.phenotype,
                });
            }
            Err(err) => return Err(err.into()),
        };
        if changed == 0 {
            return Err(RepoError::AssociationNotFound(assoc.uuid));
        }

        replace_reference_links(
            &tx,
            "disease_phenotype_assoc_refs",
            assoc.uuid,
            &assoc.references,
        )?;
        record_phenotype_association_state(
            &tx,
            assoc.uuid,
            ChangeAction::Update,
            assoc.modified_by.as_deref(),
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete_phenotype_association(
        &mut self,
        id: AssociationId,
        actor: Option<&str>,
    ) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if load_phenotype_association(&tx, id)?.is_none() {
            return Err(RepoError::AssociationNotFound(id));
        }

        record_phenotype_association_delete(&tx, id, actor)?;
        tx.execute(
            "DELETE FROM disease_phenotype_assocs WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn get_phenotype_association(
        &self,
        id: AssociationId,
    ) -> RepoResult<Option<DiseasePhenotypeAssociation>> {
        load_phenotype_association(self.conn, id)
    }

    fn list_phenotype_associations(
        &self,
        query: &PhenotypeAssociationQuery,
    ) -> RepoResult<Vec<DiseasePhenotypeAssociation>> {
        let mut sql = format!("{PHENOTYPE_ASSOC_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(disease) = query.disease {
            sql.push_str(" AND disease_uuid = ?");
            bind_values.push(Value::Text(disease.to_string()));
        }
        if let Some(phenotype) = query.phenotype {
            sql.push_str(" AND phenotype_uuid = ?");
            bind_values.push(Value::Text(phenotype.to_string()));
        }
        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.code().to_string()));
        }

        sql.push_str(" ORDER BY updated_at DESC, uuid ASC");
        push_limit_offset(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut assocs = Vec::new();
        while let Some(row) = rows.next()? {
            let mut assoc = parse_phenotype_association_row(row)?;
            assoc.references =
                reference_ids_of(self.conn, "disease_phenotype_assoc_refs", assoc.uuid)?;
            assocs.push(assoc);
        }
        Ok(assocs)
    }

    fn set_phenotype_association_references(
        &mut self,
        id: AssociationId,
        references: &[TermId],
        actor: Option<&str>,
    ) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if load_phenotype_association(&tx, id)?.is_none() {
            return Err(RepoError::AssociationNotFound(id));
        }
        for reference in references {
            require_kind(&tx, *reference, TermKind::Reference)?;
        }

        replace_reference_links(&tx, "disease_phenotype_assoc_refs", id, references)?;
        if actor.is_some() {
            tx.execute(
                "UPDATE disease_phenotype_assocs
                 SET modified_by = ?2, updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?1;",
                params![id.to_string(), actor],
            )?;
        }
        record_phenotype_association_state(&tx, id, ChangeAction::Update, actor)?;
        tx.commit()?;
        Ok(())
    }

    fn create_frequency(&self, frequency: &Frequency) -> RepoResult<FrequencyId> {
        frequency.validate()?;

        let insert = self.conn.execute(
            "INSERT INTO frequencies (uuid, value, other) VALUES (?1, ?2, ?3);",
            params![
                frequency.uuid.to_string(),
                frequency.value.map(FrequencyBand::code),
                frequency.other.as_deref(),
            ],
        );
        if let Err(err) = insert {
            if is_unique_violation(&err) {
                return Err(RepoError::DuplicateFrequency);
            }
            if is_check_violation(&err) {
                return Err(RepoError::InvalidFrequencyEncoding);
            }
            return Err(err.into());
        }

        Ok(frequency.uuid)
    }

    fn get_frequency(&self, id: FrequencyId) -> RepoResult<Option<Frequency>> {
        load_frequency(self.conn, id)
    }

    fn find_frequency(
        &self,
        value: Option<FrequencyBand>,
        other: Option<&str>,
    ) -> RepoResult<Option<Frequency>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, value, other
             FROM frequencies
             WHERE value IS ?1 AND other IS ?2;",
        )?;
        let mut rows = stmt.query(params![value.map(FrequencyBand::code), other])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_frequency_row(row)?));
        }
        Ok(None)
    }

    fn list_frequencies(&self) -> RepoResult<Vec<Frequency>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, value, other FROM frequencies ORDER BY value ASC, other ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut frequencies = Vec::new();
        while let Some(row) = rows.next()? {
            frequencies.push(parse_frequency_row(row)?);
        }
        Ok(frequencies)
    }

    fn delete_frequency(&mut self, id: FrequencyId, actor: Option<&str>) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if load_frequency(&tx, id)?.is_none() {
            return Err(RepoError::FrequencyNotFound(id));
        }

        // Associations referencing this frequency cascade away with it.
        let mut stmt = tx.prepare(
            "SELECT uuid FROM disease_phenotype_assocs WHERE frequency_uuid = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut doomed = Vec::new();
        while let Some(row) = rows.next()? {
            let text: String = row.get(0)?;
            doomed.push(parse_uuid(&text, "disease_phenotype_assocs.uuid")?);
        }
        drop(rows);
        drop(stmt);

        for assoc_id in doomed {
            record_phenotype_association_delete(&tx, assoc_id, actor)?;
        }
        tx.execute("DELETE FROM frequencies WHERE uuid = ?1;", [id.to_string()])?;
        tx.commit()?;
        Ok(())
    }

    fn gene_links_for_disease(&self, disease: TermId) -> RepoResult<Vec<GeneLink>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.uuid, t.cui, t.symbol
             FROM disease_gene_assocs a
             INNER JOIN terms t ON t.uuid = a.gene_uuid
             WHERE a.disease_uuid = ?1
             ORDER BY t.symbol ASC, t.uuid ASC;",
        )?;
        let mut rows = stmt.query([disease.to_string()])?;
        let mut links = Vec::new();
        while let Some(row) = rows.next()? {
            let uuid_text: String = row.get(0)?;
            let symbol: Option<String> = row.get(2)?;
            links.push(GeneLink {
                uuid: parse_uuid(&uuid_text, "terms.uuid")?,
                cui: row.get(1)?,
                symbol: symbol.ok_or_else(|| {
                    RepoError::InvalidData(format!("gene term {uuid_text} has no symbol"))
                })?,
            });
        }
        Ok(links)
    }

    fn disease_links_for_gene(&self, gene: TermId) -> RepoResult<Vec<TermLink>> {
        term_links(
            self.conn,
            "SELECT t.uuid, t.cui, t.label
             FROM disease_gene_assocs a
             INNER JOIN terms t ON t.uuid = a.disease_uuid
             WHERE a.gene_uuid = ?1
             ORDER BY t.label ASC, t.uuid ASC;",
            gene,
        )
    }

    fn phenotype_links_for_disease(&self, disease: TermId) -> RepoResult<Vec<TermLink>> {
        term_links(
            self.conn,
            "SELECT t.uuid, t.cui, t.label
             FROM disease_phenotype_assocs a
             INNER JOIN terms t ON t.uuid = a.phenotype_uuid
             WHERE a.disease_uuid = ?1
             ORDER BY t.label ASC, t.uuid ASC;",
            disease,
        )
    }

    fn disease_links_for_phenotype(&self, phenotype: TermId) -> RepoResult<Vec<TermLink>> {
        term_links(
            self.conn,
            "SELECT t.uuid, t.cui, t.label
             FROM disease_phenotype_assocs a
             INNER JOIN terms t ON t.uuid = a.disease_uuid
             WHERE a.phenotype_uuid = ?1
             ORDER BY t.label ASC, t.uuid ASC;",
            phenotype,
        )
    }
}

fn term_links(conn: &Connection, sql: &str, id: TermId) -> RepoResult<Vec<TermLink>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([id.to_string()])?;
    let mut links = Vec::new();
    while let Some(row) = rows.next()? {
        let uuid_text: String = row.get(0)?;
        links.push(TermLink {
            uuid: parse_uuid(&uuid_text, "terms.uuid")?,
            cui: row.get(1)?,
            label: row.get(2)?,
        });
    }
    Ok(links)
}

fn push_limit_offset(
    sql: &mut String,
    bind_values: &mut Vec<Value>,
    limit: Option<u32>,
    offset: u32,
) {
    let limit = match limit {
        Some(0) | None => ASSOCS_DEFAULT_LIMIT,
        Some(value) if value > ASSOCS_LIMIT_MAX => ASSOCS_LIMIT_MAX,
        Some(value) => value,
    };
    sql.push_str(" LIMIT ?");
    bind_values.push(Value::Integer(i64::from(limit)));
    if offset > 0 {
        sql.push_str(" OFFSET ?");
        bind_values.push(Value::Integer(i64::from(offset)));
    }
}

fn replace_reference_links(
    conn: &Connection,
    link_table: &str,
    assoc: AssociationId,
    references: &[TermId],
) -> RepoResult<()> {
    conn.execute(
        &format!("DELETE FROM {link_table} WHERE assoc_uuid = ?1;"),
        [assoc.to_string()],
    )?;
    for reference in references {
        conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {link_table} (assoc_uuid, reference_uuid)
                 VALUES (?1, ?2);"
            ),
            params![assoc.to_string(), reference.to_string()],
        )?;
    }
    Ok(())
}

fn reference_ids_of(
    conn: &Connection,
    link_table: &str,
    assoc: AssociationId,
) -> RepoResult<Vec<TermId>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT reference_uuid
         FROM {link_table}
         WHERE assoc_uuid = ?1
         ORDER BY reference_uuid ASC;"
    ))?;
    let mut rows = stmt.query([assoc.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let text: String = row.get(0)?;
        ids.push(parse_uuid(&text, "reference link")?);
    }
    Ok(ids)
}

fn require_frequency(conn: &Connection, id: FrequencyId) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM frequencies WHERE uuid = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::FrequencyNotFound(id));
    }
    Ok(())
}

pub(crate) fn load_gene_association(
    conn: &Connection,
    id: AssociationId,
) -> RepoResult<Option<DiseaseGeneAssociation>> {
    let mut stmt = conn.prepare(&format!("{GENE_ASSOC_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        let mut assoc = parse_gene_association_row(row)?;
        drop(rows);
        drop(stmt);
        assoc.references = reference_ids_of(conn, "disease_gene_assoc_refs", id)?;
        return Ok(Some(assoc));
    }
    Ok(None)
}

pub(crate) fn load_phenotype_association(
    conn: &Connection,
    id: AssociationId,
) -> RepoResult<Option<DiseasePhenotypeAssociation>> {
    let mut stmt = conn.prepare(&format!("{PHENOTYPE_ASSOC_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        let mut assoc = parse_phenotype_association_row(row)?;
        drop(rows);
        drop(stmt);
        assoc.references = reference_ids_of(conn, "disease_phenotype_assoc_refs", id)?;
        return Ok(Some(assoc));
    }
    Ok(None)
}

pub(crate) fn load_frequency(
    conn: &Connection,
    id: FrequencyId,
) -> RepoResult<Option<Frequency>> {
    let mut stmt =
        conn.prepare("SELECT uuid, value, other FROM frequencies WHERE uuid = ?1;")?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_frequency_row(row)?));
    }
    Ok(None)
}

/// Association rows that would cascade away with the given term.
pub(crate) fn gene_association_ids_touching(
    conn: &Connection,
    term: TermId,
) -> RepoResult<Vec<AssociationId>> {
    let mut stmt = conn.prepare(
        "SELECT uuid
         FROM disease_gene_assocs
         WHERE disease_uuid = ?1 OR gene_uuid = ?1;",
    )?;
    let mut rows = stmt.query([term.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let text: String = row.get(0)?;
        ids.push(parse_uuid(&text, "disease_gene_assocs.uuid")?);
    }
    Ok(ids)
}

pub(crate) fn phenotype_association_ids_touching(
    conn: &Connection,
    term: TermId,
) -> RepoResult<Vec<AssociationId>> {
    let mut stmt = conn.prepare(
        "SELECT uuid
         FROM disease_phenotype_assocs
         WHERE disease_uuid = ?1 OR phenotype_uuid = ?1 OR modifier_uuid = ?1;",
    )?;
    let mut rows = stmt.query([term.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let text: String = row.get(0)?;
        ids.push(parse_uuid(&text, "disease_phenotype_assocs.uuid")?);
    }
    Ok(ids)
}

fn record_gene_association_state(
    conn: &Connection,
    id: AssociationId,
    action: ChangeAction,
    actor: Option<&str>,
) -> RepoResult<()> {
    let Some(assoc) = load_gene_association(conn, id)? else {
        return Err(RepoError::AssociationNotFound(id));
    };
    record_entry(
        conn,
        TrackedEntity::DiseaseGeneAssociation,
        id,
        action,
        actor,
        &assoc,
    )
}

fn record_phenotype_association_state(
    conn: &Connection,
    id: AssociationId,
    action: ChangeAction,
    actor: Option<&str>,
) -> RepoResult<()> {
    let Some(assoc) = load_phenotype_association(conn, id)? else {
        return Err(RepoError::AssociationNotFound(id));
    };
    record_entry(
        conn,
        TrackedEntity::DiseasePhenotypeAssociation,
        id,
        action,
        actor,
        &assoc,
    )
}

/// Snapshots the pre-delete state of a gene association. Called before the
/// row (or its endpoint term) is removed.
pub(crate) fn record_gene_association_delete(
    conn: &Connection,
    id: AssociationId,
    actor: Option<&str>,
) -> RepoResult<()> {
    record_gene_association_state(conn, id, ChangeAction::Delete, actor)
}

/// Snapshots the pre-delete state of a phenotype association.
pub(crate) fn record_phenotype_association_delete(
    conn: &Connection,
    id: AssociationId,
    actor: Option<&str>,
) -> RepoResult<()> {
    record_phenotype_association_state(conn, id, ChangeAction::Delete, actor)
}

fn parse_gene_association_row(row: &Row<'_>) -> RepoResult<DiseaseGeneAssociation> {
    let uuid_text: String = row.get("uuid")?;
    let disease_text: String = row.get("disease_uuid")?;
    let gene_text: String = row.get("gene_uuid")?;

    let status_text: String = row.get("status")?;
    let status = RelationStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in disease_gene_assocs.status"
        ))
    })?;

    let type_text: String = row.get("assoc_type")?;
    let assoc_type = GeneAssociationType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid association type `{type_text}` in disease_gene_assocs.assoc_type"
        ))
    })?;

    Ok(DiseaseGeneAssociation {
        uuid: parse_uuid(&uuid_text, "disease_gene_assocs.uuid")?,
        name: row.get("name")?,
        status,
        comments: row.get("comments")?,
        disease: parse_uuid(&disease_text, "disease_gene_assocs.disease_uuid")?,
        gene: parse_uuid(&gene_text, "disease_gene_assocs.gene_uuid")?,
        assoc_type,
        references: Vec::new(),
        created_by: row.get("created_by")?,
        modified_by: row.get("modified_by")?,
    })
}

fn parse_phenotype_association_row(row: &Row<'_>) -> RepoResult<DiseasePhenotypeAssociation> {
    let uuid_text: String = row.get("uuid")?;
    let disease_text: String = row.get("disease_uuid")?;
    let phenotype_text: String = row.get("phenotype_uuid")?;

    let status_text: String = row.get("status")?;
    let status = RelationStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in disease_phenotype_assocs.status"
        ))
    })?;

    let evidence_text: String = row.get("evidence")?;
    let evidence = Evidence::parse(&evidence_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid evidence `{evidence_text}` in disease_phenotype_assocs.evidence"
        ))
    })?;

    let onset = match row.get::<_, Option<String>>("onset")? {
        Some(code) => Some(Onset::parse(&code).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid onset `{code}` in disease_phenotype_assocs.onset"
            ))
        })?),
        None => None,
    };

    let sex = match row.get::<_, Option<String>>("sex")? {
        Some(code) => Some(Sex::parse(&code).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid sex `{code}` in disease_phenotype_assocs.sex"
            ))
        })?),
        None => None,
    };

    let aspect_text: String = row.get("aspect")?;
    let aspect = Aspect::parse(&aspect_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid aspect `{aspect_text}` in disease_phenotype_assocs.aspect"
        ))
    })?;

    let frequency = match row.get::<_, Option<String>>("frequency_uuid")? {
        Some(text) => Some(parse_uuid(&text, "disease_phenotype_assocs.frequency_uuid")?),
        None => None,
    };
    let modifier = match row.get::<_, Option<String>>("modifier_uuid")? {
        Some(text) => Some(parse_uuid(&text, "disease_phenotype_assocs.modifier_uuid")?),
        None => None,
    };

    Ok(DiseasePhenotypeAssociation {
        uuid: parse_uuid(&uuid_text, "disease_phenotype_assocs.uuid")?,
        name: row.get("name")?,
        status,
        comments: row.get("comments")?,
        disease: parse_uuid(&disease_text, "disease_phenotype_assocs.disease_uuid")?,
        phenotype: parse_uuid(&phenotype_text, "disease_phenotype_assocs.phenotype_uuid")?,
        evidence,
        frequency,
        onset,
        sex,
        modifier,
        aspect,
        references: Vec::new(),
        created_by: row.get("created_by")?,
        modified_by: row.get("modified_by")?,
    })
}

fn parse_frequency_row(row: &Row<'_>) -> RepoResult<Frequency> {
    let uuid_text: String = row.get("uuid")?;
    let value = match row.get::<_, Option<String>>("value")? {
        Some(code) => Some(FrequencyBand::parse(&code).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid frequency band `{code}` in frequencies.value"
            ))
        })?),
        None => None,
    };

    let frequency = Frequency {
        uuid: parse_uuid(&uuid_text, "frequencies.uuid")?,
        value,
        other: row.get("other")?,
    };
    frequency.validate()?;
    Ok(frequency)
}
