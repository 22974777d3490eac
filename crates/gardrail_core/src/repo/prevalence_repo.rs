//! Epidemiology repository: prevalence records and their disease links.
//!
//! # Responsibility
//! - Provide CRUD APIs over `prevalences` storage.
//! - Own the plain disease↔prevalence many-to-many link.
//!
//! # Invariants
//! - A prevalence record lives independently of any disease; the same record
//!   may be linked to any number of diseases.
//! - Link mutations snapshot the affected disease (its epidemiology set is
//!   part of the disease's audited state).

use crate::model::history::ChangeAction;
use crate::model::prevalence::{Prevalence, PrevalenceId};
use crate::model::term::{TermId, TermKind};
use crate::repo::term_repo::{record_term_state, touch_term};
use crate::repo::{
    ensure_catalog_ready, parse_uuid, require_kind, RepoError, RepoResult, TermLink,
};
use crate::vocab::{PrevalenceClass, PrevalenceQualification, PrevalenceStatus, PrevalenceType};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};

const PREVALENCE_SELECT_SQL: &str = "SELECT
    uuid,
    ptype,
    pqual,
    pclass,
    valmoy,
    geo,
    status
FROM prevalences";

const PREVALENCES_DEFAULT_LIMIT: u32 = 50;
const PREVALENCES_LIMIT_MAX: u32 = 200;

/// Query options for listing prevalence records.
#[derive(Debug, Clone, Default)]
pub struct PrevalenceListQuery {
    pub status: Option<PrevalenceStatus>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for epidemiology records.
pub trait PrevalenceRepository {
    fn create_prevalence(&self, prevalence: &Prevalence) -> RepoResult<PrevalenceId>;
    fn update_prevalence(&self, prevalence: &Prevalence) -> RepoResult<()>;
    fn delete_prevalence(&self, id: PrevalenceId) -> RepoResult<()>;
    fn get_prevalence(&self, id: PrevalenceId) -> RepoResult<Option<Prevalence>>;
    fn list_prevalences(&self, query: &PrevalenceListQuery) -> RepoResult<Vec<Prevalence>>;
    /// Links a prevalence record to a disease; no-op when already linked.
    fn attach_to_disease(
        &mut self,
        id: PrevalenceId,
        disease: TermId,
        actor: Option<&str>,
    ) -> RepoResult<()>;
    /// Unlinks a prevalence record from a disease; no-op when not linked.
    fn detach_from_disease(
        &mut self,
        id: PrevalenceId,
        disease: TermId,
        actor: Option<&str>,
    ) -> RepoResult<()>;
    /// Replaces a disease's whole epidemiology set in one transaction.
    fn set_disease_epidemiology(
        &mut self,
        disease: TermId,
        prevalences: &[PrevalenceId],
        actor: Option<&str>,
    ) -> RepoResult<()>;
    /// Returns the prevalence records attached to one disease.
    fn epidemiology_of(&self, disease: TermId) -> RepoResult<Vec<Prevalence>>;
    /// Returns the diseases carrying one prevalence record.
    fn disease_links_with_prevalence(&self, id: PrevalenceId) -> RepoResult<Vec<TermLink>>;
}

/// SQLite-backed epidemiology repository.
pub struct SqlitePrevalenceRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqlitePrevalenceRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_catalog_ready(conn)?;
        Ok(Self { conn })
    }
}

impl PrevalenceRepository for SqlitePrevalenceRepository<'_> {
    fn create_prevalence(&self, prevalence: &Prevalence) -> RepoResult<PrevalenceId> {
        prevalence.validate()?;

        self.conn.execute(
            "INSERT INTO prevalences (uuid, ptype, pqual, pclass, valmoy, geo, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                prevalence.uuid.to_string(),
                prevalence.ptype.code(),
                prevalence.pqual.code(),
                prevalence.pclass.code(),
                prevalence.valmoy,
                prevalence.geo.as_str(),
                prevalence.status.code(),
            ],
        )?;

        Ok(prevalence.uuid)
    }

    fn update_prevalence(&self, prevalence: &Prevalence) -> RepoResult<()> {
        prevalence.validate()?;

        let changed = self.conn.execute(
            "UPDATE prevalences
             SET
                ptype = ?2,
                pqual = ?3,
                pclass = ?4,
                valmoy = ?5,
                geo = ?6,
                status = ?7
             WHERE uuid = ?1;",
            params![
                prevalence.uuid.to_string(),
                prevalence.ptype.code(),
                prevalence.pqual.code(),
                prevalence.pclass.code(),
                prevalence.valmoy,
                prevalence.geo.as_str(),
                prevalence.status.code(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::PrevalenceNotFound(prevalence.uuid));
        }
        Ok(())
    }

    fn delete_prevalence(&self, id: PrevalenceId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM prevalences WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::PrevalenceNotFound(id));
        }
        Ok(())
    }

    fn get_prevalence(&self, id: PrevalenceId) -> RepoResult<Option<Prevalence>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PREVALENCE_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_prevalence_row(row)?));
        }
        Ok(None)
    }

    fn list_prevalences(&self, query: &PrevalenceListQuery) -> RepoResult<Vec<Prevalence>> {
        let mut sql = format!("{PREVALENCE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.code().to_string()));
        }

        sql.push_str(" ORDER BY geo ASC, uuid ASC");

        let limit = match query.limit {
            Some(0) | None => PREVALENCES_DEFAULT_LIMIT,
            Some(value) if value > PREVALENCES_LIMIT_MAX => PREVALENCES_LIMIT_MAX,
            Some(value) => value,
        };
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut prevalences = Vec::new();
        while let Some(row) = rows.next()? {
            prevalences.push(parse_prevalence_row(row)?);
        }
        Ok(prevalences)
    }

    fn attach_to_disease(
        &mut self,
        id: PrevalenceId,
        disease: TermId,
        actor: Option<&str>,
    ) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        require_kind(&tx, disease, TermKind::Disease)?;
        require_prevalence(&tx, id)?;

        let changed = tx.execute(
            "INSERT OR IGNORE INTO disease_prevalences (disease_uuid, prevalence_uuid)
             VALUES (?1, ?2);",
            params![disease.to_string(), id.to_string()],
        )?;
        if changed > 0 {
            touch_term(&tx, disease)?;
            record_term_state(&tx, disease, ChangeAction::Update, actor)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn detach_from_disease(
        &mut self,
        id: PrevalenceId,
        disease: TermId,
        actor: Option<&str>,
    ) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        require_kind(&tx, disease, TermKind::Disease)?;

        let changed = tx.execute(
            "DELETE FROM disease_prevalences
             WHERE disease_uuid = ?1 AND prevalence_uuid = ?2;",
            params![disease.to_string(), id.to_string()],
        )?;
        if changed > 0 {
            touch_term(&tx, disease)?;
            record_term_state(&tx, disease, ChangeAction::Update, actor)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn set_disease_epidemiology(
        &mut self,
        disease: TermId,
        prevalences: &[PrevalenceId],
        actor: Option<&str>,
    ) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        require_kind(&tx, disease, TermKind::Disease)?;
        for prevalence in prevalences {
            require_prevalence(&tx, *prevalence)?;
        }

        tx.execute(
            "DELETE FROM disease_prevalences WHERE disease_uuid = ?1;",
            [disease.to_string()],
        )?;
        for prevalence in prevalences {
            tx.execute(
                "INSERT OR IGNORE INTO disease_prevalences (disease_uuid, prevalence_uuid)
                 VALUES (?1, ?2);",
                params![disease.to_string(), prevalence.to_string()],
            )?;
        }
        touch_term(&tx, disease)?;

        record_term_state(&tx, disease, ChangeAction::Update, actor)?;
        tx.commit()?;
        Ok(())
    }

    fn epidemiology_of(&self, disease: TermId) -> RepoResult<Vec<Prevalence>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PREVALENCE_SELECT_SQL}
             WHERE uuid IN (
                SELECT prevalence_uuid
                FROM disease_prevalences
                WHERE disease_uuid = ?1
             )
             ORDER BY geo ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([disease.to_string()])?;
        let mut prevalences = Vec::new();
        while let Some(row) = rows.next()? {
            prevalences.push(parse_prevalence_row(row)?);
        }
        Ok(prevalences)
    }

    fn disease_links_with_prevalence(&self, id: PrevalenceId) -> RepoResult<Vec<TermLink>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.uuid, t.cui, t.label
             FROM disease_prevalences dp
             INNER JOIN terms t ON t.uuid = dp.disease_uuid
             WHERE dp.prevalence_uuid = ?1
             ORDER BY t.label ASC, t.uuid ASC;",
        )?;
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
}

fn require_prevalence(conn: &Connection, id: PrevalenceId) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM prevalences WHERE uuid = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::PrevalenceNotFound(id));
    }
    Ok(())
}

fn parse_prevalence_row(row: &Row<'_>) -> RepoResult<Prevalence> {
    let uuid_text: String = row.get("uuid")?;

    let ptype_text: String = row.get("ptype")?;
    let ptype = PrevalenceType::parse(&ptype_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid type `{ptype_text}` in prevalences.ptype"))
    })?;

    let pqual_text: String = row.get("pqual")?;
    let pqual = PrevalenceQualification::parse(&pqual_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid qualification `{pqual_text}` in prevalences.pqual"
        ))
    })?;

    let pclass_text: String = row.get("pclass")?;
    let pclass = PrevalenceClass::parse(&pclass_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid class `{pclass_text}` in prevalences.pclass"
        ))
    })?;

    let status_text: String = row.get("status")?;
    let status = PrevalenceStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in prevalences.status"
        ))
    })?;

    Ok(Prevalence {
        uuid: parse_uuid(&uuid_text, "prevalences.uuid")?,
        ptype,
        pqual,
        pclass,
        valmoy: row.get("valmoy")?,
        geo: row.get("geo")?,
        status,
    })
}
