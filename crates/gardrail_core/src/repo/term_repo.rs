//! Term catalog repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and lookup APIs over the polymorphic `terms` storage.
//! - Own synonym-link and inheritance-link replacement logic with atomic
//!   semantics.
//! - Record one history snapshot per tracked mutation, inside the mutating
//!   transaction.
//!
//! # Invariants
//! - Write paths call `Term::validate()` before SQL mutations.
//! - `cui` and kind never change after creation.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::model::history::{ChangeAction, TrackedEntity};
use crate::model::synonym::{Synonym, SynonymId};
use crate::model::term::{Term, TermDetail, TermId, TermKind};
use crate::repo::association_repo::{
    gene_association_ids_touching, phenotype_association_ids_touching,
    record_gene_association_delete, record_phenotype_association_delete,
};
use crate::repo::history_repo::record_entry;
use crate::repo::{
    ensure_catalog_ready, is_unique_violation, like_prefix_pattern, parse_uuid, require_kind,
    RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};
use serde_json::json;

const TERM_SELECT_SQL: &str = "SELECT
    uuid,
    kind,
    cui,
    label,
    url,
    description,
    symbol,
    locus
FROM terms";

const TERMS_DEFAULT_LIMIT: u32 = 50;
const TERMS_LIMIT_MAX: u32 = 200;

/// Query options for listing catalog terms.
#[derive(Debug, Clone, Default)]
pub struct TermListQuery {
    /// Restrict to one variant.
    pub kind: Option<TermKind>,
    /// Case-insensitive label prefix match.
    pub label_prefix: Option<String>,
    /// Case-insensitive synonym-name prefix match.
    pub synonym_prefix: Option<String>,
    /// Maximum rows to return. Defaults to 50 and clamps to 200.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

/// Repository interface for the term catalog.
pub trait TermRepository {
    /// Creates one term of any variant and returns its stable id.
    fn create_term(&mut self, term: &Term, actor: Option<&str>) -> RepoResult<TermId>;
    /// Updates mutable fields; identity (`cui`, kind) is rejected if changed.
    fn update_term(&mut self, term: &Term, actor: Option<&str>) -> RepoResult<()>;
    /// Hard-deletes a term; association rows cascade, endpoint terms survive.
    fn delete_term(&mut self, id: TermId, actor: Option<&str>) -> RepoResult<()>;
    /// Gets one term, resolved to its concrete variant, by stable id.
    fn get_term(&self, id: TermId) -> RepoResult<Option<Term>>;
    /// Gets one term by its unique cui.
    fn get_term_by_cui(&self, cui: &str) -> RepoResult<Option<Term>>;
    /// Lists terms using kind/prefix filters and pagination.
    fn list_terms(&self, query: &TermListQuery) -> RepoResult<Vec<Term>>;
    /// Replaces the whole synonym set of a term in one transaction.
    fn set_synonyms(
        &mut self,
        id: TermId,
        synonyms: &[SynonymId],
        actor: Option<&str>,
    ) -> RepoResult<()>;
    /// Attaches one synonym; no-op when already attached.
    fn attach_synonym(
        &mut self,
        id: TermId,
        synonym: SynonymId,
        actor: Option<&str>,
    ) -> RepoResult<()>;
    /// Detaches one synonym; no-op when not attached.
    fn detach_synonym(
        &mut self,
        id: TermId,
        synonym: SynonymId,
        actor: Option<&str>,
    ) -> RepoResult<()>;
    /// Returns a term's synonyms sorted by name.
    fn synonyms_of(&self, id: TermId) -> RepoResult<Vec<Synonym>>;
    /// Returns every term carrying the given synonym.
    fn terms_with_synonym(&self, synonym: SynonymId) -> RepoResult<Vec<Term>>;
    /// Replaces a disease's inheritance-pattern set in one transaction.
    fn set_inheritance(
        &mut self,
        disease: TermId,
        inheritances: &[TermId],
        actor: Option<&str>,
    ) -> RepoResult<()>;
    /// Returns the inheritance patterns attached to a disease.
    fn inheritance_of(&self, disease: TermId) -> RepoResult<Vec<Term>>;
    /// Returns the diseases carrying one inheritance pattern.
    fn diseases_with_inheritance(&self, inheritance: TermId) -> RepoResult<Vec<Term>>;
}

/// SQLite-backed term catalog repository.
pub struct SqliteTermRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteTermRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_catalog_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TermRepository for SqliteTermRepository<'_> {
    fn create_term(&mut self, term: &Term, actor: Option<&str>) -> RepoResult<TermId> {
        term.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let (symbol, locus) = gene_columns(&term.detail);
        let insert = tx.execute(
            "INSERT INTO terms (uuid, kind, cui, label, url, description, symbol, locus)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                term.uuid.to_string(),
                term.kind().as_str(),
                term.cui.as_str(),
                term.label.as_str(),
                term.url.as_deref(),
                term.description.as_deref(),
                symbol,
                locus,
            ],
        );
        if let Err(err) = insert {
            if is_unique_violation(&err) {
                return Err(RepoError::CuiConflict(term.cui.clone()));
            }
            return Err(err.into());
        }

        record_term_state(&tx, term.uuid, ChangeAction::Create, actor)?;
        tx.commit()?;
        Ok(term.uuid)
    }

    fn update_term(&mut self, term: &Term, actor: Option<&str>) -> RepoResult<()> {
        term.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(current) = load_term(&tx, term.uuid)? else {
            return Err(RepoError::TermNotFound(term.uuid));
        };
        if current.kind() != term.kind() {
            return Err(RepoError::ImmutableIdentity {
                id: term.uuid,
                field: "kind",
            });
        }
        if current.cui != term.cui {
            return Err(RepoError::ImmutableIdentity {
                id: term.uuid,
                field: "cui",
            });
        }

        let (symbol, locus) = gene_columns(&term.detail);
        tx.execute(
            "UPDATE terms
             SET
                label = ?2,
                url = ?3,
                description = ?4,
                symbol = ?5,
                locus = ?6,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                term.uuid.to_string(),
                term.label.as_str(),
                term.url.as_deref(),
                term.description.as_deref(),
                symbol,
                locus,
            ],
        )?;

        record_term_state(&tx, term.uuid, ChangeAction::Update, actor)?;
        tx.commit()?;
        Ok(())
    }

    fn delete_term(&mut self, id: TermId, actor: Option<&str>) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if load_term(&tx, id)?.is_none() {
            return Err(RepoError::TermNotFound(id));
        }

        // Cascaded association rows are tracked entities as well; snapshot
        // them before the FK cascade removes them.
        for assoc_id in gene_association_ids_touching(&tx, id)? {
            record_gene_association_delete(&tx, assoc_id, actor)?;
        }
        for assoc_id in phenotype_association_ids_touching(&tx, id)? {
            record_phenotype_association_delete(&tx, assoc_id, actor)?;
        }

        record_term_state(&tx, id, ChangeAction::Delete, actor)?;
        tx.execute("DELETE FROM terms WHERE uuid = ?1;", [id.to_string()])?;
        tx.commit()?;
        Ok(())
    }

    fn get_term(&self, id: TermId) -> RepoResult<Option<Term>> {
        load_term(self.conn, id)
    }

    fn get_term_by_cui(&self, cui: &str) -> RepoResult<Option<Term>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TERM_SELECT_SQL} WHERE cui = ?1;"))?;
        let mut rows = stmt.query([cui])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_term_row(row)?));
        }
        Ok(None)
    }

    fn list_terms(&self, query: &TermListQuery) -> RepoResult<Vec<Term>> {
        let mut sql = format!("{TERM_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(kind) = query.kind {
            sql.push_str(" AND kind = ?");
            bind_values.push(Value::Text(kind.as_str().to_string()));
        }

        if let Some(prefix) = query.label_prefix.as_deref() {
            sql.push_str(" AND label LIKE ? ESCAPE '\\'");
            bind_values.push(Value::Text(like_prefix_pattern(prefix)));
        }

        if let Some(prefix) = query.synonym_prefix.as_deref() {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM term_synonyms ts
                    INNER JOIN synonyms s ON s.uuid = ts.synonym_uuid
                    WHERE ts.term_uuid = terms.uuid
                      AND s.name LIKE ? ESCAPE '\\'
                )",
            );
            bind_values.push(Value::Text(like_prefix_pattern(prefix)));
        }

        sql.push_str(" ORDER BY label ASC, uuid ASC");

        let limit = normalize_term_limit(query.limit);
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut terms = Vec::new();
        while let Some(row) = rows.next()? {
            terms.push(parse_term_row(row)?);
        }
        Ok(terms)
    }

    fn set_synonyms(
        &mut self,
        id: TermId,
        synonyms: &[SynonymId],
        actor: Option<&str>,
    ) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if load_term(&tx, id)?.is_none() {
            return Err(RepoError::TermNotFound(id));
        }
        for synonym in synonyms {
            require_synonym(&tx, *synonym)?;
        }

        tx.execute(
            "DELETE FROM term_synonyms WHERE term_uuid = ?1;",
            [id.to_string()],
        )?;
        for synonym in synonyms {
            tx.execute(
                "INSERT OR IGNORE INTO term_synonyms (term_uuid, synonym_uuid)
                 VALUES (?1, ?2);",
                params![id.to_string(), synonym.to_string()],
            )?;
        }
        touch_term(&tx, id)?;

        record_term_state(&tx, id, ChangeAction::Update, actor)?;
        tx.commit()?;
        Ok(())
    }

    fn attach_synonym(
        &mut self,
        id: TermId,
        synonym: SynonymId,
        actor: Option<&str>,
    ) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if load_term(&tx, id)?.is_none() {
            return Err(RepoError::TermNotFound(id));
        }
        require_synonym(&tx, synonym)?;

        let changed = tx.execute(
            "INSERT OR IGNORE INTO term_synonyms (term_uuid, synonym_uuid)
             VALUES (?1, ?2);",
            params![id.to_string(), synonym.to_string()],
        )?;
        if changed > 0 {
            touch_term(&tx, id)?;
            record_term_state(&tx, id, ChangeAction::Update, actor)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn detach_synonym(
        &mut self,
        id: TermId,
        synonym: SynonymId,
        actor: Option<&str>,
    ) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if load_term(&tx, id)?.is_none() {
            return Err(RepoError::TermNotFound(id));
        }

        let changed = tx.execute(
            "DELETE FROM term_synonyms WHERE term_uuid = ?1 AND synonym_uuid = ?2;",
            params![id.to_string(), synonym.to_string()],
        )?;
        if changed > 0 {
            touch_term(&tx, id)?;
            record_term_state(&tx, id, ChangeAction::Update, actor)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn synonyms_of(&self, id: TermId) -> RepoResult<Vec<Synonym>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.uuid, s.name
             FROM term_synonyms ts
             INNER JOIN synonyms s ON s.uuid = ts.synonym_uuid
             WHERE ts.term_uuid = ?1
             ORDER BY s.name ASC;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut synonyms = Vec::new();
        while let Some(row) = rows.next()? {
            let uuid_text: String = row.get(0)?;
            synonyms.push(Synonym {
                uuid: parse_uuid(&uuid_text, "synonyms.uuid")?,
                name: row.get(1)?,
            });
        }
        Ok(synonyms)
    }

    fn terms_with_synonym(&self, synonym: SynonymId) -> RepoResult<Vec<Term>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TERM_SELECT_SQL}
             WHERE uuid IN (
                SELECT term_uuid FROM term_synonyms WHERE synonym_uuid = ?1
             )
             ORDER BY label ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([synonym.to_string()])?;
        let mut terms = Vec::new();
        while let Some(row) = rows.next()? {
            terms.push(parse_term_row(row)?);
        }
        Ok(terms)
    }

    fn set_inheritance(
        &mut self,
        disease: TermId,
        inheritances: &[TermId],
        actor: Option<&str>,
    ) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        require_kind(&tx, disease, TermKind::Disease)?;
        for inheritance in inheritances {
            require_kind(&tx, *inheritance, TermKind::Inheritance)?;
        }

        tx.execute(
            "DELETE FROM disease_inheritances WHERE disease_uuid = ?1;",
            [disease.to_string()],
        )?;
        for inheritance in inheritances {
            tx.execute(
                "INSERT OR IGNORE INTO disease_inheritances (disease_uuid, inheritance_uuid)
                 VALUES (?1, ?2);",
                params![disease.to_string(), inheritance.to_string()],
            )?;
        }
        touch_term(&tx, disease)?;

        record_term_state(&tx, disease, ChangeAction::Update, actor)?;
        tx.commit()?;
        Ok(())
    }

    fn inheritance_of(&self, disease: TermId) -> RepoResult<Vec<Term>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TERM_SELECT_SQL}
             WHERE uuid IN (
                SELECT inheritance_uuid
                FROM disease_inheritances
                WHERE disease_uuid = ?1
             )
             ORDER BY label ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([disease.to_string()])?;
        let mut terms = Vec::new();
        while let Some(row) = rows.next()? {
            terms.push(parse_term_row(row)?);
        }
        Ok(terms)
    }

    fn diseases_with_inheritance(&self, inheritance: TermId) -> RepoResult<Vec<Term>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TERM_SELECT_SQL}
             WHERE uuid IN (
                SELECT disease_uuid
                FROM disease_inheritances
                WHERE inheritance_uuid = ?1
             )
             ORDER BY label ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([inheritance.to_string()])?;
        let mut terms = Vec::new();
        while let Some(row) = rows.next()? {
            terms.push(parse_term_row(row)?);
        }
        Ok(terms)
    }
}

/// Normalizes list limit according to catalog contract.
pub fn normalize_term_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) => TERMS_DEFAULT_LIMIT,
        Some(value) if value > TERMS_LIMIT_MAX => TERMS_LIMIT_MAX,
        Some(value) => value,
        None => TERMS_DEFAULT_LIMIT,
    }
}

/// Snapshots a term's full field state, including its link sets, as one
/// history row. For deletes, call before removing the row.
pub(crate) fn record_term_state(
    conn: &Connection,
    id: TermId,
    action: ChangeAction,
    actor: Option<&str>,
) -> RepoResult<()> {
    let Some(term) = load_term(conn, id)? else {
        return Err(RepoError::TermNotFound(id));
    };

    let mut snapshot = serde_json::to_value(&term)
        .map_err(|err| RepoError::InvalidData(format!("cannot serialize term {id}: {err}")))?;
    if let serde_json::Value::Object(map) = &mut snapshot {
        let synonyms: Vec<String> = synonym_ids_of(conn, id)?
            .iter()
            .map(SynonymId::to_string)
            .collect();
        map.insert("synonyms".to_string(), json!(synonyms));

        if term.kind() == TermKind::Disease {
            map.insert("inheritance".to_string(), json!(inheritance_ids_of(conn, id)?));
            map.insert("epidemiology".to_string(), json!(prevalence_ids_of(conn, id)?));
        }
    }

    record_entry(
        conn,
        TrackedEntity::from(term.kind()),
        id,
        action,
        actor,
        &snapshot,
    )
}

pub(crate) fn load_term(conn: &Connection, id: TermId) -> RepoResult<Option<Term>> {
    let mut stmt = conn.prepare(&format!("{TERM_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_term_row(row)?));
    }
    Ok(None)
}

pub(crate) fn synonym_ids_of(conn: &Connection, id: TermId) -> RepoResult<Vec<SynonymId>> {
    let mut stmt = conn.prepare(
        "SELECT synonym_uuid
         FROM term_synonyms
         WHERE term_uuid = ?1
         ORDER BY synonym_uuid ASC;",
    )?;
    let mut rows = stmt.query([id.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let text: String = row.get(0)?;
        ids.push(parse_uuid(&text, "term_synonyms.synonym_uuid")?);
    }
    Ok(ids)
}

fn inheritance_ids_of(conn: &Connection, disease: TermId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT inheritance_uuid
         FROM disease_inheritances
         WHERE disease_uuid = ?1
         ORDER BY inheritance_uuid ASC;",
    )?;
    let mut rows = stmt.query([disease.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get::<_, String>(0)?);
    }
    Ok(ids)
}

fn prevalence_ids_of(conn: &Connection, disease: TermId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT prevalence_uuid
         FROM disease_prevalences
         WHERE disease_uuid = ?1
         ORDER BY prevalence_uuid ASC;",
    )?;
    let mut rows = stmt.query([disease.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get::<_, String>(0)?);
    }
    Ok(ids)
}

pub(crate) fn touch_term(conn: &Connection, id: TermId) -> RepoResult<()> {
    conn.execute(
        "UPDATE terms
         SET updated_at = (strftime('%s', 'now') * 1000)
         WHERE uuid = ?1;",
        [id.to_string()],
    )?;
    Ok(())
}

fn require_synonym(conn: &Connection, id: SynonymId) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM synonyms WHERE uuid = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::SynonymNotFound(id));
    }
    Ok(())
}

fn gene_columns(detail: &TermDetail) -> (Option<&str>, Option<&str>) {
    match detail {
        TermDetail::Gene { symbol, locus } => (Some(symbol.as_str()), locus.as_deref()),
        _ => (None, None),
    }
}

fn parse_term_row(row: &Row<'_>) -> RepoResult<Term> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "terms.uuid")?;

    let kind_text: String = row.get("kind")?;
    let kind = TermKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid term kind `{kind_text}` in terms.kind"))
    })?;

    let detail = match kind {
        TermKind::Disease => TermDetail::Disease,
        TermKind::Phenotype => TermDetail::Phenotype,
        TermKind::Inheritance => TermDetail::Inheritance,
        TermKind::Reference => TermDetail::Reference,
        TermKind::Gene => {
            let symbol: Option<String> = row.get("symbol")?;
            let symbol = symbol.ok_or_else(|| {
                RepoError::InvalidData(format!("gene term {uuid} has no symbol"))
            })?;
            TermDetail::Gene {
                symbol,
                locus: row.get("locus")?,
            }
        }
    };

    let term = Term {
        uuid,
        cui: row.get("cui")?,
        label: row.get("label")?,
        url: row.get("url")?,
        description: row.get("description")?,
        detail,
    };
    term.validate()?;
    Ok(term)
}
