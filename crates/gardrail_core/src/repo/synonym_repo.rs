//! Synonym repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the shared `synonyms` storage.
//!
//! # Invariants
//! - `name` is unique catalog-wide; the violation surfaces as a typed error.
//! - Deleting a synonym removes its term links but never the terms.

use crate::model::synonym::{normalize_name, Synonym, SynonymId};
use crate::repo::{
    ensure_catalog_ready, is_unique_violation, like_prefix_pattern, parse_uuid, RepoError,
    RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const SYNONYM_SELECT_SQL: &str = "SELECT uuid, name FROM synonyms";

const SYNONYMS_DEFAULT_LIMIT: u32 = 50;
const SYNONYMS_LIMIT_MAX: u32 = 200;

/// Query options for listing synonyms.
#[derive(Debug, Clone, Default)]
pub struct SynonymListQuery {
    /// Case-insensitive name prefix match.
    pub name_prefix: Option<String>,
    /// Maximum rows to return. Defaults to 50 and clamps to 200.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

/// Repository interface for synonym CRUD operations.
pub trait SynonymRepository {
    fn create_synonym(&self, synonym: &Synonym) -> RepoResult<SynonymId>;
    fn rename_synonym(&self, id: SynonymId, name: &str) -> RepoResult<()>;
    fn delete_synonym(&self, id: SynonymId) -> RepoResult<()>;
    fn get_synonym(&self, id: SynonymId) -> RepoResult<Option<Synonym>>;
    fn get_synonym_by_name(&self, name: &str) -> RepoResult<Option<Synonym>>;
    fn list_synonyms(&self, query: &SynonymListQuery) -> RepoResult<Vec<Synonym>>;
}

/// SQLite-backed synonym repository.
pub struct SqliteSynonymRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSynonymRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_catalog_ready(conn)?;
        Ok(Self { conn })
    }
}

impl SynonymRepository for SqliteSynonymRepository<'_> {
    fn create_synonym(&self, synonym: &Synonym) -> RepoResult<SynonymId> {
        synonym.validate()?;
        let name = normalize_name(&synonym.name)
            .ok_or(RepoError::Validation(
                crate::model::ValidationError::EmptySynonymName,
            ))?;

        let insert = self.conn.execute(
            "INSERT INTO synonyms (uuid, name) VALUES (?1, ?2);",
            params![synonym.uuid.to_string(), name],
        );
        if let Err(err) = insert {
            if is_unique_violation(&err) {
                return Err(RepoError::DuplicateSynonym(name));
            }
            return Err(err.into());
        }

        Ok(synonym.uuid)
    }

    fn rename_synonym(&self, id: SynonymId, name: &str) -> RepoResult<()> {
        let name = normalize_name(name).ok_or(RepoError::Validation(
            crate::model::ValidationError::EmptySynonymName,
        ))?;

        let update = self.conn.execute(
            "UPDATE synonyms SET name = ?2 WHERE uuid = ?1;",
            params![id.to_string(), name],
        );
        match update {
            Ok(0) => Err(RepoError::SynonymNotFound(id)),
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(RepoError::DuplicateSynonym(name)),
            Err(err) => Err(err.into()),
        }
    }

    fn delete_synonym(&self, id: SynonymId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM synonyms WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::SynonymNotFound(id));
        }
        Ok(())
    }

    fn get_synonym(&self, id: SynonymId) -> RepoResult<Option<Synonym>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SYNONYM_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_synonym_row(row)?));
        }
        Ok(None)
    }

    fn get_synonym_by_name(&self, name: &str) -> RepoResult<Option<Synonym>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SYNONYM_SELECT_SQL} WHERE name = ?1;"))?;
        let mut rows = stmt.query([name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_synonym_row(row)?));
        }
        Ok(None)
    }

    fn list_synonyms(&self, query: &SynonymListQuery) -> RepoResult<Vec<Synonym>> {
        let mut sql = format!("{SYNONYM_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(prefix) = query.name_prefix.as_deref() {
            sql.push_str(" AND name LIKE ? ESCAPE '\\'");
            bind_values.push(Value::Text(like_prefix_pattern(prefix)));
        }

        sql.push_str(" ORDER BY name ASC, uuid ASC");

        let limit = match query.limit {
            Some(0) | None => SYNONYMS_DEFAULT_LIMIT,
            Some(value) if value > SYNONYMS_LIMIT_MAX => SYNONYMS_LIMIT_MAX,
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
        let mut synonyms = Vec::new();
        while let Some(row) = rows.next()? {
            synonyms.push(parse_synonym_row(row)?);
        }
        Ok(synonyms)
    }
}

fn parse_synonym_row(row: &Row<'_>) -> RepoResult<Synonym> {
    let uuid_text: String = row.get("uuid")?;
    Ok(Synonym {
        uuid: parse_uuid(&uuid_text, "synonyms.uuid")?,
        name: row.get("name")?,
    })
}
