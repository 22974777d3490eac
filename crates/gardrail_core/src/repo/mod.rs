//! Repository layer abstractions and SQLite persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for the catalog.
//! - Isolate SQL details and constraint-error mapping from service
//!   orchestration.
//!
//! # Invariants
//! - Repository writes must run model `validate()` before SQL mutations.
//! - Every mutation of a tracked entity writes its history snapshot inside
//!   the same transaction.
//! - SQLite constraint failures are surfaced as typed uniqueness errors, not
//!   generic storage errors.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::association::{AssociationId, FrequencyId};
use crate::model::prevalence::PrevalenceId;
use crate::model::synonym::SynonymId;
use crate::model::term::{TermId, TermKind};
use crate::model::ValidationError;
use rusqlite::Connection;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod association_repo;
pub mod history_repo;
pub mod prevalence_repo;
pub mod synonym_repo;
pub mod term_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Typed error for catalog persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Model-level invariant failed before any SQL ran.
    Validation(ValidationError),
    /// Underlying SQLite/bootstrap failure.
    Db(DbError),
    /// Term lookup found nothing.
    TermNotFound(TermId),
    /// Synonym lookup found nothing.
    SynonymNotFound(SynonymId),
    /// Association lookup found nothing.
    AssociationNotFound(AssociationId),
    /// Frequency lookup found nothing.
    FrequencyNotFound(FrequencyId),
    /// Prevalence lookup found nothing.
    PrevalenceNotFound(PrevalenceId),
    /// Another term of any kind already carries this cui.
    CuiConflict(String),
    /// Another synonym already carries this name.
    DuplicateSynonym(String),
    /// An association already exists for this endpoint pair.
    DuplicatePair { disease: TermId, target: TermId },
    /// A frequency row with the same `(value, other)` encoding exists.
    DuplicateFrequency,
    /// A frequency with neither coded value nor free text hit the SQL check.
    InvalidFrequencyEncoding,
    /// A referenced term exists but is not of the required kind.
    KindMismatch {
        id: TermId,
        expected: TermKind,
        actual: TermKind,
    },
    /// Attempt to change an immutable identity field after creation.
    ImmutableIdentity { id: TermId, field: &'static str },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::TermNotFound(id) => write!(f, "term not found: {id}"),
            Self::SynonymNotFound(id) => write!(f, "synonym not found: {id}"),
            Self::AssociationNotFound(id) => write!(f, "association not found: {id}"),
            Self::FrequencyNotFound(id) => write!(f, "frequency not found: {id}"),
            Self::PrevalenceNotFound(id) => write!(f, "prevalence not found: {id}"),
            Self::CuiConflict(cui) => {
                write!(f, "a term with cui `{cui}` already exists")
            }
            Self::DuplicateSynonym(name) => {
                write!(f, "a synonym named `{name}` already exists")
            }
            Self::DuplicatePair { disease, target } => write!(
                f,
                "an association between disease {disease} and {target} already exists"
            ),
            Self::DuplicateFrequency => {
                write!(f, "a frequency with the same value/other encoding already exists")
            }
            Self::InvalidFrequencyEncoding => {
                write!(f, "frequency needs a coded value or free text")
            }
            Self::KindMismatch {
                id,
                expected,
                actual,
            } => write!(
                f,
                "term {id} is a {} where a {} is required",
                actual.as_str(),
                expected.as_str()
            ),
            Self::ImmutableIdentity { id, field } => {
                write!(f, "term {id}: `{field}` is immutable after creation")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
            Self::InvalidData(message) => {
                write!(f, "invalid persisted catalog data: {message}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Lightweight read model for linked-entry displays: `label (cui)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermLink {
    pub uuid: TermId,
    pub cui: String,
    pub label: String,
}

/// Read model for gene listings, which display the symbol instead of the
/// label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneLink {
    pub uuid: TermId,
    pub cui: String,
    pub symbol: String,
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _)
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

pub(crate) fn is_check_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _)
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_CHECK
    )
}

pub(crate) fn parse_uuid(value: &str, context: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {context}")))
}

/// Escapes a user-supplied prefix for use in a `LIKE ? ESCAPE '\'` pattern.
pub(crate) fn like_prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for ch in prefix.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

const REQUIRED_TABLES: &[&str] = &[
    "terms",
    "synonyms",
    "term_synonyms",
    "frequencies",
    "prevalences",
    "disease_inheritances",
    "disease_prevalences",
    "disease_gene_assocs",
    "disease_gene_assoc_refs",
    "disease_phenotype_assocs",
    "disease_phenotype_assoc_refs",
    "history",
];

/// Verifies the connection was opened through `db::open_*` and carries the
/// full catalog schema.
pub(crate) fn ensure_catalog_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in REQUIRED_TABLES {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    for column in ["kind", "cui", "symbol", "locus"] {
        if !table_has_column(conn, "terms", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "terms",
                column,
            });
        }
    }

    for column in ["entity_kind", "entity_uuid", "action", "snapshot"] {
        if !table_has_column(conn, "history", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "history",
                column,
            });
        }
    }

    Ok(())
}

/// Verifies a term exists and is of the required kind.
pub(crate) fn require_kind(
    conn: &Connection,
    id: TermId,
    expected: TermKind,
) -> RepoResult<()> {
    let kind_text: Option<String> = conn
        .query_row(
            "SELECT kind FROM terms WHERE uuid = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )
        .map(Some)
        .or_else(|err| match err {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })?;

    let Some(kind_text) = kind_text else {
        return Err(RepoError::TermNotFound(id));
    };
    let actual = TermKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid term kind `{kind_text}` in terms.kind"))
    })?;
    if actual != expected {
        return Err(RepoError::KindMismatch {
            id,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Verifies a term exists, regardless of kind.
pub(crate) fn require_term(conn: &Connection, id: TermId) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM terms WHERE uuid = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::TermNotFound(id));
    }
    Ok(())
}

pub(crate) fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn table_has_column(
    conn: &Connection,
    table: &str,
    column: &str,
) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
