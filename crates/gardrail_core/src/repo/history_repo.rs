//! Audit history persistence: generic snapshot writer and readers.
//!
//! # Responsibility
//! - Record one immutable snapshot per mutation of a tracked entity, inside
//!   the caller's transaction.
//! - Read an entity's snapshots back in chronological order.
//!
//! # Invariants
//! - Snapshots are append-only; there is no update or delete path.
//! - The writer is one generic function parameterized by entity schema,
//!   shared by every tracked entity type.

use crate::model::history::{ChangeAction, HistoryEntry, TrackedEntity};
use crate::repo::{ensure_catalog_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use uuid::Uuid;

const HISTORY_SELECT_SQL: &str = "SELECT
    id,
    entity_kind,
    entity_uuid,
    action,
    actor,
    recorded_at,
    snapshot
FROM history";

/// Appends one snapshot row for `(entity, entity_uuid)`.
///
/// Callers invoke this inside the transaction that carries the entity
/// mutation, so snapshot and mutation commit or roll back together.
pub(crate) fn record_entry<S: Serialize>(
    conn: &Connection,
    entity: TrackedEntity,
    entity_uuid: Uuid,
    action: ChangeAction,
    actor: Option<&str>,
    snapshot: &S,
) -> RepoResult<()> {
    let payload = serde_json::to_string(snapshot).map_err(|err| {
        RepoError::InvalidData(format!(
            "cannot serialize {} snapshot: {err}",
            entity.as_str()
        ))
    })?;

    conn.execute(
        "INSERT INTO history (entity_kind, entity_uuid, action, actor, snapshot)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            entity.as_str(),
            entity_uuid.to_string(),
            action.as_str(),
            actor,
            payload,
        ],
    )?;

    Ok(())
}

/// Read interface over the audit overlay.
pub trait HistoryRepository {
    /// Returns all snapshots for one entity, oldest first.
    fn history_for(
        &self,
        entity: TrackedEntity,
        entity_uuid: Uuid,
    ) -> RepoResult<Vec<HistoryEntry>>;

    /// Returns the most recent snapshot for one entity, if any.
    fn latest_snapshot(
        &self,
        entity: TrackedEntity,
        entity_uuid: Uuid,
    ) -> RepoResult<Option<HistoryEntry>>;
}

/// SQLite-backed history reader.
pub struct SqliteHistoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHistoryRepository<'conn> {
    /// Constructs a reader from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_catalog_ready(conn)?;
        Ok(Self { conn })
    }
}

impl HistoryRepository for SqliteHistoryRepository<'_> {
    fn history_for(
        &self,
        entity: TrackedEntity,
        entity_uuid: Uuid,
    ) -> RepoResult<Vec<HistoryEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "{HISTORY_SELECT_SQL}
             WHERE entity_kind = ?1 AND entity_uuid = ?2
             ORDER BY id ASC;"
        ))?;

        let mut rows = stmt.query(params![entity.as_str(), entity_uuid.to_string()])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_history_row(row)?);
        }
        Ok(entries)
    }

    fn latest_snapshot(
        &self,
        entity: TrackedEntity,
        entity_uuid: Uuid,
    ) -> RepoResult<Option<HistoryEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "{HISTORY_SELECT_SQL}
             WHERE entity_kind = ?1 AND entity_uuid = ?2
             ORDER BY id DESC
             LIMIT 1;"
        ))?;

        let mut rows = stmt.query(params![entity.as_str(), entity_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_history_row(row)?));
        }
        Ok(None)
    }
}

fn parse_history_row(row: &Row<'_>) -> RepoResult<HistoryEntry> {
    let entity_text: String = row.get("entity_kind")?;
    let entity = TrackedEntity::parse(&entity_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid entity kind `{entity_text}` in history.entity_kind"
        ))
    })?;

    let action_text: String = row.get("action")?;
    let action = ChangeAction::parse(&action_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid action `{action_text}` in history.action"))
    })?;

    let uuid_text: String = row.get("entity_uuid")?;
    let entity_uuid = parse_uuid(&uuid_text, "history.entity_uuid")?;

    let snapshot_text: String = row.get("snapshot")?;
    let snapshot = serde_json::from_str(&snapshot_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid snapshot payload for {entity_uuid}: {err}"))
    })?;

    Ok(HistoryEntry {
        id: row.get("id")?,
        entity,
        entity_uuid,
        action,
        actor: row.get("actor")?,
        recorded_at: row.get("recorded_at")?,
        snapshot,
    })
}
