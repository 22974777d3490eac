//! Shared request-handling state.
//!
//! # Responsibility
//! - Hold the single catalog connection behind a mutex for the handler pool.
//!
//! # Invariants
//! - Every mutation runs as one SQLite transaction on this connection; the
//!   storage engine provides the serialization guarantees.

use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cloneable handler state wrapping the catalog store.
#[derive(Clone)]
pub struct ApiContext {
    db: Arc<Mutex<Connection>>,
}

impl ApiContext {
    /// Wraps a migrated/ready connection (see `gardrail_core::db::open_db`).
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    /// Locks the catalog connection for the duration of one request.
    pub fn db(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
