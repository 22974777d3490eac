//! JSON REST layer for the gardrail biomedical catalog.
//!
//! Exposes collection and item endpoints for every catalog entity type under
//! `/api/v1`, backed by `gardrail_core` services over a single SQLite store.

pub mod config;
pub mod error;
pub mod routes;
pub mod serve;
pub mod state;

pub use config::Config;
pub use serve::{app, setup_and_serve};
pub use state::ApiContext;
