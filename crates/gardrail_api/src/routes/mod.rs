//! REST resource routing.
//!
//! # Responsibility
//! - Assemble the `/api/v1` router: one collection/item module per entity
//!   type, plus dedicated relationship sub-resources.
//! - Share small request-shape helpers across modules.
//!
//! # Invariants
//! - Relationship fields in entity payloads are read-only id arrays; writes
//!   go through association endpoints and `PUT` sub-resources.
//! - Coded fields are written as raw codes; responses decode where the
//!   display contract asks for labels.

use crate::state::ApiContext;
use axum::http::HeaderMap;
use axum::Router;
use gardrail_core::TermKind;
use std::collections::HashSet;

pub mod associations;
pub mod diseases;
pub mod prevalences;
pub mod synonyms;
pub mod terms;
pub mod variant_terms;

/// Builds the `/api/v1` resource router.
pub fn router() -> Router<ApiContext> {
    Router::new()
        .nest("/synonyms", synonyms::router())
        .nest("/terms", terms::router())
        .nest("/diseases", diseases::router())
        .nest("/genes", variant_terms::router(TermKind::Gene))
        .nest("/phenotypes", variant_terms::router(TermKind::Phenotype))
        .nest("/inheritances", variant_terms::router(TermKind::Inheritance))
        .nest("/references", variant_terms::router(TermKind::Reference))
        .nest("/disease_gene_associations", associations::gene_router())
        .nest(
            "/disease_phenotype_associations",
            associations::phenotype_router(),
        )
        .nest("/prevalences", prevalences::router())
}

/// Acting curator, taken from the optional `x-curator` header.
pub(crate) fn curator(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-curator")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Parses the comma-separated `include` query parameter.
pub(crate) fn includes(param: Option<&str>) -> HashSet<String> {
    param
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
