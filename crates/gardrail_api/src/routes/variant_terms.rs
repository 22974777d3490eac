//! Kind-scoped term routers: `/genes`, `/phenotypes`, `/inheritances`,
//! `/references`.
//!
//! One implementation serves all four resources; the router pins the kind,
//! and lookups outside the scope read as not-found. Reverse-disease
//! relationships are side-loaded per kind.

use crate::error::{ApiError, ApiResult};
use crate::routes::associations::gene_association_payload;
use crate::routes::terms::{
    create_with_kind, term_payload, CreateTermRequest, IncludeParams, ListParams,
    UpdateTermRequest,
};
use crate::routes::{curator, includes};
use crate::state::ApiContext;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use gardrail_core::{
    AssociationRepository, GeneAssociationQuery, SqliteAssociationRepository,
    SqliteTermRepository, SynonymId, TermKind, TermRepository,
};
use serde_json::{json, Value};
use uuid::Uuid;

pub fn router(kind: TermKind) -> Router<ApiContext> {
    Router::new()
        .route(
            "/",
            get(move |state: State<ApiContext>, query: Query<ListParams>| async move {
                list(state, query, kind)
            })
            .post(
                move |state: State<ApiContext>,
                      headers: HeaderMap,
                      body: Json<CreateTermRequest>| async move {
                    create(state, headers, body, kind)
                },
            ),
        )
        .route(
            "/{id}",
            get(
                move |state: State<ApiContext>,
                      path: Path<Uuid>,
                      query: Query<IncludeParams>| async move {
                    get_one(state, path, query, kind)
                },
            )
            .patch(
                move |state: State<ApiContext>,
                      path: Path<Uuid>,
                      headers: HeaderMap,
                      body: Json<UpdateTermRequest>| async move {
                    update(state, path, headers, body, kind)
                },
            )
            .delete(
                move |state: State<ApiContext>, path: Path<Uuid>, headers: HeaderMap| async move {
                    delete(state, path, headers, kind)
                },
            ),
        )
}

fn list(
    State(ctx): State<ApiContext>,
    Query(params): Query<ListParams>,
    kind: TermKind,
) -> ApiResult<Json<Value>> {
    crate::routes::terms::list_payload(&ctx, Some(kind), &params)
}

fn create(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
    Json(request): Json<CreateTermRequest>,
    kind: TermKind,
) -> ApiResult<(StatusCode, Json<Value>)> {
    create_with_kind(&ctx, &headers, &request, Some(kind))
}

fn get_one(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Query(params): Query<IncludeParams>,
    kind: TermKind,
) -> ApiResult<Json<Value>> {
    let wanted = includes(params.include.as_deref());
    let mut body = {
        let mut guard = ctx.db();
        let repo = SqliteTermRepository::try_new(&mut guard)?;
        let term = crate::routes::terms::load_expected(&repo, id, Some(kind))?;
        let synonyms = repo.synonyms_of(term.uuid)?;
        let synonym_ids: Vec<SynonymId> =
            synonyms.iter().map(|synonym| synonym.uuid).collect();

        let mut body = json!({ "data": term_payload(&term, &synonym_ids) });
        if wanted.contains("synonyms") {
            body["included"]["synonyms"] = json!(synonyms
                .iter()
                .map(crate::routes::terms::synonym_payload)
                .collect::<Vec<_>>());
        }
        body
    };

    if wanted.contains("diseases") {
        body["included"]["diseases"] = diseases_included(&ctx, id, kind)?;
    }

    Ok(Json(body))
}

/// Reverse-disease side-load, resolved per variant.
fn diseases_included(ctx: &ApiContext, id: Uuid, kind: TermKind) -> ApiResult<Value> {
    let mut guard = ctx.db();
    match kind {
        TermKind::Gene => {
            let repo = SqliteAssociationRepository::try_new(&mut guard)?;
            let assocs = repo.list_gene_associations(&GeneAssociationQuery {
                gene: Some(id),
                limit: Some(200),
                ..GeneAssociationQuery::default()
            })?;
            Ok(json!(assocs
                .iter()
                .map(gene_association_payload)
                .collect::<Vec<_>>()))
        }
        TermKind::Phenotype => {
            let repo = SqliteAssociationRepository::try_new(&mut guard)?;
            let links = repo.disease_links_for_phenotype(id)?;
            Ok(json!(links))
        }
        TermKind::Inheritance => {
            let repo = SqliteTermRepository::try_new(&mut guard)?;
            let diseases = repo.diseases_with_inheritance(id)?;
            let mut payloads = Vec::with_capacity(diseases.len());
            for disease in &diseases {
                let synonym_ids: Vec<SynonymId> = repo
                    .synonyms_of(disease.uuid)?
                    .iter()
                    .map(|synonym| synonym.uuid)
                    .collect();
                payloads.push(term_payload(disease, &synonym_ids));
            }
            Ok(json!(payloads))
        }
        TermKind::Reference | TermKind::Disease => Err(ApiError::Invalid(format!(
            "`diseases` cannot be included for {} resources",
            kind.as_str()
        ))),
    }
}

fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<UpdateTermRequest>,
    kind: TermKind,
) -> ApiResult<Json<Value>> {
    let mut guard = ctx.db();
    let mut repo = SqliteTermRepository::try_new(&mut guard)?;

    let mut term = crate::routes::terms::load_expected(&repo, id, Some(kind))?;
    crate::routes::terms::apply_term_update(&mut term, &request);
    repo.update_term(&term, curator(&headers).as_deref())?;

    let synonym_ids: Vec<SynonymId> = repo
        .synonyms_of(id)?
        .iter()
        .map(|synonym| synonym.uuid)
        .collect();
    Ok(Json(json!({ "data": term_payload(&term, &synonym_ids) })))
}

fn delete(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    kind: TermKind,
) -> ApiResult<StatusCode> {
    let mut guard = ctx.db();
    let mut repo = SqliteTermRepository::try_new(&mut guard)?;
    // Kind scope first: a gene id is not deletable through /phenotypes.
    crate::routes::terms::load_expected(&repo, id, Some(kind))?;
    repo.delete_term(id, curator(&headers).as_deref())?;
    Ok(StatusCode::NO_CONTENT)
}
