//! `/terms` endpoints over the whole polymorphic catalog, plus the payload
//! helpers shared by the kind-scoped routers.

use crate::error::{ApiError, ApiResult};
use crate::routes::{curator, includes};
use crate::state::ApiContext;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, put};
use axum::{Json, Router};
use gardrail_core::{
    Synonym, SynonymId, SqliteTermRepository, Term, TermDetail, TermId, TermKind, TermListQuery,
    TermRepository,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub(crate) struct ListParams {
    pub kind: Option<String>,
    pub label: Option<String>,
    pub synonym: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IncludeParams {
    pub include: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateTermRequest {
    /// Required on `/terms`; ignored on kind-scoped routers.
    #[serde(default)]
    pub kind: String,
    pub cui: String,
    pub label: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub locus: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateTermRequest {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub locus: Option<String>,
}

pub fn router() -> Router<ApiContext> {
    Router::new()
        .route("/", get(list_terms).post(create_term))
        .route(
            "/{id}",
            get(get_term).patch(update_term).delete(delete_term),
        )
        .route("/{id}/synonyms", put(set_synonyms))
}

/// Builds a term resource payload with its synonym relationship ids.
pub(crate) fn term_payload(term: &Term, synonyms: &[SynonymId]) -> Value {
    let mut payload = json!({
        "id": term.uuid,
        "kind": term.kind().as_str(),
        "cui": term.cui,
        "label": term.label,
        "url": term.url,
        "description": term.description,
        "synonyms": synonyms,
    });
    if let TermDetail::Gene { symbol, locus } = &term.detail {
        payload["symbol"] = json!(symbol);
        payload["locus"] = json!(locus);
    }
    payload
}

pub(crate) fn synonym_payload(synonym: &Synonym) -> Value {
    json!({ "id": synonym.uuid, "name": synonym.name })
}

/// Converts a create request into a validated-model term.
pub(crate) fn term_from_request(
    request: &CreateTermRequest,
    forced_kind: Option<TermKind>,
) -> ApiResult<Term> {
    let kind = match forced_kind {
        Some(kind) => kind,
        None => TermKind::parse(&request.kind)
            .ok_or_else(|| ApiError::Invalid(format!("unknown term kind `{}`", request.kind)))?,
    };

    let detail = match kind {
        TermKind::Disease => TermDetail::Disease,
        TermKind::Phenotype => TermDetail::Phenotype,
        TermKind::Inheritance => TermDetail::Inheritance,
        TermKind::Reference => TermDetail::Reference,
        TermKind::Gene => TermDetail::Gene {
            symbol: request
                .symbol
                .clone()
                .ok_or_else(|| ApiError::Invalid("gene terms require a symbol".to_string()))?,
            locus: request.locus.clone(),
        },
    };

    let mut term = Term::new(request.cui.clone(), request.label.clone(), detail);
    term.url = request.url.clone();
    term.description = request.description.clone();
    Ok(term)
}

/// Applies a partial update onto a loaded term. Absent fields stay unchanged.
pub(crate) fn apply_term_update(term: &mut Term, request: &UpdateTermRequest) {
    if let Some(label) = &request.label {
        term.label = label.clone();
    }
    if request.url.is_some() {
        term.url = request.url.clone();
    }
    if request.description.is_some() {
        term.description = request.description.clone();
    }
    if let TermDetail::Gene { symbol, locus } = &mut term.detail {
        if let Some(new_symbol) = &request.symbol {
            *symbol = new_symbol.clone();
        }
        if request.locus.is_some() {
            *locus = request.locus.clone();
        }
    }
}

/// Shared list implementation, optionally pinned to one kind.
pub(crate) fn list_payload(
    ctx: &ApiContext,
    forced_kind: Option<TermKind>,
    params: &ListParams,
) -> ApiResult<Json<Value>> {
    let mut guard = ctx.db();
    let repo = SqliteTermRepository::try_new(&mut guard)?;

    let kind = match forced_kind {
        Some(kind) => Some(kind),
        None => match params.kind.as_deref() {
            Some(value) => Some(TermKind::parse(value).ok_or_else(|| {
                ApiError::Invalid(format!("unknown term kind `{value}`"))
            })?),
            None => None,
        },
    };

    let terms = repo.list_terms(&TermListQuery {
        kind,
        label_prefix: params.label.clone(),
        synonym_prefix: params.synonym.clone(),
        limit: params.limit,
        offset: params.offset.unwrap_or(0),
    })?;

    let mut data = Vec::with_capacity(terms.len());
    for term in &terms {
        let synonym_ids: Vec<SynonymId> = repo
            .synonyms_of(term.uuid)?
            .iter()
            .map(|synonym| synonym.uuid)
            .collect();
        data.push(term_payload(term, &synonym_ids));
    }

    Ok(Json(json!({ "data": data })))
}

/// Shared item implementation with `include=synonyms` support.
pub(crate) fn item_payload(
    ctx: &ApiContext,
    id: TermId,
    expected_kind: Option<TermKind>,
    include: Option<&str>,
) -> ApiResult<Json<Value>> {
    let mut guard = ctx.db();
    let repo = SqliteTermRepository::try_new(&mut guard)?;

    let term = load_expected(&repo, id, expected_kind)?;
    let synonyms = repo.synonyms_of(term.uuid)?;
    let synonym_ids: Vec<SynonymId> = synonyms.iter().map(|synonym| synonym.uuid).collect();

    let mut body = json!({ "data": term_payload(&term, &synonym_ids) });
    let wanted = includes(include);
    if wanted.contains("synonyms") {
        body["included"] = json!({
            "synonyms": synonyms.iter().map(synonym_payload).collect::<Vec<_>>(),
        });
    }
    Ok(Json(body))
}

/// Loads a term and enforces the router's kind scope as not-found.
pub(crate) fn load_expected(
    repo: &SqliteTermRepository<'_>,
    id: TermId,
    expected_kind: Option<TermKind>,
) -> ApiResult<Term> {
    let term = repo
        .get_term(id)?
        .ok_or(gardrail_core::RepoError::TermNotFound(id))?;
    if let Some(kind) = expected_kind {
        if term.kind() != kind {
            return Err(ApiError::Repo(gardrail_core::RepoError::TermNotFound(id)));
        }
    }
    Ok(term)
}

/// Shared create implementation, optionally pinned to one kind.
pub(crate) fn create_with_kind(
    ctx: &ApiContext,
    headers: &HeaderMap,
    request: &CreateTermRequest,
    forced_kind: Option<TermKind>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let term = term_from_request(request, forced_kind)?;
    let mut guard = ctx.db();
    let mut repo = SqliteTermRepository::try_new(&mut guard)?;
    repo.create_term(&term, curator(headers).as_deref())?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "data": term_payload(&term, &[]) })),
    ))
}

async fn list_terms(
    State(ctx): State<ApiContext>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Value>> {
    list_payload(&ctx, None, &params)
}

async fn create_term(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
    Json(request): Json<CreateTermRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    create_with_kind(&ctx, &headers, &request, None)
}

async fn get_term(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Query(params): Query<IncludeParams>,
) -> ApiResult<Json<Value>> {
    item_payload(&ctx, id, None, params.include.as_deref())
}

async fn update_term(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<UpdateTermRequest>,
) -> ApiResult<Json<Value>> {
    let mut guard = ctx.db();
    let mut repo = SqliteTermRepository::try_new(&mut guard)?;

    let mut term = load_expected(&repo, id, None)?;
    apply_term_update(&mut term, &request);
    repo.update_term(&term, curator(&headers).as_deref())?;

    let synonym_ids: Vec<SynonymId> = repo
        .synonyms_of(id)?
        .iter()
        .map(|synonym| synonym.uuid)
        .collect();
    Ok(Json(json!({ "data": term_payload(&term, &synonym_ids) })))
}

async fn delete_term(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let mut guard = ctx.db();
    let mut repo = SqliteTermRepository::try_new(&mut guard)?;
    repo.delete_term(id, curator(&headers).as_deref())?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct SynonymSetRequest {
    synonyms: Vec<Uuid>,
}

async fn set_synonyms(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<SynonymSetRequest>,
) -> ApiResult<Json<Value>> {
    let mut guard = ctx.db();
    let mut repo = SqliteTermRepository::try_new(&mut guard)?;
    repo.set_synonyms(id, &request.synonyms, curator(&headers).as_deref())?;

    let term = load_expected(&repo, id, None)?;
    let synonym_ids: Vec<SynonymId> = repo
        .synonyms_of(id)?
        .iter()
        .map(|synonym| synonym.uuid)
        .collect();
    Ok(Json(json!({ "data": term_payload(&term, &synonym_ids) })))
}
