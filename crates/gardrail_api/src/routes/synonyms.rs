//! `/synonyms` endpoints.

use crate::error::{ApiError, ApiResult};
use crate::routes::includes;
use crate::routes::terms::{synonym_payload, term_payload};
use crate::state::ApiContext;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use gardrail_core::{
    RepoError, SqliteSynonymRepository, SqliteTermRepository, Synonym, SynonymId,
    SynonymListQuery, SynonymRepository, TermRepository,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct ListParams {
    name: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct IncludeParams {
    include: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SynonymRequest {
    name: String,
}

pub fn router() -> Router<ApiContext> {
    Router::new()
        .route("/", get(list_synonyms).post(create_synonym))
        .route(
            "/{id}",
            get(get_synonym).patch(rename_synonym).delete(delete_synonym),
        )
}

async fn list_synonyms(
    State(ctx): State<ApiContext>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Value>> {
    let guard = ctx.db();
    let repo = SqliteSynonymRepository::try_new(&guard)?;
    let synonyms = repo.list_synonyms(&SynonymListQuery {
        name_prefix: params.name,
        limit: params.limit,
        offset: params.offset.unwrap_or(0),
    })?;
    Ok(Json(json!({
        "data": synonyms.iter().map(synonym_payload).collect::<Vec<_>>(),
    })))
}

async fn create_synonym(
    State(ctx): State<ApiContext>,
    Json(request): Json<SynonymRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let synonym = Synonym::new(request.name);
    let guard = ctx.db();
    let repo = SqliteSynonymRepository::try_new(&guard)?;
    repo.create_synonym(&synonym)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "data": synonym_payload(&synonym) })),
    ))
}

async fn get_synonym(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Query(params): Query<IncludeParams>,
) -> ApiResult<Json<Value>> {
    let synonym = {
        let guard = ctx.db();
        let repo = SqliteSynonymRepository::try_new(&guard)?;
        repo.get_synonym(id)?
            .ok_or(ApiError::Repo(RepoError::SynonymNotFound(id)))?
    };

    let mut body = json!({ "data": synonym_payload(&synonym) });
    if includes(params.include.as_deref()).contains("terms") {
        let mut guard = ctx.db();
        let repo = SqliteTermRepository::try_new(&mut guard)?;
        let terms = repo.terms_with_synonym(id)?;
        let mut payloads = Vec::with_capacity(terms.len());
        for term in &terms {
            let synonym_ids: Vec<SynonymId> = repo
                .synonyms_of(term.uuid)?
                .iter()
                .map(|synonym| synonym.uuid)
                .collect();
            payloads.push(term_payload(term, &synonym_ids));
        }
        body["included"] = json!({ "terms": payloads });
    }
    Ok(Json(body))
}

async fn rename_synonym(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<SynonymRequest>,
) -> ApiResult<Json<Value>> {
    let guard = ctx.db();
    let repo = SqliteSynonymRepository::try_new(&guard)?;
    repo.rename_synonym(id, &request.name)?;
    let synonym = repo
        .get_synonym(id)?
        .ok_or(ApiError::Repo(RepoError::SynonymNotFound(id)))?;
    Ok(Json(json!({ "data": synonym_payload(&synonym) })))
}

async fn delete_synonym(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let guard = ctx.db();
    let repo = SqliteSynonymRepository::try_new(&guard)?;
    repo.delete_synonym(id)?;
    Ok(StatusCode::NO_CONTENT)
}
