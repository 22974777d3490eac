//! `/prevalences` endpoints.
//!
//! Payloads expose the raw persisted codes alongside decoded `*_display`
//! labels for the four coded dimensions.

use crate::error::{ApiError, ApiResult};
use crate::routes::includes;
use crate::state::ApiContext;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use gardrail_core::vocab::{
    PrevalenceClass, PrevalenceQualification, PrevalenceStatus, PrevalenceType,
};
use gardrail_core::{
    Prevalence, PrevalenceListQuery, PrevalenceRepository, RepoError,
    SqlitePrevalenceRepository,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct ListParams {
    status: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct IncludeParams {
    include: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatePrevalenceRequest {
    geo: String,
    #[serde(default)]
    ptype: Option<String>,
    #[serde(default)]
    pqual: Option<String>,
    #[serde(default)]
    pclass: Option<String>,
    #[serde(default)]
    valmoy: Option<f64>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct UpdatePrevalenceRequest {
    #[serde(default)]
    geo: Option<String>,
    #[serde(default)]
    ptype: Option<String>,
    #[serde(default)]
    pqual: Option<String>,
    #[serde(default)]
    pclass: Option<String>,
    #[serde(default)]
    valmoy: Option<f64>,
    #[serde(default)]
    status: Option<String>,
}

pub fn router() -> Router<ApiContext> {
    Router::new()
        .route("/", get(list_prevalences).post(create_prevalence))
        .route(
            "/{id}",
            get(get_prevalence)
                .patch(update_prevalence)
                .delete(delete_prevalence),
        )
}

/// Prevalence resource payload: raw codes plus decoded labels.
pub(crate) fn prevalence_payload(record: &Prevalence) -> Value {
    json!({
        "id": record.uuid,
        "ptype": record.ptype.code(),
        "ptype_display": record.ptype.label(),
        "pqual": record.pqual.code(),
        "pqual_display": record.pqual.label(),
        "pclass": record.pclass.code(),
        "pclass_display": record.pclass.label(),
        "valmoy": record.valmoy,
        "geo": record.geo,
        "status": record.status.code(),
        "status_display": record.status.label(),
    })
}

fn parse_code<T>(parse: impl Fn(&str) -> Option<T>, code: &str, what: &str) -> ApiResult<T> {
    parse(code).ok_or_else(|| ApiError::Invalid(format!("unknown {what} code `{code}`")))
}

async fn list_prevalences(
    State(ctx): State<ApiContext>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Value>> {
    let status = match params.status.as_deref() {
        Some(code) => Some(parse_code(PrevalenceStatus::parse, code, "status")?),
        None => None,
    };

    let mut guard = ctx.db();
    let repo = SqlitePrevalenceRepository::try_new(&mut guard)?;
    let records = repo.list_prevalences(&PrevalenceListQuery {
        status,
        limit: params.limit,
        offset: params.offset.unwrap_or(0),
    })?;
    Ok(Json(json!({
        "data": records.iter().map(prevalence_payload).collect::<Vec<_>>(),
    })))
}

async fn create_prevalence(
    State(ctx): State<ApiContext>,
    Json(request): Json<CreatePrevalenceRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut record = Prevalence::new(request.geo);
    if let Some(code) = request.ptype.as_deref() {
        record.ptype = parse_code(PrevalenceType::parse, code, "ptype")?;
    }
    if let Some(code) = request.pqual.as_deref() {
        record.pqual = parse_code(PrevalenceQualification::parse, code, "pqual")?;
    }
    if let Some(code) = request.pclass.as_deref() {
        record.pclass = parse_code(PrevalenceClass::parse, code, "pclass")?;
    }
    if let Some(code) = request.status.as_deref() {
        record.status = parse_code(PrevalenceStatus::parse, code, "status")?;
    }
    record.valmoy = request.valmoy;

    let mut guard = ctx.db();
    let repo = SqlitePrevalenceRepository::try_new(&mut guard)?;
    repo.create_prevalence(&record)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "data": prevalence_payload(&record) })),
    ))
}

async fn get_prevalence(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Query(params): Query<IncludeParams>,
) -> ApiResult<Json<Value>> {
    let mut guard = ctx.db();
    let repo = SqlitePrevalenceRepository::try_new(&mut guard)?;
    let record = repo
        .get_prevalence(id)?
        .ok_or(ApiError::Repo(RepoError::PrevalenceNotFound(id)))?;

    let mut body = json!({ "data": prevalence_payload(&record) });
    if includes(params.include.as_deref()).contains("diseases") {
        body["included"]["diseases"] = json!(repo.disease_links_with_prevalence(id)?);
    }
    Ok(Json(body))
}

async fn update_prevalence(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePrevalenceRequest>,
) -> ApiResult<Json<Value>> {
    let mut guard = ctx.db();
    let repo = SqlitePrevalenceRepository::try_new(&mut guard)?;

    let mut record = repo
        .get_prevalence(id)?
        .ok_or(ApiError::Repo(RepoError::PrevalenceNotFound(id)))?;
    if let Some(geo) = request.geo {
        record.geo = geo;
    }
    if let Some(code) = request.ptype.as_deref() {
        record.ptype = parse_code(PrevalenceType::parse, code, "ptype")?;
    }
    if let Some(code) = request.pqual.as_deref() {
        record.pqual = parse_code(PrevalenceQualification::parse, code, "pqual")?;
    }
    if let Some(code) = request.pclass.as_deref() {
        record.pclass = parse_code(PrevalenceClass::parse, code, "pclass")?;
    }
    if let Some(code) = request.status.as_deref() {
        record.status = parse_code(PrevalenceStatus::parse, code, "status")?;
    }
    if request.valmoy.is_some() {
        record.valmoy = request.valmoy;
    }

    repo.update_prevalence(&record)?;
    Ok(Json(json!({ "data": prevalence_payload(&record) })))
}

async fn delete_prevalence(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let mut guard = ctx.db();
    let repo = SqlitePrevalenceRepository::try_new(&mut guard)?;
    repo.delete_prevalence(id)?;
    Ok(StatusCode::NO_CONTENT)
}
