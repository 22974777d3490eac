//! `/disease_gene_associations` and `/disease_phenotype_associations`
//! endpoints.
//!
//! Requests carry raw vocabulary codes; responses decode `status`,
//! `assoc_type`, `evidence`, `onset` and `aspect` to their labels and render
//! the frequency annotation as `{value: label|null, other}`.

use crate::error::{ApiError, ApiResult};
use crate::routes::{curator, includes};
use crate::state::ApiContext;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, put};
use axum::{Json, Router};
use gardrail_core::{
    AssociationRepository, DiseaseGeneAssociation, DiseasePhenotypeAssociation, Frequency,
    GeneAssociationQuery, PhenotypeAssociationQuery, RepoError, SqliteAssociationRepository,
};
use gardrail_core::vocab::{
    Aspect, Evidence, FrequencyBand, GeneAssociationType, Onset, RelationStatus, Sex,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct ListParams {
    disease: Option<Uuid>,
    gene: Option<Uuid>,
    phenotype: Option<Uuid>,
    status: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct IncludeParams {
    include: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeneAssociationRequest {
    disease: Uuid,
    gene: Uuid,
    assoc_type: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    comments: Option<String>,
    #[serde(default)]
    references: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize, Default)]
struct GeneAssociationPatch {
    #[serde(default)]
    assoc_type: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    comments: Option<String>,
    #[serde(default)]
    references: Option<Vec<Uuid>>,
}

/// Inline frequency annotation: a coded band, free text, or both.
#[derive(Debug, Deserialize)]
struct FrequencyRequest {
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    other: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PhenotypeAssociationRequest {
    disease: Uuid,
    phenotype: Uuid,
    evidence: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    comments: Option<String>,
    #[serde(default)]
    frequency: Option<FrequencyRequest>,
    #[serde(default)]
    onset: Option<String>,
    #[serde(default)]
    sex: Option<String>,
    #[serde(default)]
    modifier: Option<Uuid>,
    #[serde(default)]
    aspect: Option<String>,
    #[serde(default)]
    references: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize, Default)]
struct PhenotypeAssociationPatch {
    #[serde(default)]
    evidence: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    comments: Option<String>,
    #[serde(default)]
    frequency: Option<FrequencyRequest>,
    #[serde(default)]
    onset: Option<String>,
    #[serde(default)]
    sex: Option<String>,
    #[serde(default)]
    modifier: Option<Uuid>,
    #[serde(default)]
    aspect: Option<String>,
    #[serde(default)]
    references: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize)]
struct ReferencesRequest {
    references: Vec<Uuid>,
}

pub fn gene_router() -> Router<ApiContext> {
    Router::new()
        .route("/", get(list_gene_assocs).post(create_gene_assoc))
        .route(
            "/{id}",
            get(get_gene_assoc)
                .patch(update_gene_assoc)
                .delete(delete_gene_assoc),
        )
        .route("/{id}/references", put(set_gene_assoc_references))
}

pub fn phenotype_router() -> Router<ApiContext> {
    Router::new()
        .route("/", get(list_phenotype_assocs).post(create_phenotype_assoc))
        .route(
            "/{id}",
            get(get_phenotype_assoc)
                .patch(update_phenotype_assoc)
                .delete(delete_phenotype_assoc),
        )
        .route("/{id}/references", put(set_phenotype_assoc_references))
}

/// Gene association resource payload (decoded status and type).
pub(crate) fn gene_association_payload(assoc: &DiseaseGeneAssociation) -> Value {
    json!({
        "id": assoc.uuid,
        "name": assoc.name,
        "status": assoc.status.label(),
        "disease": assoc.disease,
        "gene": assoc.gene,
        "assoc_type": assoc.assoc_type.label(),
        "comments": assoc.comments,
        "references": assoc.references,
    })
}

/// Phenotype association resource payload. `created_by`/`modified_by` and the
/// internal name are not exposed.
pub(crate) fn phenotype_association_payload(
    assoc: &DiseasePhenotypeAssociation,
    frequency: Option<&Frequency>,
) -> Value {
    json!({
        "id": assoc.uuid,
        "status": assoc.status.label(),
        "disease": assoc.disease,
        "phenotype": assoc.phenotype,
        "evidence": assoc.evidence.label(),
        "frequency": frequency.map(|record| json!({
            "id": record.uuid,
            "value": record.value.map(FrequencyBand::label),
            "other": record.other,
        })),
        "onset": assoc.onset.map(Onset::label),
        "sex": assoc.sex.map(Sex::code),
        "modifier": assoc.modifier,
        "aspect": assoc.aspect.label(),
        "comments": assoc.comments,
        "references": assoc.references,
    })
}

fn parse_code<T>(
    parse: impl Fn(&str) -> Option<T>,
    code: &str,
    what: &str,
) -> ApiResult<T> {
    parse(code).ok_or_else(|| ApiError::Invalid(format!("unknown {what} code `{code}`")))
}

/// Resolves an inline frequency request to a stored record, reusing an
/// existing row with the same encoding.
fn resolve_frequency(
    repo: &SqliteAssociationRepository<'_>,
    request: &FrequencyRequest,
) -> ApiResult<Frequency> {
    let value = match request.value.as_deref() {
        Some(code) => Some(parse_code(FrequencyBand::parse, code, "frequency")?),
        None => None,
    };
    let other = request.other.clone();

    if let Some(existing) = repo.find_frequency(value, other.as_deref())? {
        return Ok(existing);
    }
    let frequency = Frequency::new(value, other);
    repo.create_frequency(&frequency)?;
    Ok(frequency)
}

async fn list_gene_assocs(
    State(ctx): State<ApiContext>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Value>> {
    let status = match params.status.as_deref() {
        Some(code) => Some(parse_code(RelationStatus::parse, code, "status")?),
        None => None,
    };

    let mut guard = ctx.db();
    let repo = SqliteAssociationRepository::try_new(&mut guard)?;
    let assocs = repo.list_gene_associations(&GeneAssociationQuery {
        disease: params.disease,
        gene: params.gene,
        status,
        limit: params.limit,
        offset: params.offset.unwrap_or(0),
    })?;
    Ok(Json(json!({
        "data": assocs.iter().map(gene_association_payload).collect::<Vec<_>>(),
    })))
}

async fn create_gene_assoc(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
    Json(request): Json<GeneAssociationRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut assoc = DiseaseGeneAssociation::new(
        request.disease,
        request.gene,
        parse_code(GeneAssociationType::parse, &request.assoc_type, "assoc_type")?,
    );
    if let Some(code) = request.status.as_deref() {
        assoc.status = parse_code(RelationStatus::parse, code, "status")?;
    }
    assoc.comments = request.comments;
    assoc.references = request.references.unwrap_or_default();
    assoc.created_by = curator(&headers);

    let mut guard = ctx.db();
    let mut repo = SqliteAssociationRepository::try_new(&mut guard)?;
    repo.create_gene_association(&assoc)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "data": gene_association_payload(&assoc) })),
    ))
}

async fn get_gene_assoc(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Query(params): Query<IncludeParams>,
) -> ApiResult<Json<Value>> {
    let mut guard = ctx.db();
    let repo = SqliteAssociationRepository::try_new(&mut guard)?;
    let assoc = repo
        .get_gene_association(id)?
        .ok_or(ApiError::Repo(RepoError::AssociationNotFound(id)))?;

    let mut body = json!({ "data": gene_association_payload(&assoc) });
    if includes(params.include.as_deref()).contains("diseases") {
        body["included"]["diseases"] = json!(repo.disease_links_for_gene(assoc.gene)?);
    }
    Ok(Json(body))
}

async fn update_gene_assoc(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(patch): Json<GeneAssociationPatch>,
) -> ApiResult<Json<Value>> {
    let mut guard = ctx.db();
    let mut repo = SqliteAssociationRepository::try_new(&mut guard)?;

    let mut assoc = repo
        .get_gene_association(id)?
        .ok_or(ApiError::Repo(RepoError::AssociationNotFound(id)))?;
    if let Some(code) = patch.assoc_type.as_deref() {
        assoc.assoc_type = parse_code(GeneAssociationType::parse, code, "assoc_type")?;
    }
    if let Some(code) = patch.status.as_deref() {
        assoc.status = parse_code(RelationStatus::parse, code, "status")?;
    }
    if patch.comments.is_some() {
        assoc.comments = patch.comments;
    }
    if let Some(references) = patch.references {
        assoc.references = references;
    }
    assoc.modified_by = curator(&headers);

    repo.update_gene_association(&assoc)?;
    Ok(Json(json!({ "data": gene_association_payload(&assoc) })))
}

async fn delete_gene_assoc(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let mut guard = ctx.db();
    let mut repo = SqliteAssociationRepository::try_new(&mut guard)?;
    repo.delete_gene_association(id, curator(&headers).as_deref())?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_gene_assoc_references(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<ReferencesRequest>,
) -> ApiResult<Json<Value>> {
    let mut guard = ctx.db();
    let mut repo = SqliteAssociationRepository::try_new(&mut guard)?;
    repo.set_gene_association_references(id, &request.references, curator(&headers).as_deref())?;
    let assoc = repo
        .get_gene_association(id)?
        .ok_or(ApiError::Repo(RepoError::AssociationNotFound(id)))?;
    Ok(Json(json!({ "data": gene_association_payload(&assoc) })))
}

async fn list_phenotype_assocs(
    State(ctx): State<ApiContext>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Value>> {
    let status = match params.status.as_deref() {
        Some(code) => Some(parse_code(RelationStatus::parse, code, "status")?),
        None => None,
    };

    let mut guard = ctx.db();
    let repo = SqliteAssociationRepository::try_new(&mut guard)?;
    let assocs = repo.list_phenotype_associations(&PhenotypeAssociationQuery {
        disease: params.disease,
        phenotype: params.phenotype,
        status,
        limit: params.limit,
        offset: params.offset.unwrap_or(0),
    })?;

    let mut data = Vec::with_capacity(assocs.len());
    for assoc in &assocs {
        let frequency = match assoc.frequency {
            Some(frequency_id) => repo.get_frequency(frequency_id)?,
            None => None,
        };
        data.push(phenotype_association_payload(assoc, frequency.as_ref()));
    }
    Ok(Json(json!({ "data": data })))
}

async fn create_phenotype_assoc(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
    Json(request): Json<PhenotypeAssociationRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut guard = ctx.db();
    let mut repo = SqliteAssociationRepository::try_new(&mut guard)?;

    let mut assoc = DiseasePhenotypeAssociation::new(
        request.disease,
        request.phenotype,
        parse_code(Evidence::parse, &request.evidence, "evidence")?,
    );
    if let Some(code) = request.status.as_deref() {
        assoc.status = parse_code(RelationStatus::parse, code, "status")?;
    }
    if let Some(code) = request.onset.as_deref() {
        assoc.onset = Some(parse_code(Onset::parse, code, "onset")?);
    }
    if let Some(code) = request.sex.as_deref() {
        assoc.sex = Some(parse_code(Sex::parse, code, "sex")?);
    }
    if let Some(code) = request.aspect.as_deref() {
        assoc.aspect = parse_code(Aspect::parse, code, "aspect")?;
    }
    assoc.comments = request.comments;
    assoc.modifier = request.modifier;
    assoc.references = request.references.unwrap_or_default();
    assoc.created_by = curator(&headers);

    let frequency = match &request.frequency {
        Some(freq_request) => Some(resolve_frequency(&repo, freq_request)?),
        None => None,
    };
    assoc.frequency = frequency.as_ref().map(|record| record.uuid);

    repo.create_phenotype_association(&assoc)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "data": phenotype_association_payload(&assoc, frequency.as_ref()),
        })),
    ))
}

async fn get_phenotype_assoc(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Query(params): Query<IncludeParams>,
) -> ApiResult<Json<Value>> {
    let mut guard = ctx.db();
    let repo = SqliteAssociationRepository::try_new(&mut guard)?;
    let assoc = repo
        .get_phenotype_association(id)?
        .ok_or(ApiError::Repo(RepoError::AssociationNotFound(id)))?;
    let frequency = match assoc.frequency {
        Some(frequency_id) => repo.get_frequency(frequency_id)?,
        None => None,
    };

    let mut body = json!({
        "data": phenotype_association_payload(&assoc, frequency.as_ref()),
    });
    if includes(params.include.as_deref()).contains("diseases") {
        body["included"]["diseases"] =
            json!(repo.disease_links_for_phenotype(assoc.phenotype)?);
    }
    Ok(Json(body))
}

async fn update_phenotype_assoc(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(patch): Json<PhenotypeAssociationPatch>,
) -> ApiResult<Json<Value>> {
    let mut guard = ctx.db();
    let mut repo = SqliteAssociationRepository::try_new(&mut guard)?;

    let mut assoc = repo
        .get_phenotype_association(id)?
        .ok_or(ApiError::Repo(RepoError::AssociationNotFound(id)))?;
    if let Some(code) = patch.evidence.as_deref() {
        assoc.evidence = parse_code(Evidence::parse, code, "evidence")?;
    }
    if let Some(code) = patch.status.as_deref() {
        assoc.status = parse_code(RelationStatus::parse, code, "status")?;
    }
    if let Some(code) = patch.onset.as_deref() {
        assoc.onset = Some(parse_code(Onset::parse, code, "onset")?);
    }
    if let Some(code) = patch.sex.as_deref() {
        assoc.sex = Some(parse_code(Sex::parse, code, "sex")?);
    }
    if let Some(code) = patch.aspect.as_deref() {
        assoc.aspect = parse_code(Aspect::parse, code, "aspect")?;
    }
    if patch.comments.is_some() {
        assoc.comments = patch.comments;
    }
    if patch.modifier.is_some() {
        assoc.modifier = patch.modifier;
    }
    if let Some(references) = patch.references {
        assoc.references = references;
    }
    let frequency = match &patch.frequency {
        Some(freq_request) => {
            let record = resolve_frequency(&repo, freq_request)?;
            assoc.frequency = Some(record.uuid);
            Some(record)
        }
        None => match assoc.frequency {
            Some(frequency_id) => repo.get_frequency(frequency_id)?,
            None => None,
        },
    };
    assoc.modified_by = curator(&headers);

    repo.update_phenotype_association(&assoc)?;
    Ok(Json(json!({
        "data": phenotype_association_payload(&assoc, frequency.as_ref()),
    })))
}

async fn delete_phenotype_assoc(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let mut guard = ctx.db();
    let mut repo = SqliteAssociationRepository::try_new(&mut guard)?;
    repo.delete_phenotype_association(id, curator(&headers).as_deref())?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_phenotype_assoc_references(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<ReferencesRequest>,
) -> ApiResult<Json<Value>> {
    let mut guard = ctx.db();
    let mut repo = SqliteAssociationRepository::try_new(&mut guard)?;
    repo.set_phenotype_association_references(
        id,
        &request.references,
        curator(&headers).as_deref(),
    )?;
    let assoc = repo
        .get_phenotype_association(id)?
        .ok_or(ApiError::Repo(RepoError::AssociationNotFound(id)))?;
    let frequency = match assoc.frequency {
        Some(frequency_id) => repo.get_frequency(frequency_id)?,
        None => None,
    };
    Ok(Json(json!({
        "data": phenotype_association_payload(&assoc, frequency.as_ref()),
    })))
}
