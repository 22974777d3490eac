//! `/diseases` endpoints: the richest resource, with inheritance, gene and
//! phenotype associations and epidemiology resolved as relationship ids, and
//! `PUT` sub-resources for the plain many-to-many sets.

use crate::error::ApiResult;
use crate::routes::associations::{
    gene_association_payload, phenotype_association_payload,
};
use crate::routes::prevalences::prevalence_payload;
use crate::routes::terms::{
    apply_term_update, create_with_kind, load_expected, synonym_payload, term_payload,
    CreateTermRequest, ListParams, UpdateTermRequest,
};
use crate::routes::{curator, includes};
use crate::state::ApiContext;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, put};
use axum::{Json, Router};
use gardrail_core::{
    AssociationRepository, GeneAssociationQuery, PhenotypeAssociationQuery,
    PrevalenceRepository, SqliteAssociationRepository, SqlitePrevalenceRepository,
    SqliteTermRepository, SynonymId, Term, TermKind, TermRepository,
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

const RELATION_PAGE_MAX: u32 = 200;

#[derive(Debug, Deserialize)]
struct IncludeParams {
    include: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SynonymSetRequest {
    synonyms: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
struct InheritanceSetRequest {
    inheritance: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
struct EpidemiologySetRequest {
    epidemiology: Vec<Uuid>,
}

pub fn router() -> Router<ApiContext> {
    Router::new()
        .route("/", get(list_diseases).post(create_disease))
        .route(
            "/{id}",
            get(get_disease).patch(update_disease).delete(delete_disease),
        )
        .route("/{id}/synonyms", put(set_synonyms))
        .route("/{id}/inheritance", put(set_inheritance))
        .route("/{id}/epidemiology", put(set_epidemiology))
}

struct DiseaseRelations {
    synonym_ids: Vec<SynonymId>,
    inheritance_ids: Vec<Uuid>,
    gene_assoc_ids: Vec<Uuid>,
    phenotype_assoc_ids: Vec<Uuid>,
    epidemiology_ids: Vec<Uuid>,
}

fn load_relations(conn: &mut Connection, disease: Uuid) -> ApiResult<DiseaseRelations> {
    let (synonym_ids, inheritance_ids) = {
        let repo = SqliteTermRepository::try_new(conn)?;
        let synonym_ids = repo
            .synonyms_of(disease)?
            .iter()
            .map(|synonym| synonym.uuid)
            .collect();
        let inheritance_ids = repo
            .inheritance_of(disease)?
            .iter()
            .map(|term| term.uuid)
            .collect();
        (synonym_ids, inheritance_ids)
    };

    let (gene_assoc_ids, phenotype_assoc_ids) = {
        let repo = SqliteAssociationRepository::try_new(conn)?;
        let gene_assoc_ids = repo
            .list_gene_associations(&GeneAssociationQuery {
                disease: Some(disease),
                limit: Some(RELATION_PAGE_MAX),
                ..GeneAssociationQuery::default()
            })?
            .iter()
            .map(|assoc| assoc.uuid)
            .collect();
        let phenotype_assoc_ids = repo
            .list_phenotype_associations(&PhenotypeAssociationQuery {
                disease: Some(disease),
                limit: Some(RELATION_PAGE_MAX),
                ..PhenotypeAssociationQuery::default()
            })?
            .iter()
            .map(|assoc| assoc.uuid)
            .collect();
        (gene_assoc_ids, phenotype_assoc_ids)
    };

    let epidemiology_ids = {
        let repo = SqlitePrevalenceRepository::try_new(conn)?;
        repo.epidemiology_of(disease)?
            .iter()
            .map(|record| record.uuid)
            .collect()
    };

    Ok(DiseaseRelations {
        synonym_ids,
        inheritance_ids,
        gene_assoc_ids,
        phenotype_assoc_ids,
        epidemiology_ids,
    })
}

fn disease_payload(term: &Term, relations: &DiseaseRelations) -> Value {
    let mut payload = term_payload(term, &relations.synonym_ids);
    payload["inheritance"] = json!(relations.inheritance_ids);
    payload["genes"] = json!(relations.gene_assoc_ids);
    payload["phenotypes"] = json!(relations.phenotype_assoc_ids);
    payload["epidemiology"] = json!(relations.epidemiology_ids);
    payload
}

fn disease_body(
    ctx: &ApiContext,
    id: Uuid,
    include: Option<&str>,
) -> ApiResult<Json<Value>> {
    let mut guard = ctx.db();

    let term = {
        let repo = SqliteTermRepository::try_new(&mut guard)?;
        load_expected(&repo, id, Some(TermKind::Disease))?
    };
    let relations = load_relations(&mut guard, id)?;
    let mut body = json!({ "data": disease_payload(&term, &relations) });

    let wanted = includes(include);
    if wanted.contains("synonyms") {
        let repo = SqliteTermRepository::try_new(&mut guard)?;
        body["included"]["synonyms"] = json!(repo
            .synonyms_of(id)?
            .iter()
            .map(synonym_payload)
            .collect::<Vec<_>>());
    }
    if wanted.contains("inheritance") {
        let repo = SqliteTermRepository::try_new(&mut guard)?;
        let mut payloads = Vec::new();
        for pattern in repo.inheritance_of(id)? {
            let synonym_ids: Vec<SynonymId> = repo
                .synonyms_of(pattern.uuid)?
                .iter()
                .map(|synonym| synonym.uuid)
                .collect();
            payloads.push(term_payload(&pattern, &synonym_ids));
        }
        body["included"]["inheritance"] = json!(payloads);
    }
    if wanted.contains("genes") {
        let repo = SqliteAssociationRepository::try_new(&mut guard)?;
        let assocs = repo.list_gene_associations(&GeneAssociationQuery {
            disease: Some(id),
            limit: Some(RELATION_PAGE_MAX),
            ..GeneAssociationQuery::default()
        })?;
        body["included"]["genes"] = json!(assocs
            .iter()
            .map(gene_association_payload)
            .collect::<Vec<_>>());
    }
    if wanted.contains("phenotypes") {
        let repo = SqliteAssociationRepository::try_new(&mut guard)?;
        let assocs = repo.list_phenotype_associations(&PhenotypeAssociationQuery {
            disease: Some(id),
            limit: Some(RELATION_PAGE_MAX),
            ..PhenotypeAssociationQuery::default()
        })?;
        let mut payloads = Vec::with_capacity(assocs.len());
        for assoc in &assocs {
            let frequency = match assoc.frequency {
                Some(frequency_id) => repo.get_frequency(frequency_id)?,
                None => None,
            };
            payloads.push(phenotype_association_payload(assoc, frequency.as_ref()));
        }
        body["included"]["phenotypes"] = json!(payloads);
    }
    if wanted.contains("epidemiology") {
        let repo = SqlitePrevalenceRepository::try_new(&mut guard)?;
        body["included"]["epidemiology"] = json!(repo
            .epidemiology_of(id)?
            .iter()
            .map(prevalence_payload)
            .collect::<Vec<_>>());
    }

    Ok(Json(body))
}

async fn list_diseases(
    State(ctx): State<ApiContext>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Value>> {
    crate::routes::terms::list_payload(&ctx, Some(TermKind::Disease), &params)
}

async fn create_disease(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
    Json(request): Json<CreateTermRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    create_with_kind(&ctx, &headers, &request, Some(TermKind::Disease))
}

async fn get_disease(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Query(params): Query<IncludeParams>,
) -> ApiResult<Json<Value>> {
    disease_body(&ctx, id, params.include.as_deref())
}

async fn update_disease(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<UpdateTermRequest>,
) -> ApiResult<Json<Value>> {
    {
        let mut guard = ctx.db();
        let mut repo = SqliteTermRepository::try_new(&mut guard)?;
        let mut term = load_expected(&repo, id, Some(TermKind::Disease))?;
        apply_term_update(&mut term, &request);
        repo.update_term(&term, curator(&headers).as_deref())?;
    }
    disease_body(&ctx, id, None)
}

async fn delete_disease(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let mut guard = ctx.db();
    let mut repo = SqliteTermRepository::try_new(&mut guard)?;
    load_expected(&repo, id, Some(TermKind::Disease))?;
    repo.delete_term(id, curator(&headers).as_deref())?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_synonyms(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<SynonymSetRequest>,
) -> ApiResult<Json<Value>> {
    {
        let mut guard = ctx.db();
        let mut repo = SqliteTermRepository::try_new(&mut guard)?;
        load_expected(&repo, id, Some(TermKind::Disease))?;
        repo.set_synonyms(id, &request.synonyms, curator(&headers).as_deref())?;
    }
    disease_body(&ctx, id, None)
}

async fn set_inheritance(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<InheritanceSetRequest>,
) -> ApiResult<Json<Value>> {
    {
        let mut guard = ctx.db();
        let mut repo = SqliteTermRepository::try_new(&mut guard)?;
        repo.set_inheritance(id, &request.inheritance, curator(&headers).as_deref())?;
    }
    disease_body(&ctx, id, None)
}

async fn set_epidemiology(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<EpidemiologySetRequest>,
) -> ApiResult<Json<Value>> {
    {
        let mut guard = ctx.db();
        let mut repo = SqlitePrevalenceRepository::try_new(&mut guard)?;
        repo.set_disease_epidemiology(id, &request.epidemiology, curator(&headers).as_deref())?;
    }
    disease_body(&ctx, id, None)
}
