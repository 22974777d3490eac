use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use gardrail_api::{app, ApiContext};
use gardrail_core::db::open_db_in_memory;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_app() -> Router {
    let conn = open_db_in_memory().unwrap();
    app(ApiContext::new(conn))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-curator", "alice");
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_disease(app: &Router, cui: &str, label: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/diseases",
        Some(json!({ "cui": cui, "label": label })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn create_gene(app: &Router, cui: &str, label: &str, symbol: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/genes",
        Some(json!({ "cui": cui, "label": label, "symbol": symbol })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn create_phenotype(app: &Router, cui: &str, label: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/phenotypes",
        Some(json!({ "cui": cui, "label": label })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let app = test_app();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"healthy");
}

#[tokio::test]
async fn disease_crud_round_trip() {
    let app = test_app();
    let id = create_disease(&app, "Orphanet:558", "Marfan syndrome").await;

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/diseases/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cui"], "Orphanet:558");
    assert_eq!(body["data"]["kind"], "disease");
    assert_eq!(body["data"]["genes"], json!([]));

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/v1/diseases/{id}"),
        Some(json!({ "label": "Marfan syndrome, classic" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["label"], "Marfan syndrome, classic");

    // The polymorphic /terms endpoint resolves the same entry.
    let (status, body) = send(&app, Method::GET, &format!("/api/v1/terms/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["kind"], "disease");

    let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/diseases/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &format!("/api/v1/diseases/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_cui_is_a_conflict() {
    let app = test_app();
    create_disease(&app, "Orphanet:558", "Marfan syndrome").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/phenotypes",
        Some(json!({ "cui": "Orphanet:558", "label": "clashing entry" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("Orphanet:558"));
}

#[tokio::test]
async fn malformed_cui_is_unprocessable() {
    let app = test_app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/diseases",
        Some(json!({ "cui": "not a curie", "label": "broken" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn gene_association_lifecycle() {
    let app = test_app();
    let disease = create_disease(&app, "Orphanet:558", "Marfan syndrome").await;
    let gene = create_gene(&app, "HGNC:3603", "fibrillin 1", "FBN1").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/disease_gene_associations",
        Some(json!({
            "disease": disease,
            "gene": gene,
            "assoc_type": "Orphanet_317343",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body["data"]["assoc_type"],
        "disease-causing germline mutation(s) in"
    );
    assert_eq!(body["data"]["status"], "Unknown");
    let assoc_id = body["data"]["id"].as_str().unwrap().to_string();

    // Second association for the same pair: conflict, not a merge.
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/disease_gene_associations",
        Some(json!({
            "disease": disease,
            "gene": gene,
            "assoc_type": "Orphanet_465410",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/v1/disease_gene_associations/{assoc_id}"),
        Some(json!({ "status": "V" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "Validated");

    // Deleting the disease cascades the association but keeps the gene.
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/diseases/{disease}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/disease_gene_associations/{assoc_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, &format!("/api/v1/genes/{gene}"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn association_endpoints_enforce_kinds_and_codes() {
    let app = test_app();
    let disease = create_disease(&app, "Orphanet:558", "Marfan syndrome").await;
    let phenotype = create_phenotype(&app, "HP:0001166", "Arachnodactyly").await;

    // A phenotype is not a gene: referential-integrity failure.
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/disease_gene_associations",
        Some(json!({
            "disease": disease,
            "gene": phenotype,
            "assoc_type": "Orphanet_317343",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Unknown vocabulary codes never reach storage.
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/disease_phenotype_associations",
        Some(json!({
            "disease": disease,
            "phenotype": phenotype,
            "evidence": "GUESSWORK",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Missing endpoints read as not-found.
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/disease_gene_associations",
        Some(json!({
            "disease": disease,
            "gene": "00000000-0000-4000-8000-000000000009",
            "assoc_type": "Orphanet_317343",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn phenotype_association_decodes_frequency() {
    let app = test_app();
    let disease = create_disease(&app, "Orphanet:558", "Marfan syndrome").await;
    let free_text = create_phenotype(&app, "HP:0001166", "Arachnodactyly").await;
    let coded = create_phenotype(&app, "HP:0001083", "Ectopia lentis").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/disease_phenotype_associations",
        Some(json!({
            "disease": disease,
            "phenotype": free_text,
            "evidence": "PCS",
            "frequency": { "other": "2 of 10 families" },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["evidence"], "Published clinical study (PCS)");
    assert_eq!(body["data"]["frequency"]["value"], Value::Null);
    assert_eq!(body["data"]["frequency"]["other"], "2 of 10 families");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/disease_phenotype_associations",
        Some(json!({
            "disease": disease,
            "phenotype": coded,
            "evidence": "IEA",
            "frequency": { "value": "HP:0040282" },
            "onset": "HP:0003577",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body["data"]["frequency"]["value"],
        "Frequent (present in 30% to 79% of the cases)"
    );
    assert_eq!(
        body["data"]["onset"],
        "Congenital onset (present at birth)"
    );
}

#[tokio::test]
async fn disease_synonym_sub_resource_and_include() {
    let app = test_app();
    let disease = create_disease(&app, "Orphanet:558", "Marfan syndrome").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/synonyms",
        Some(json!({ "name": "MFS" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let synonym = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/diseases/{disease}/synonyms"),
        Some(json!({ "synonyms": [synonym] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["synonyms"][0], synonym.as_str());

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/diseases/{disease}?include=synonyms"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["included"]["synonyms"][0]["name"], "MFS");

    // The synonym outlives the disease.
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/diseases/{disease}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &format!("/api/v1/synonyms/{synonym}"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn shared_prevalence_attaches_to_two_diseases() {
    let app = test_app();
    let marfan = create_disease(&app, "Orphanet:558", "Marfan syndrome").await;
    let loeys = create_disease(&app, "Orphanet:60030", "Loeys-Dietz syndrome").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/prevalences",
        Some(json!({ "geo": "Worldwide", "ptype": "P", "pclass": "D" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["ptype_display"], "Point prevalence");
    assert_eq!(body["data"]["pclass_display"], "1-9 / 1 000 000");
    let prevalence = body["data"]["id"].as_str().unwrap().to_string();

    for disease in [&marfan, &loeys] {
        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/diseases/{disease}/epidemiology"),
            Some(json!({ "epidemiology": [prevalence] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/prevalences/{prevalence}?include=diseases"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["included"]["diseases"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_ids_read_as_not_found() {
    let app = test_app();
    for uri in [
        "/api/v1/terms/00000000-0000-4000-8000-000000000001",
        "/api/v1/diseases/00000000-0000-4000-8000-000000000001",
        "/api/v1/synonyms/00000000-0000-4000-8000-000000000001",
        "/api/v1/disease_gene_associations/00000000-0000-4000-8000-000000000001",
        "/api/v1/prevalences/00000000-0000-4000-8000-000000000001",
    ] {
        let (status, _) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "expected 404 for {uri}");
    }
}

#[tokio::test]
async fn gene_include_diseases_side_loads_associations() {
    let app = test_app();
    let disease = create_disease(&app, "Orphanet:558", "Marfan syndrome").await;
    let gene = create_gene(&app, "HGNC:3603", "fibrillin 1", "FBN1").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/disease_gene_associations",
        Some(json!({
            "disease": disease,
            "gene": gene,
            "assoc_type": "Orphanet_317343",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/genes/{gene}?include=diseases"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let included = body["included"]["diseases"].as_array().unwrap();
    assert_eq!(included.len(), 1);
    assert_eq!(included[0]["disease"], disease.as_str());
}
