//! API Integration Tests
//!
//! Author: hephaex@gmail.com

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use biorex_api::{create_router, create_router_for_testing, create_router_with_gateway, state::AppState};
use biorex_core::config::AppConfig;
use biorex_extractor::DemoGateway;
use futures::StreamExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Helper to create a test request
fn create_json_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");

    match body {
        Some(json_body) => builder
            .body(Body::from(serde_json::to_string(&json_body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

async fn open_session(app: &Router) -> String {
    let (status, json) = send(app, create_json_request("POST", "/api/v1/sessions", None)).await;
    assert_eq!(status, StatusCode::CREATED);
    json["session_id"].as_str().unwrap().to_string()
}

/// Poll the history until the newest entry has left the processing state
async fn wait_until_idle(app: &Router, session: &str) -> Value {
    let uri = format!("/api/v1/sessions/{session}/history");
    for _ in 0..200 {
        let (status, json) = send(app, create_json_request("GET", &uri, None)).await;
        assert_eq!(status, StatusCode::OK);
        if json["busy"] == false {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("extraction did not finish");
}

// =============================================================================
// Health Check Tests
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = create_router_for_testing();

    let (status, json) = send(&app, create_json_request("GET", "/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "biorex-api");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_readiness_check() {
    let app = create_router_for_testing();

    let (status, json) = send(&app, create_json_request("GET", "/ready", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ready"], true);
    assert_eq!(json["gateway"], "demo");
}

#[tokio::test]
async fn test_readiness_reports_shutdown() {
    let state = Arc::new(AppState::new(
        AppConfig::default(),
        Arc::new(DemoGateway::instant()),
    ));
    let app = create_router(Arc::clone(&state));

    state.set_ready(false);
    let (status, json) = send(&app, create_json_request("GET", "/ready", None)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["ready"], false);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = create_router_for_testing();
    open_session(&app).await;

    let (status, json) = send(&app, create_json_request("GET", "/metrics", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["uptime_seconds"].is_number());
    assert!(json["total_requests"].is_number());
    assert_eq!(json["active_sessions"], 1);
}

// =============================================================================
// Session API Tests
// =============================================================================

#[tokio::test]
async fn test_list_categories() {
    let app = create_router_for_testing();

    let (status, json) = send(&app, create_json_request("GET", "/api/v1/categories", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["categories"],
        json!(["Genes", "Proteins", "Diseases", "Drugs", "Tissues"])
    );
}

#[tokio::test]
async fn test_submit_and_read_filtered_history() {
    let app = create_router_for_testing();
    let session = open_session(&app).await;

    let (status, json) = send(
        &app,
        create_json_request(
            "POST",
            &format!("/api/v1/sessions/{session}/submissions"),
            Some(json!({ "text": "GeneA interacts with ProteinB.", "categories": ["Genes"] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["record_id"], 0);
    assert_eq!(json["status"], "pending");

    let history = wait_until_idle(&app, &session).await;
    let entries = history["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);

    let entry = &entries[0];
    assert_eq!(entry["status"], "relations");
    assert_eq!(entry["selected_entities"], "Genes");
    let rows = entry["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["index"], 1);
    assert_eq!(rows[0]["entity_1"], "GeneA");
    assert_eq!(rows[0]["relation_type"], "interacts with");
    assert_eq!(rows[1]["entity_2"], "TissueY");
}

#[tokio::test]
async fn test_submit_without_categories_shows_all() {
    let app = create_router_for_testing();
    let session = open_session(&app).await;

    let (status, _) = send(
        &app,
        create_json_request(
            "POST",
            &format!("/api/v1/sessions/{session}/submissions"),
            Some(json!({ "text": "DrugX treats DiseaseY." })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let history = wait_until_idle(&app, &session).await;
    let entry = &history["entries"][0];
    assert_eq!(entry["selected_entities"], "All");
    assert_eq!(entry["rows"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_no_matches_entry() {
    let app = create_router_for_testing();
    let session = open_session(&app).await;

    send(
        &app,
        create_json_request(
            "POST",
            &format!("/api/v1/sessions/{session}/submissions"),
            Some(json!({ "text": "Some passage.", "categories": ["Pathways"] })),
        ),
    )
    .await;

    let history = wait_until_idle(&app, &session).await;
    let entry = &history["entries"][0];
    assert_eq!(entry["status"], "no_matches");
    assert!(entry["rows"].as_array().unwrap().is_empty());
    assert!(entry["message"].is_string());
}

#[tokio::test]
async fn test_history_is_newest_first() {
    let app = create_router_for_testing();
    let session = open_session(&app).await;
    let uri = format!("/api/v1/sessions/{session}/submissions");

    for text in ["first passage", "second passage"] {
        let (status, _) = send(
            &app,
            create_json_request("POST", &uri, Some(json!({ "text": text }))),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        wait_until_idle(&app, &session).await;
    }

    let history = wait_until_idle(&app, &session).await;
    let entries = history["entries"].as_array().unwrap();
    assert_eq!(entries[0]["input_text"], "second passage");
    assert_eq!(entries[0]["record_id"], 1);
    assert_eq!(entries[1]["input_text"], "first passage");
}

#[tokio::test]
async fn test_submit_empty_text() {
    let app = create_router_for_testing();
    let session = open_session(&app).await;

    let (status, json) = send(
        &app,
        create_json_request(
            "POST",
            &format!("/api/v1/sessions/{session}/submissions"),
            Some(json!({ "text": "   " })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");

    let history = wait_until_idle(&app, &session).await;
    assert!(history["entries"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_submit_while_busy() {
    let app = create_router_with_gateway(Arc::new(DemoGateway::new(Duration::from_millis(300))));
    let session = open_session(&app).await;
    let uri = format!("/api/v1/sessions/{session}/submissions");

    let (first, _) = send(
        &app,
        create_json_request("POST", &uri, Some(json!({ "text": "first" }))),
    )
    .await;
    assert_eq!(first, StatusCode::ACCEPTED);

    let (second, json) = send(
        &app,
        create_json_request("POST", &uri, Some(json!({ "text": "second" }))),
    )
    .await;
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(json["code"], "BUSY");

    let (_, history) = send(
        &app,
        create_json_request("GET", &format!("/api/v1/sessions/{session}/history"), None),
    )
    .await;
    assert_eq!(history["busy"], true);
    assert_eq!(history["entries"][0]["status"], "processing");
    assert_eq!(history["entries"].as_array().unwrap().len(), 1);

    let history = wait_until_idle(&app, &session).await;
    assert_eq!(history["entries"][0]["status"], "relations");
}

#[tokio::test]
async fn test_get_record() {
    let app = create_router_for_testing();
    let session = open_session(&app).await;

    send(
        &app,
        create_json_request(
            "POST",
            &format!("/api/v1/sessions/{session}/submissions"),
            Some(json!({ "text": "ProteinC and DiseaseZ", "categories": ["Diseases"] })),
        ),
    )
    .await;
    wait_until_idle(&app, &session).await;

    let (status, json) = send(
        &app,
        create_json_request("GET", &format!("/api/v1/sessions/{session}/records/0"), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "resolved");
    assert_eq!(json["selected_categories"], json!(["Diseases"]));
    assert_eq!(json["triples"].as_array().unwrap().len(), 5);
    assert_eq!(json["filtered_triples"].as_array().unwrap().len(), 2);
    assert!(json["completed_at"].is_string());

    let (status, _) = send(
        &app,
        create_json_request("GET", &format!("/api/v1/sessions/{session}/records/7"), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_session() {
    let app = create_router_for_testing();
    let missing = uuid::Uuid::new_v4();

    let (status, json) = send(
        &app,
        create_json_request("GET", &format!("/api/v1/sessions/{missing}/history"), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");

    let (status, _) = send(
        &app,
        create_json_request(
            "POST",
            &format!("/api/v1/sessions/{missing}/submissions"),
            Some(json!({ "text": "GeneA" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_end_session() {
    let app = create_router_for_testing();
    let session = open_session(&app).await;
    let uri = format!("/api/v1/sessions/{session}");

    let (status, _) = send(&app, create_json_request("DELETE", &uri, None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, create_json_request("DELETE", &uri, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_openapi_document() {
    let app = create_router_for_testing();

    let (status, json) = send(&app, create_json_request("GET", "/api-docs/openapi.json", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/api/v1/sessions/{id}/submissions"].is_object());
    assert!(json["components"]["schemas"]["HealthResponse"].is_object());
    assert!(
        json["paths"]["/health"]["get"]["responses"]["200"]["content"]["application/json"]
            .is_object()
    );
}

// =============================================================================
// Event Stream Tests
// =============================================================================

#[tokio::test]
async fn test_event_stream_reports_submission_and_completion() {
    let app = create_router_for_testing();
    let session = open_session(&app).await;

    let response = app
        .clone()
        .oneshot(create_json_request(
            "GET",
            &format!("/api/v1/sessions/{session}/events"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let (status, _) = send(
        &app,
        create_json_request(
            "POST",
            &format!("/api/v1/sessions/{session}/submissions"),
            Some(json!({ "text": "GeneA interacts with ProteinB." })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let mut frames = response.into_body().into_data_stream();
    let mut received = String::new();
    while !received.contains("event: completed") {
        let chunk = tokio::time::timeout(Duration::from_secs(5), frames.next())
            .await
            .expect("no event within 5s")
            .expect("stream ended")
            .unwrap();
        received.push_str(std::str::from_utf8(&chunk).unwrap());
    }

    let submitted = received.find("event: submitted").unwrap();
    let completed = received.find("event: completed").unwrap();
    assert!(submitted < completed);
    assert!(received.contains(r#""status":"resolved""#));
    assert!(received.contains(r#""record_id":0"#));
}

#[tokio::test]
async fn test_event_stream_unknown_session() {
    let app = create_router_for_testing();
    let missing = uuid::Uuid::new_v4();

    let (status, json) = send(
        &app,
        create_json_request("GET", &format!("/api/v1/sessions/{missing}/events"), None),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}
