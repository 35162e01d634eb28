//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use sift_core::{MockBackend, TrainingOptions};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::handlers::{import_csv_core, train_core};

const BOUNDARY: &str = "sift-test-boundary";

fn setup_state(ai: Option<AIClient>) -> (Arc<AppState>, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = Config {
        model_dir: dir.path().join("models"),
        ..Default::default()
    };
    let db = Database::in_memory().unwrap();
    let state = AppState::with_ai(db, config, ServerConfig::default(), ai);
    (Arc::new(state), dir)
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str, owner: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(owner) = owner {
        builder = builder.header(OWNER_HEADER, owner);
    }
    builder.body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, owner: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(owner) = owner {
        builder = builder.header(OWNER_HEADER, owner);
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn multipart_request(uri: &str, owner: &str, fields: &[(&str, &str)], file: &str) -> Request<Body> {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            BOUNDARY, name, value
        ));
    }
    body.push_str(&format!(
        "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"upload.csv\"\r\nContent-Type: text/csv\r\n\r\n{}\r\n--{}--\r\n",
        BOUNDARY, file, BOUNDARY
    ));

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .header(OWNER_HEADER, owner)
        .body(Body::from(body))
        .unwrap()
}

fn january_csv() -> &'static str {
    "date,amount,description\n\
     2024-01-05,120,Walmart supermarket\n\
     2024-01-06,45,Shell gas station\n\
     2024-01-07,2000,Rent payment\n"
}

fn labelled_csv() -> String {
    let mut csv = String::from("memo,label\n");
    for i in 0..20 {
        csv.push_str(&format!("netflix streaming {},Entertainment\n", i));
        csv.push_str(&format!("pharmacy prescription {},Health\n", i));
        csv.push_str(&format!("airline ticket {},Travel\n", i));
    }
    csv
}

// ========== Health ==========

#[tokio::test]
async fn test_health_without_generative_backend() {
    let (state, _dir) = setup_state(None);
    let app = create_router(state);

    let response = app.oneshot(get("/api/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );

    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["model_available"], false);
    assert_eq!(json["generative"]["configured"], false);
    assert!(json["generative"]["model"].is_null());
}

#[tokio::test]
async fn test_health_with_mock_backend() {
    let (state, _dir) = setup_state(Some(AIClient::Mock(MockBackend::new())));
    let app = create_router(state);

    let response = app.oneshot(get("/api/health", None)).await.unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["generative"]["configured"], true);
    assert_eq!(json["generative"]["healthy"], true);
    assert_eq!(json["generative"]["model"], "mock");
}

#[tokio::test]
async fn test_health_and_categorize_against_mock_gemini() {
    let server = sift_core::test_utils::MockGeminiServer::start().await.unwrap();
    let client = AIClient::gemini(&server.url(), "gemini-test", "test-key");
    let (state, _dir) = setup_state(Some(client));

    let response = create_router(state.clone())
        .oneshot(get("/api/health", None))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["generative"]["healthy"], true);
    assert_eq!(json["generative"]["model"], "gemini-test");

    let response = create_router(state)
        .oneshot(json_request(
            "POST",
            "/api/categorize",
            None,
            serde_json::json!({ "description": "NETFLIX.COM 1234" }),
        ))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["category"], "Entertainment");
    assert_eq!(json["source"], "gemini");
    assert_eq!(server.request_count(), 1);
}

// ========== Categorize ==========

#[tokio::test]
async fn test_categorize_rule_match() {
    let (state, _dir) = setup_state(None);
    let app = create_router(state.clone());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/categorize",
            None,
            serde_json::json!({ "description": "Shell gas station" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["category"], "Fuel");
    assert_eq!(json["source"], "rules");
    assert_eq!(json["confidence"], 0.95);

    // Nothing is persisted
    assert!(state.db.recent_transactions(DEFAULT_OWNER, 10).unwrap().is_empty());
}

#[tokio::test]
async fn test_categorize_generative_fallback() {
    let mock = MockBackend::new().with_category("Entertainment", 0.9);
    let (state, _dir) = setup_state(Some(AIClient::Mock(mock.clone())));
    let app = create_router(state);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/categorize",
            None,
            serde_json::json!({ "description": "NETFLIX.COM" }),
        ))
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["category"], "Entertainment");
    assert_eq!(json["source"], "gemini");
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_categorize_unmatched_is_default() {
    let (state, _dir) = setup_state(None);
    let app = create_router(state);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/categorize",
            None,
            serde_json::json!({ "description": "XYZ 123" }),
        ))
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["category"], "Other");
    assert_eq!(json["source"], "default");
    assert_eq!(json["confidence"], 0.25);
}

#[tokio::test]
async fn test_categorize_blank_description() {
    let (state, _dir) = setup_state(None);
    let app = create_router(state);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/categorize",
            None,
            serde_json::json!({ "description": "   " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Transactions ==========

#[tokio::test]
async fn test_create_and_get_transaction() {
    let (state, _dir) = setup_state(None);

    let response = create_router(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/transactions",
            Some("alice"),
            serde_json::json!({
                "date": "2024-01-07",
                "description": "Rent payment",
                "amount": 2000.0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = get_body_json(response).await;
    assert_eq!(created["category"], "Rent");
    assert_eq!(created["owner"], "alice");
    let id = created["id"].as_i64().unwrap();

    let response = create_router(state.clone())
        .oneshot(get(&format!("/api/transactions/{}", id), Some("alice")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["description"], "Rent payment");

    // Other owners cannot see it
    let response = create_router(state)
        .oneshot(get(&format!("/api/transactions/{}", id), Some("bob")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_transaction_invalid_date() {
    let (state, _dir) = setup_state(None);

    let response = create_router(state)
        .oneshot(json_request(
            "POST",
            "/api/transactions",
            None,
            serde_json::json!({
                "date": "yesterday",
                "description": "Rent payment",
                "amount": 2000.0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_transaction_blank_description() {
    let (state, _dir) = setup_state(None);

    let response = create_router(state)
        .oneshot(json_request(
            "POST",
            "/api/transactions",
            None,
            serde_json::json!({
                "date": "2024-01-07",
                "description": " ",
                "amount": 10.0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_transactions_limit_validation() {
    let (state, _dir) = setup_state(None);

    let response = create_router(state.clone())
        .oneshot(get("/api/transactions?limit=0", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = create_router(state)
        .oneshot(get("/api/transactions?limit=5000", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_transactions_scoped_to_owner() {
    let (state, _dir) = setup_state(None);
    import_csv_core(&state, "alice", january_csv().as_bytes().to_vec())
        .await
        .unwrap();

    let response = create_router(state.clone())
        .oneshot(get("/api/transactions?limit=2", Some("alice")))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    let txs = json.as_array().unwrap();
    assert_eq!(txs.len(), 2);
    assert_eq!(txs[0]["description"], "Rent payment");

    let response = create_router(state)
        .oneshot(get("/api/transactions", None))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert!(json.as_array().unwrap().is_empty());
}

// ========== Import ==========

#[tokio::test]
async fn test_import_csv_core() {
    let (state, _dir) = setup_state(None);

    let summary = import_csv_core(&state, "alice", january_csv().as_bytes().to_vec())
        .await
        .unwrap();
    assert_eq!(summary.inserted, 3);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.latest_month.as_deref(), Some("2024-01"));
}

#[tokio::test]
async fn test_import_csv_missing_column() {
    let (state, _dir) = setup_state(None);

    let err = import_csv_core(&state, "alice", b"date,amount\n2024-01-05,10\n".to_vec())
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_via_multipart() {
    let (state, _dir) = setup_state(None);

    let response = create_router(state.clone())
        .oneshot(multipart_request("/api/import", "alice", &[], january_csv()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["inserted"], 3);
    assert_eq!(state.db.recent_transactions("alice", 10).unwrap().len(), 3);
}

#[tokio::test]
async fn test_import_without_file_field() {
    let (state, _dir) = setup_state(None);

    let body = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{}--\r\n",
        BOUNDARY, BOUNDARY
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/import")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();

    let response = create_router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Training ==========

#[tokio::test]
async fn test_train_core_replaces_model() {
    let (state, _dir) = setup_state(None);
    assert!(!state.classifier.is_available());

    let report = train_core(
        &state,
        labelled_csv().into_bytes(),
        TrainingOptions::with_columns("memo", "label"),
    )
    .await
    .unwrap();
    assert_eq!(report.train_rows, 48);
    assert_eq!(report.test_rows, 12);
    assert!(state.classifier.is_available());

    let result = state.cascade.categorize("airline ticket").await;
    assert_eq!(result.category, "Travel");
}

#[tokio::test]
async fn test_train_via_multipart_with_columns() {
    let (state, _dir) = setup_state(None);

    let response = create_router(state.clone())
        .oneshot(multipart_request(
            "/api/train",
            "alice",
            &[("text_column", "memo"), ("label_column", "label")],
            &labelled_csv(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["test_rows"], 12);
    assert_eq!(json["labels"].as_array().unwrap().len(), 3);

    let response = create_router(state)
        .oneshot(get("/api/health", None))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["model_available"], true);
}

#[tokio::test]
async fn test_train_missing_label_column() {
    let (state, _dir) = setup_state(None);

    let err = train_core(
        &state,
        b"description,amount\nnetflix,10\n".to_vec(),
        TrainingOptions::default(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

// ========== Analytics ==========

#[tokio::test]
async fn test_dashboard_after_import() {
    let (state, _dir) = setup_state(None);
    import_csv_core(&state, "alice", january_csv().as_bytes().to_vec())
        .await
        .unwrap();

    let response = create_router(state.clone())
        .oneshot(get("/api/dashboard?month=2024-01", Some("alice")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["total_spend"], 2165.0);
    assert_eq!(json["top_category"], "Rent");
    assert_eq!(json["top_category_spend"], 2000.0);

    // Same month, different owner
    let response = create_router(state)
        .oneshot(get("/api/dashboard?month=2024-01", Some("bob")))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["total_spend"], 0.0);
    assert!(json["top_category"].is_null());
}

#[tokio::test]
async fn test_dashboard_invalid_month() {
    let (state, _dir) = setup_state(None);

    let response = create_router(state)
        .oneshot(get("/api/dashboard?month=2024-13", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("2024-13"));
}

#[tokio::test]
async fn test_dashboard_defaults_to_current_month() {
    let (state, _dir) = setup_state(None);

    let response = create_router(state)
        .oneshot(get("/api/dashboard", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["month"].as_str().unwrap().len(), 7);
}

#[tokio::test]
async fn test_trend_and_month_summary() {
    let (state, _dir) = setup_state(None);
    import_csv_core(&state, "alice", january_csv().as_bytes().to_vec())
        .await
        .unwrap();

    let response = create_router(state.clone())
        .oneshot(get("/api/trend", Some("alice")))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    let points = json.as_array().unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0]["month"], "2024-01");

    let response = create_router(state)
        .oneshot(get("/api/months/2024-01", Some("alice")))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["total_spend"], 2165.0);
    assert_eq!(json["by_category"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_anomalies_endpoint() {
    let (state, _dir) = setup_state(None);
    let mut csv = String::from("date,amount,description\n");
    for day in 1..=12 {
        csv.push_str(&format!("2024-02-{:02},20,Corner cafe\n", day));
    }
    csv.push_str("2024-02-20,1500,Laptop purchase\n");
    import_csv_core(&state, "alice", csv.into_bytes()).await.unwrap();

    let response = create_router(state)
        .oneshot(get("/api/anomalies?month=2024-02", Some("alice")))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    let anomalies = json.as_array().unwrap();
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0]["description"], "Laptop purchase");
}

#[tokio::test]
async fn test_insights_and_summary_fall_back_without_model() {
    let (state, _dir) = setup_state(None);
    import_csv_core(&state, "alice", january_csv().as_bytes().to_vec())
        .await
        .unwrap();

    let response = create_router(state.clone())
        .oneshot(get("/api/insights?month=2024-01", Some("alice")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["totals"]["expense"], 2165.0);
    assert_eq!(json["budget"]["status"], "no_budget");
    assert_eq!(json["narrative"]["ai_generated"], false);

    let response = create_router(state)
        .oneshot(get("/api/summary?month=2024-01", Some("alice")))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["ai_generated"], false);
    assert_eq!(json["breakdown"][0]["category"], "Rent");
    assert!(json["summary"].as_str().unwrap().contains("2024-01"));
}

#[tokio::test]
async fn test_summary_with_mock_model() {
    let mock = MockBackend::new().with_response("Rent dominated January.");
    let (state, _dir) = setup_state(Some(AIClient::Mock(mock)));
    import_csv_core(&state, "alice", january_csv().as_bytes().to_vec())
        .await
        .unwrap();

    let response = create_router(state)
        .oneshot(get("/api/summary?month=2024-01", Some("alice")))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["summary"], "Rent dominated January.");
    assert_eq!(json["ai_generated"], true);
}

// ========== Budget ==========

#[tokio::test]
async fn test_budget_lifecycle() {
    let (state, _dir) = setup_state(None);

    let response = create_router(state.clone())
        .oneshot(get("/api/budget", Some("alice")))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert!(json["amount"].is_null());

    let response = create_router(state.clone())
        .oneshot(json_request(
            "PUT",
            "/api/budget",
            Some("alice"),
            serde_json::json!({ "amount": 1800.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.db.get_budget("alice").unwrap(), Some(1800.0));

    let response = create_router(state.clone())
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/budget")
                .header(OWNER_HEADER, "alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.db.get_budget("alice").unwrap(), None);

    // Clearing again finds nothing
    let response = create_router(state)
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/budget")
                .header(OWNER_HEADER, "alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_negative_budget_rejected() {
    let (state, _dir) = setup_state(None);

    let response = create_router(state)
        .oneshot(json_request(
            "PUT",
            "/api/budget",
            None,
            serde_json::json!({ "amount": -5.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Owner header ==========

#[test]
fn test_owner_from_headers() {
    let mut headers = HeaderMap::new();
    assert_eq!(owner_from(&headers), DEFAULT_OWNER);

    headers.insert(OWNER_HEADER, HeaderValue::from_static("  "));
    assert_eq!(owner_from(&headers), DEFAULT_OWNER);

    headers.insert(OWNER_HEADER, HeaderValue::from_static("alice"));
    assert_eq!(owner_from(&headers), "alice");
}
