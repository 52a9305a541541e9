//! Integration tests for gstr-api endpoints
//!
//! Every test builds the router over a fresh seeded in-memory database and
//! drives it in-process with `oneshot`.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot` method

use gstr_api::{build_router, AppState};
use gstr_common::config::LlmSettings;
use gstr_common::db::{init_in_memory, seed_demo_data};
use gstr_common::risk::ComplianceModel;

const HYDERABAD: &str = "36AAACH7409R1ZK";

/// Test helper: seeded database, template-only explanations
async fn setup_app() -> Router {
    let pool = init_in_memory().await.unwrap();
    seed_demo_data(&pool).await.unwrap();
    let state = AppState::new(pool, ComplianceModel::default(), &LlmSettings::default()).unwrap();
    build_router(state)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Send one request; returns status and parsed JSON body
async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Should parse JSON")
    };
    (status, body)
}

fn gstr2b_upload() -> Value {
    json!({
        "docdata": {"b2b": [
            {"ctin": HYDERABAD, "trdnm": "Hyderabad Steels Pvt", "inv": [
                {"inum": "H-1", "dt": "2025-07-15", "val": 450000, "camt": 40500, "samt": 40500, "hsn": "7208"}
            ]}
        ]}
    })
}

// =============================================================================
// Service
// =============================================================================

#[tokio::test]
async fn test_health_and_root() {
    let app = setup_app().await;

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "gstr-api");
    assert!(body["version"].is_string());

    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "online");
    assert_eq!(body["database"], "SQLite");
}

// =============================================================================
// Dashboard records
// =============================================================================

#[tokio::test]
async fn test_list_seeded_records() {
    let app = setup_app().await;

    let (status, vendors) = send(&app, get("/api/vendors")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(vendors.as_array().unwrap().len(), 20);
    assert_eq!(vendors[0]["id"], "V001");
    assert!(vendors[0]["riskScore"].is_number());

    let (_, invoices) = send(&app, get("/api/invoices")).await;
    assert_eq!(invoices.as_array().unwrap().len(), 20);
    assert_eq!(invoices[0]["matchStatus"], "Missing in GSTR-1");
    assert_eq!(invoices[0]["riskLevel"], "High");

    let (_, alerts) = send(&app, get("/api/alerts")).await;
    assert_eq!(alerts.as_array().unwrap().len(), 5);
    assert!(alerts[0]["type"].is_string());
}

#[tokio::test]
async fn test_create_vendor_scores_and_alerts() {
    let app = setup_app().await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/vendors",
            json!({"name": "Deccan Traders", "gstin": "36AABCD1234E1Z5", "state": "Telangana",
                   "totalTransactions": 67, "missedFilings": 4, "avgDaysLate": 12}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vendor"]["id"], "V021");
    assert_eq!(body["vendor"]["riskScore"], 0.47);
    assert_eq!(body["vendor"]["status"], "Review");
    assert_eq!(body["alert"]["type"], "warning");
    assert_eq!(body["alert"]["time"], "Just now");

    let (_, alerts) = send(&app, get("/api/alerts")).await;
    assert_eq!(alerts[0]["message"], body["alert"]["message"]);

    let (status, body) = send(&app, post_json("/api/vendors", json!({"name": "", "gstin": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_create_invoice_derives_status() {
    let app = setup_app().await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/invoices",
            json!({"vendorId": "V005", "date": "2025-10-01", "taxableAmount": 400000,
                   "cgst": 36000, "sgst": 36000, "hsn": "7208", "period": "2025-10",
                   "gstr1Reported": false}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let invoice = &body["invoice"];
    assert_eq!(invoice["id"], "INV-2025-021");
    assert_eq!(invoice["vendorName"], "Hyderabad Steels Pvt");
    assert_eq!(invoice["gstin"], HYDERABAD);
    assert_eq!(invoice["totalTax"], 72000.0);
    assert_eq!(invoice["total"], 472000.0);
    assert_eq!(invoice["matchStatus"], "Missing in GSTR-1");
    assert_eq!(invoice["riskLevel"], "High");
    assert_eq!(body["alert"]["type"], "critical");

    let (_, body) = send(
        &app,
        post_json("/api/invoices", json!({"vendorId": "V999", "taxableAmount": 1000, "igst": 180})),
    )
    .await;
    assert_eq!(body["invoice"]["vendorName"], "Unknown");
    assert_eq!(body["invoice"]["matchStatus"], "Matched");
    assert_eq!(body["invoice"]["riskLevel"], "Low");
    assert_eq!(body["alert"]["type"], "success");
}

#[tokio::test]
async fn test_stats() {
    let app = setup_app().await;

    let (status, stats) = send(&app, get("/api/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalInvoices"], 20);
    assert_eq!(stats["vendorsMonitored"], 20);
    assert_eq!(stats["highRiskVendors"], 3);
    assert_eq!(stats["avgResolutionDays"], 4.2);
    assert!(stats["atRiskITC"].as_f64().unwrap() > 0.0);

    let mismatches = stats["totalMismatches"].as_i64().unwrap();
    let expected = ((20 - mismatches) as f64 / 20.0 * 1000.0).round() / 10.0;
    assert_eq!(stats["matchRate"].as_f64().unwrap(), expected);
}

// =============================================================================
// Accounts
// =============================================================================

#[tokio::test]
async fn test_login() {
    let app = setup_app().await;

    let (status, body) = send(
        &app,
        post_json("/api/login", json!({"email": "admin@gstreconcile.ai", "password": "admin123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["role"], "admin");
    assert!(body["user"].get("password").is_none());

    let (_, body) = send(
        &app,
        post_json("/api/login", json!({"email": "admin@gstreconcile.ai", "password": "nope"})),
    )
    .await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid email or password");
}

#[tokio::test]
async fn test_signup_rejects_duplicate_email() {
    let app = setup_app().await;
    let signup = json!({"email": "ca@example.com", "password": "s3cret", "name": "CA Firm"});

    let (_, body) = send(&app, post_json("/api/signup", signup.clone())).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["role"], "user");

    let (_, body) = send(&app, post_json("/api/signup", signup)).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Email already registered");

    let (_, body) = send(
        &app,
        post_json("/api/login", json!({"email": "ca@example.com", "password": "s3cret"})),
    )
    .await;
    assert_eq!(body["success"], true);
}

// =============================================================================
// Risk
// =============================================================================

#[tokio::test]
async fn test_predict_risk() {
    let app = setup_app().await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/predict-risk",
            json!({"missedFilings": 10, "avgDaysLate": 40, "totalTransactions": 5}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!((body["score"].as_f64().unwrap() - 0.704).abs() < 1e-9);
    assert_eq!(body["status"], "High Risk");

    let (_, body) = send(&app, post_json("/api/predict-risk", json!({}))).await;
    assert_eq!(body["status"], "Compliant");
}

#[tokio::test]
async fn test_model_endpoints() {
    let app = setup_app().await;

    let (status, body) = send(&app, get("/api/risk/model")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["threshold"].is_number());
    assert_eq!(body["featureImportance"].as_array().unwrap().len(), 8);

    let (_, body) = send(&app, get("/api/risk/vendors")).await;
    assert!(body.as_array().unwrap().is_empty());

    send(&app, post_json("/api/ingest/gstr2b?period=2025-07", gstr2b_upload())).await;
    let (_, body) = send(&app, get("/api/risk/vendors")).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["gstin"], HYDERABAD);
    assert!(body[0]["probability"].is_number());
}

// =============================================================================
// Ingestion and reconciliation
// =============================================================================

#[tokio::test]
async fn test_ingest_validation() {
    let app = setup_app().await;

    let (status, body) = send(&app, post_json("/api/ingest/gstr2b?period=July", gstr2b_upload())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, body) = send(&app, post_json("/api/ingest/gstr2b?period=2025-07", gstr2b_upload())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["document"], "GSTR-2B");
    assert_eq!(body["period"], "2025-07");
    assert_eq!(body["records"], 1);

    let (status, body) = send(
        &app,
        post_json(
            "/api/ingest/ewaybill",
            json!([{"ewbNo": 331001, "docNo": "H-1", "fromGstin": HYDERABAD, "totInvValue": 531000}]),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["document"], "e-Way Bill");
}

#[tokio::test]
async fn test_reconcile_get_is_read_only_and_post_persists() {
    let app = setup_app().await;
    send(&app, post_json("/api/ingest/gstr2b?period=2025-07", gstr2b_upload())).await;

    let (status, report) = send(&app, get("/api/reconcile/2025-07")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total_mismatches"], 2);
    assert_eq!(report["itc_at_risk"], 81000.0);
    assert_eq!(report["mismatches"][0]["invoice_number"], "H-1");

    // Nothing persisted yet
    let (_, explained) = send(&app, get(&format!("/api/explain/vendor/{}", HYDERABAD))).await;
    assert!(explained["explanation"]
        .as_str()
        .unwrap()
        .contains("none were flagged"));

    let (status, run) = send(&app, post_json("/api/reconcile/2025-07", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(run["statuses"]["mismatched"], 1);
    assert_eq!(run["alert"]["type"], "warning");

    let (_, alerts) = send(&app, get("/api/alerts")).await;
    assert_eq!(alerts[0]["message"], run["alert"]["message"]);

    let (_, explained) = send(&app, get(&format!("/api/explain/vendor/{}", HYDERABAD))).await;
    assert!(explained["explanation"]
        .as_str()
        .unwrap()
        .contains("1 were flagged"));

    let (status, _) = send(&app, get("/api/reconcile/2025-13")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reconcile_report_is_stable_across_runs() {
    let app = setup_app().await;
    send(&app, post_json("/api/ingest/gstr2b?period=2025-07", gstr2b_upload())).await;

    let (_, before) = send(&app, get("/api/reconcile/2025-07")).await;

    let (_, run) = send(&app, post_json("/api/reconcile/2025-07", json!({}))).await;
    assert_eq!(run["report"], before);
    send(&app, post_json("/api/reconcile/2025-07", json!({}))).await;

    let (status, after) = send(&app, get("/api/reconcile/2025-07")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after, before);
}

// =============================================================================
// Explanations
// =============================================================================

#[tokio::test]
async fn test_explain_endpoints() {
    let app = setup_app().await;
    send(&app, post_json("/api/ingest/gstr2b?period=2025-07", gstr2b_upload())).await;

    let (status, body) = send(
        &app,
        get(&format!("/api/explain/invoice?gstin={}&number=H-1", HYDERABAD)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subject"], format!("{}/H-1", HYDERABAD));
    assert_eq!(body["source"], "Knowledge graph template");
    assert!(body.get("model").is_none());
    assert!(body["explanation"]
        .as_str()
        .unwrap()
        .contains("Section 16(2)(aa)"));

    let (status, body) = send(&app, get("/api/explain/period/2025-07")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subject"], "2025-07");

    let (status, body) = send(
        &app,
        get(&format!("/api/explain/invoice?gstin={}&number=NOPE", HYDERABAD)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = send(&app, get("/api/explain/invoice?gstin=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/api/explain/vendor/29AABCU9603R1ZM")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
