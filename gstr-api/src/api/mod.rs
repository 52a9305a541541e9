//! HTTP API handlers for gstr-api

pub mod alerts;
pub mod auth;
pub mod explain;
pub mod health;
pub mod ingest;
pub mod invoices;
pub mod reconcile;
pub mod risk;
pub mod stats;
pub mod vendors;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub use health::health_routes;

/// Dashboard records and counters
pub fn record_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/vendors",
            get(vendors::list_vendors).post(vendors::create_vendor),
        )
        .route(
            "/api/invoices",
            get(invoices::list_invoices).post(invoices::create_invoice),
        )
        .route("/api/alerts", get(alerts::list_alerts))
        .route("/api/stats", get(stats::get_stats))
        .route("/api/predict-risk", post(risk::predict_vendor_risk))
}

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/api/login", post(auth::login))
        .route("/api/signup", post(auth::signup))
}

/// Ingestion, reconciliation, model risk and explanations over the graph
pub fn graph_routes() -> Router<AppState> {
    Router::new()
        .route("/api/ingest/gstr1", post(ingest::ingest_gstr1))
        .route("/api/ingest/gstr2b", post(ingest::ingest_gstr2b))
        .route("/api/ingest/einvoice", post(ingest::ingest_einvoice))
        .route("/api/ingest/ewaybill", post(ingest::ingest_ewaybill))
        .route(
            "/api/reconcile/:period",
            get(reconcile::get_report).post(reconcile::run_reconciliation),
        )
        .route("/api/risk/model", get(risk::model_summary))
        .route("/api/risk/vendors", get(risk::assess_vendors))
        .route("/api/explain/invoice", get(explain::explain_invoice))
        .route("/api/explain/vendor/:gstin", get(explain::explain_vendor))
        .route("/api/explain/period/:period", get(explain::explain_period))
}
