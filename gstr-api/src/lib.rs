//! gstr-api library - GST reconciliation REST service
//!
//! Dashboard records (vendors, invoices, alerts, users) live in the SQLite
//! document store; returns are ingested into the property graph, which the
//! reconciliation, risk and explanation endpoints read.

use std::sync::Arc;

use axum::Router;
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use gstr_common::config::LlmSettings;
use gstr_common::explain::Explainer;
use gstr_common::reconcile::ReconciliationEngine;
use gstr_common::risk::ComplianceModel;
use gstr_common::GraphStore;

pub mod api;
pub mod error;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Document store and graph share this pool
    pub db: SqlitePool,
    pub graph: GraphStore,
    pub engine: ReconciliationEngine,
    pub model: Arc<ComplianceModel>,
    pub explainer: Arc<Explainer>,
}

impl AppState {
    /// Create new application state
    ///
    /// Explanations use the LLM only when `llm` carries an API key.
    pub fn new(
        db: SqlitePool,
        model: ComplianceModel,
        llm: &LlmSettings,
    ) -> gstr_common::Result<Self> {
        let graph = GraphStore::new(db.clone());
        let explainer = Explainer::with_settings(graph.clone(), model.clone(), llm)?;
        Ok(Self {
            db,
            engine: ReconciliationEngine::new(graph.clone()),
            graph,
            model: Arc::new(model),
            explainer: Arc::new(explainer),
        })
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::record_routes())
        .merge(api::account_routes())
        .merge(api::graph_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
