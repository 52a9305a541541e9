//! Document upload into the property graph
//!
//! Bodies are the portal JSON exports. A document that fails validation is
//! rejected with 400 and nothing from it is written.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use gstr_common::ingest::{
    self, EInvoiceRecord, EWayBillRecord, Gstr1Document, Gstr2bDocument, IngestSummary,
};

use crate::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    /// Return period, `YYYY-MM`
    pub period: String,
}

/// POST /api/ingest/gstr1?period=YYYY-MM
pub async fn ingest_gstr1(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
    Json(doc): Json<Gstr1Document>,
) -> ApiResult<Json<IngestSummary>> {
    Ok(Json(ingest::ingest_gstr1(&state.graph, &doc, &query.period).await?))
}

/// POST /api/ingest/gstr2b?period=YYYY-MM
pub async fn ingest_gstr2b(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
    Json(doc): Json<Gstr2bDocument>,
) -> ApiResult<Json<IngestSummary>> {
    Ok(Json(ingest::ingest_gstr2b(&state.graph, &doc, &query.period).await?))
}

/// POST /api/ingest/einvoice
pub async fn ingest_einvoice(
    State(state): State<AppState>,
    Json(records): Json<Vec<EInvoiceRecord>>,
) -> ApiResult<Json<IngestSummary>> {
    Ok(Json(ingest::ingest_einvoice(&state.graph, &records).await?))
}

/// POST /api/ingest/ewaybill
pub async fn ingest_ewaybill(
    State(state): State<AppState>,
    Json(records): Json<Vec<EWayBillRecord>>,
) -> ApiResult<Json<IngestSummary>> {
    Ok(Json(ingest::ingest_ewaybill(&state.graph, &records).await?))
}
