use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use gstr_common::explain::Explanation;

use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct InvoiceQuery {
    #[serde(default)]
    pub gstin: String,
    #[serde(default)]
    pub number: String,
}

/// GET /api/explain/invoice?gstin=&number=
pub async fn explain_invoice(
    State(state): State<AppState>,
    Query(query): Query<InvoiceQuery>,
) -> ApiResult<Json<Explanation>> {
    if query.gstin.trim().is_empty() || query.number.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Both gstin and number are required".to_string(),
        ));
    }
    Ok(Json(
        state
            .explainer
            .explain_invoice(&query.gstin, &query.number)
            .await?,
    ))
}

/// GET /api/explain/vendor/:gstin
pub async fn explain_vendor(
    State(state): State<AppState>,
    Path(gstin): Path<String>,
) -> ApiResult<Json<Explanation>> {
    Ok(Json(state.explainer.explain_vendor_risk(&gstin).await?))
}

/// GET /api/explain/period/:period
pub async fn explain_period(
    State(state): State<AppState>,
    Path(period): Path<String>,
) -> ApiResult<Json<Explanation>> {
    Ok(Json(state.explainer.explain_itc_claim(&period).await?))
}
