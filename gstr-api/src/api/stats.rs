use axum::{extract::State, Json};
use serde::Serialize;

use gstr_common::db::{invoices, vendors};
use gstr_common::risk::round_to;

use crate::{ApiResult, AppState};

/// Placeholder shown on the dashboard until resolution times are tracked
const AVG_RESOLUTION_DAYS: f64 = 4.2;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_invoices: i64,
    pub total_mismatches: i64,
    #[serde(rename = "atRiskITC")]
    pub at_risk_itc: f64,
    pub vendors_monitored: i64,
    pub high_risk_vendors: i64,
    /// Percentage of matched invoices, one decimal
    pub match_rate: f64,
    pub avg_resolution_days: f64,
}

/// GET /api/stats
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<DashboardStats>> {
    let totals = invoices::invoice_totals(&state.db).await?;

    let match_rate = if totals.total_invoices > 0 {
        let matched = (totals.total_invoices - totals.mismatches) as f64;
        round_to(matched / totals.total_invoices as f64 * 100.0, 1)
    } else {
        0.0
    };

    Ok(Json(DashboardStats {
        total_invoices: totals.total_invoices,
        total_mismatches: totals.mismatches,
        at_risk_itc: totals.at_risk_itc,
        vendors_monitored: vendors::count_vendors(&state.db).await?,
        high_risk_vendors: vendors::count_high_risk_vendors(&state.db).await?,
        match_rate,
        avg_resolution_days: AVG_RESOLUTION_DAYS,
    }))
}
