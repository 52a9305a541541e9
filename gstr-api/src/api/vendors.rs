//! Vendor registry

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use gstr_common::db::{alerts, vendors};
use gstr_common::models::{Alert, NewVendor, Vendor};
use gstr_common::risk::{classify_risk, predict_risk, round_to, VendorProfile};

use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct VendorCreated {
    pub vendor: Vendor,
    pub alert: Alert,
}

/// GET /api/vendors
pub async fn list_vendors(State(state): State<AppState>) -> ApiResult<Json<Vec<Vendor>>> {
    Ok(Json(vendors::list_vendors(&state.db).await?))
}

/// POST /api/vendors
///
/// Scores the vendor from its filing record and raises an alert whose
/// severity follows the resulting status.
pub async fn create_vendor(
    State(state): State<AppState>,
    Json(payload): Json<NewVendor>,
) -> ApiResult<Json<VendorCreated>> {
    if payload.name.trim().is_empty() || payload.gstin.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Vendor name and GSTIN are required".to_string(),
        ));
    }

    let profile = VendorProfile {
        missed_filings: payload.missed_filings,
        avg_days_late: payload.avg_days_late,
        total_transactions: payload.total_transactions.unwrap_or(100),
    };
    let score = predict_risk(&profile);
    let status = classify_risk(score);

    let vendor = Vendor {
        id: vendors::next_vendor_id(&state.db).await?,
        name: payload.name,
        gstin: payload.gstin,
        state: payload.state,
        risk_score: round_to(score, 2),
        status,
        total_transactions: payload.total_transactions.unwrap_or(0),
        missed_filings: payload.missed_filings,
        avg_days_late: payload.avg_days_late,
    };
    vendors::insert_vendor(&state.db, &vendor).await?;

    let alert = Alert::now(
        status.alert_type(),
        format!(
            "New vendor {} added: risk {}% ({})",
            vendor.name,
            (score * 100.0) as i64,
            status
        ),
    );
    alerts::insert_alert(&state.db, &alert).await?;

    info!(vendor = %vendor.id, status = %status, "Vendor registered");
    Ok(Json(VendorCreated { vendor, alert }))
}
