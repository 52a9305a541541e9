//! Vendor risk scoring

use axum::{extract::State, Json};
use serde::Serialize;

use gstr_common::models::VendorStatus;
use gstr_common::risk::{
    classify_risk, extract_features, predict_risk, round_to, FeatureImportance, VendorAssessment,
    VendorProfile,
};

use crate::{ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct RiskPrediction {
    pub score: f64,
    pub status: VendorStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSummary {
    pub threshold: f64,
    pub feature_importance: Vec<FeatureImportance>,
}

/// POST /api/predict-risk
pub async fn predict_vendor_risk(Json(profile): Json<VendorProfile>) -> Json<RiskPrediction> {
    let score = predict_risk(&profile);
    Json(RiskPrediction {
        score: round_to(score, 4),
        status: classify_risk(score),
    })
}

/// GET /api/risk/model
pub async fn model_summary(State(state): State<AppState>) -> Json<ModelSummary> {
    Json(ModelSummary {
        threshold: state.model.threshold(),
        feature_importance: state.model.feature_importance(),
    })
}

/// GET /api/risk/vendors
///
/// Every graph vendor, riskiest first.
pub async fn assess_vendors(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<VendorAssessment>>> {
    let features = extract_features(&state.graph).await?;
    Ok(Json(state.model.assess(&features)))
}
