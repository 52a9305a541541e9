//! Period reconciliation
//!
//! GET computes the report without side effects. POST also writes the
//! match statuses onto the invoice nodes and raises a dashboard alert.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use gstr_common::db::alerts;
use gstr_common::models::{format_inr, Alert, AlertType};
use gstr_common::reconcile::{ReconciliationReport, StatusSummary};

use crate::{ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct ReconciliationRun {
    pub report: ReconciliationReport,
    pub statuses: StatusSummary,
    pub alert: Alert,
}

fn reconciliation_alert(report: &ReconciliationReport) -> Alert {
    if report.total_mismatches == 0 {
        return Alert::now(
            AlertType::Success,
            format!("Reconciliation completed for {}: all invoices matched", report.period),
        );
    }

    let alert_type = if report.high_risk_count() > 0 {
        AlertType::Critical
    } else {
        AlertType::Warning
    };
    Alert::now(
        alert_type,
        format!(
            "{} mismatches found for {}: ₹{} ITC at risk",
            report.total_mismatches,
            report.period,
            format_inr(report.itc_at_risk)
        ),
    )
}

/// GET /api/reconcile/:period
pub async fn get_report(
    State(state): State<AppState>,
    Path(period): Path<String>,
) -> ApiResult<Json<ReconciliationReport>> {
    Ok(Json(state.engine.full_reconciliation(&period).await?))
}

/// POST /api/reconcile/:period
pub async fn run_reconciliation(
    State(state): State<AppState>,
    Path(period): Path<String>,
) -> ApiResult<Json<ReconciliationRun>> {
    let report = state.engine.full_reconciliation(&period).await?;
    let statuses = state.engine.apply_statuses(&report).await?;

    let alert = reconciliation_alert(&report);
    alerts::insert_alert(&state.db, &alert).await?;

    info!(
        period = %report.period,
        matched = statuses.matched,
        mismatched = statuses.mismatched,
        "Reconciliation statuses applied"
    );
    Ok(Json(ReconciliationRun {
        report,
        statuses,
        alert,
    }))
}
