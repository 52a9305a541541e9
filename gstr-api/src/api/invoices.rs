//! Invoice records entered from the dashboard

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use gstr_common::db::{alerts, invoices, vendors};
use gstr_common::models::{format_inr, Alert, AlertType, Invoice, MatchStatus, NewInvoice, RiskLevel};

use crate::{ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct InvoiceCreated {
    pub invoice: Invoice,
    pub alert: Alert,
}

/// GET /api/invoices
pub async fn list_invoices(State(state): State<AppState>) -> ApiResult<Json<Vec<Invoice>>> {
    Ok(Json(invoices::list_invoices(&state.db).await?))
}

fn invoice_alert(invoice: &Invoice) -> Alert {
    if invoice.match_status.is_matched() {
        return Alert::now(
            AlertType::Success,
            format!("Invoice {} from {} matched", invoice.id, invoice.vendor_name),
        );
    }

    let alert_type = if invoice.risk_level == RiskLevel::High {
        AlertType::Critical
    } else {
        AlertType::Warning
    };
    Alert::now(
        alert_type,
        format!(
            "Mismatch: {} from {}: {} (₹{} tax)",
            invoice.id,
            invoice.vendor_name,
            invoice.match_status,
            format_inr(invoice.total_tax)
        ),
    )
}

/// POST /api/invoices
///
/// Status comes from the reported flags alone; the graph reconciliation
/// does not touch dashboard records.
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(payload): Json<NewInvoice>,
) -> ApiResult<Json<InvoiceCreated>> {
    let match_status = MatchStatus::from_reported(payload.gstr1_reported, payload.gstr2b_reported);
    let total_tax = payload.total_tax();
    let vendor = vendors::find_vendor(&state.db, &payload.vendor_id).await?;

    let invoice = Invoice {
        id: invoices::next_invoice_id(&state.db).await?,
        vendor_name: vendor
            .as_ref()
            .map(|v| v.name.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
        gstin: vendor.map(|v| v.gstin).unwrap_or_default(),
        vendor_id: payload.vendor_id,
        date: payload.date,
        taxable_amount: payload.taxable_amount,
        cgst: payload.cgst,
        sgst: payload.sgst,
        igst: payload.igst,
        total_tax,
        total: payload.taxable_amount + total_tax,
        hsn: payload.hsn,
        period: payload.period,
        gstr1_reported: payload.gstr1_reported,
        gstr2b_reported: payload.gstr2b_reported,
        e_invoice: payload.e_invoice,
        e_way_bill: payload.e_way_bill,
        match_status,
        risk_level: RiskLevel::for_invoice(match_status, total_tax),
    };
    invoices::insert_invoice(&state.db, &invoice).await?;

    let alert = invoice_alert(&invoice);
    alerts::insert_alert(&state.db, &alert).await?;

    info!(invoice = %invoice.id, status = %invoice.match_status, "Invoice recorded");
    Ok(Json(InvoiceCreated { invoice, alert }))
}
