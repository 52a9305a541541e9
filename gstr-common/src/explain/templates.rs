//! Deterministic explanations built from graph facts

use std::collections::BTreeMap;

use crate::graph::{InvoiceContext, VendorContext};
use crate::models::{format_inr, MatchStatus, ReturnType};
use crate::reconcile::ReconciliationReport;
use crate::risk::{ComplianceFeatures, ComplianceLevel};

fn vendor_label(name: Option<&str>) -> &str {
    match name {
        Some(n) if !n.trim().is_empty() => n,
        _ => "Unknown vendor",
    }
}

pub fn invoice_explanation(ctx: &InvoiceContext) -> String {
    let number = ctx
        .invoice
        .get_str("invoice_number")
        .unwrap_or(ctx.invoice.key.as_str());
    let amount = ctx.invoice.get_f64("taxable_value").unwrap_or(0.0);
    let vendor = vendor_label(ctx.vendor.as_ref().and_then(|v| v.get_str("name")));
    let gstin = ctx
        .vendor
        .as_ref()
        .map(|v| v.key.as_str())
        .or_else(|| ctx.invoice.get_str("supplier_gstin"))
        .unwrap_or("unknown");

    let mut text = format!(
        "Invoice {} (₹{}) from {} (GSTIN: {}) ",
        number,
        format_inr(amount),
        vendor,
        gstin
    );

    let in_gstr1 = ctx.reported_in(ReturnType::Gstr1);
    let in_gstr2b = ctx.reported_in(ReturnType::Gstr2b);

    if in_gstr2b && !in_gstr1 {
        text.push_str("appears in GSTR-2B but is MISSING from the vendor's GSTR-1 filing. ");
        text.push_str(
            "ITC cannot be claimed under Section 16(2)(aa) CGST Act until the vendor reports this invoice.",
        );
    } else if ctx.match_status() == Some(MatchStatus::TaxAmountMismatch) {
        text.push_str("shows conflicting tax amounts between GSTR-1 and GSTR-2B. ");
        text.push_str("The correct amount must be reconciled before claiming ITC.");
    } else {
        let status = ctx
            .invoice
            .get_str("match_status")
            .unwrap_or("Not reconciled");
        text.push_str(&format!("status: {}.", status));
    }

    text
}

pub fn vendor_explanation(
    ctx: &VendorContext,
    features: &ComplianceFeatures,
    probability: f64,
    level: ComplianceLevel,
) -> String {
    let vendor = vendor_label(ctx.vendor.get_str("name"));
    let flagged: Vec<_> = ctx.mismatched().collect();

    let mut text = format!(
        "Vendor {} (GSTIN: {}) has {} invoice(s) in the knowledge graph",
        vendor,
        ctx.vendor.key,
        ctx.invoices.len()
    );

    if flagged.is_empty() {
        text.push_str(" and none were flagged in reconciliation. ");
    } else {
        let mut by_status: BTreeMap<&str, usize> = BTreeMap::new();
        for inv in &flagged {
            *by_status
                .entry(inv.get_str("match_status").unwrap_or_default())
                .or_insert(0) += 1;
        }
        let breakdown: Vec<String> = by_status
            .iter()
            .map(|(status, n)| format!("{} {}", n, status))
            .collect();
        text.push_str(&format!(
            "; {} were flagged in reconciliation ({}), putting ₹{} of ITC at risk. ",
            flagged.len(),
            breakdown.join(", "),
            format_inr(features.total_tax_at_risk)
        ));
    }

    text.push_str(&format!(
        "Compliance model risk: {:.0}% ({:?}).",
        probability * 100.0,
        level
    ));
    text
}

pub fn period_explanation(report: &ReconciliationReport) -> String {
    if report.total_mismatches == 0 {
        return format!(
            "Period {}: every invoice reported in GSTR-1 and GSTR-2B reconciles. No ITC is at risk.",
            report.period
        );
    }

    let counts = &report.by_type;
    let parts: Vec<String> = [
        (counts.missing_in_gstr1, "missing in GSTR-1"),
        (counts.missing_in_gstr2b, "missing in GSTR-2B"),
        (counts.tax_amount_mismatch, "tax amount mismatch"),
        (counts.hsn_mismatch, "HSN mismatch"),
        (counts.eway_bill_missing, "e-Way Bill missing"),
    ]
    .iter()
    .filter(|(n, _)| *n > 0)
    .map(|(n, label)| format!("{} {}", n, label))
    .collect();

    let mut text = format!(
        "Period {}: {} mismatch(es) with ₹{} of ITC at risk ({}). ",
        report.period,
        report.total_mismatches,
        format_inr(report.itc_at_risk),
        parts.join(", ")
    );

    // Contribution per vendor: largest impact of each of its invoices
    let mut worst_per_invoice: BTreeMap<&str, (&str, f64)> = BTreeMap::new();
    for m in &report.mismatches {
        let name = if m.vendor_name.is_empty() {
            m.vendor_gstin.as_str()
        } else {
            m.vendor_name.as_str()
        };
        let entry = worst_per_invoice
            .entry(m.invoice_key.as_str())
            .or_insert((name, 0.0));
        if m.impact > entry.1 {
            entry.1 = m.impact;
        }
    }
    let mut by_vendor: BTreeMap<&str, f64> = BTreeMap::new();
    for &(vendor, impact) in worst_per_invoice.values() {
        *by_vendor.entry(vendor).or_insert(0.0) += impact;
    }
    let mut ranked: Vec<(&str, f64)> = by_vendor.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let top: Vec<String> = ranked
        .iter()
        .take(3)
        .map(|(vendor, impact)| format!("{} (₹{})", vendor, format_inr(*impact)))
        .collect();
    text.push_str(&format!("Largest contributors: {}.", top.join(", ")));

    text
}
