//! Reconciliation of seller (GSTR-1) and buyer (GSTR-2B) returns
//!
//! Invoices are matched across the two returns of a period by business key
//! (supplier GSTIN + invoice number). Each discrepancy becomes a [`Mismatch`]
//! with a severity and a financial impact, the ITC in question.
//!
//! The matching rules live in [`snapshot`] and run on plain data; the
//! [`engine`] reads snapshots from the graph and writes statuses back.

pub mod engine;
pub mod snapshot;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::models::MatchStatus;

pub use engine::{ReconciliationEngine, StatusSummary};
pub use snapshot::{InvoiceFilings, PeriodSnapshot};

/// Tax differences up to this many rupees are rounding, not mismatches
pub const TAX_TOLERANCE: f64 = 1.0;

/// Consignments above this taxable value need an e-Way Bill
pub const EWAY_BILL_THRESHOLD: f64 = 50_000.0;

/// Kinds of discrepancy, in the order a status is assigned when an invoice
/// has several
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MismatchKind {
    #[serde(rename = "Missing in GSTR-1")]
    MissingInGstr1,
    #[serde(rename = "Missing in GSTR-2B")]
    MissingInGstr2b,
    #[serde(rename = "Tax Amount Mismatch")]
    TaxAmountMismatch,
    #[serde(rename = "HSN Mismatch")]
    HsnMismatch,
    #[serde(rename = "E-Way Bill Missing")]
    EWayBillMissing,
}

impl MismatchKind {
    pub fn status(&self) -> MatchStatus {
        match self {
            MismatchKind::MissingInGstr1 => MatchStatus::MissingInGstr1,
            MismatchKind::MissingInGstr2b => MatchStatus::MissingInGstr2b,
            MismatchKind::TaxAmountMismatch => MatchStatus::TaxAmountMismatch,
            MismatchKind::HsnMismatch => MatchStatus::HsnMismatch,
            MismatchKind::EWayBillMissing => MatchStatus::EWayBillMissing,
        }
    }
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status().as_str())
    }
}

/// Audit priority of a mismatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "High Risk")]
    High,
    #[serde(rename = "Medium Risk")]
    Medium,
    #[serde(rename = "Low Risk")]
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "High Risk",
            Severity::Medium => "Medium Risk",
            Severity::Low => "Low Risk",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule-based severity: the tax at stake first, then the vendor's record
pub fn classify_mismatch(tax: f64, past_mismatches: usize) -> Severity {
    if tax > 100_000.0 || past_mismatches > 5 {
        Severity::High
    } else if tax > 50_000.0 || past_mismatches > 2 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// One discrepancy found for one invoice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    pub invoice_key: String,
    pub invoice_number: String,
    pub vendor_gstin: String,
    pub vendor_name: String,
    pub issue_type: MismatchKind,
    /// Taxable value
    pub amount: f64,
    /// Total tax on the invoice
    pub tax: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_difference: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hsn_gstr1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hsn_gstr2b: Option<String>,
    /// ITC in question
    pub impact: f64,
    pub severity: Severity,
}

/// Finding counts per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MismatchCounts {
    pub missing_in_gstr1: usize,
    pub missing_in_gstr2b: usize,
    pub tax_amount_mismatch: usize,
    pub hsn_mismatch: usize,
    pub eway_bill_missing: usize,
}

impl MismatchCounts {
    pub fn tally<'a>(mismatches: impl IntoIterator<Item = &'a Mismatch>) -> Self {
        let mut counts = Self::default();
        for m in mismatches {
            match m.issue_type {
                MismatchKind::MissingInGstr1 => counts.missing_in_gstr1 += 1,
                MismatchKind::MissingInGstr2b => counts.missing_in_gstr2b += 1,
                MismatchKind::TaxAmountMismatch => counts.tax_amount_mismatch += 1,
                MismatchKind::HsnMismatch => counts.hsn_mismatch += 1,
                MismatchKind::EWayBillMissing => counts.eway_bill_missing += 1,
            }
        }
        counts
    }
}

/// Result of reconciling one period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationReport {
    pub period: String,
    pub total_mismatches: usize,
    pub by_type: MismatchCounts,
    /// Largest impact per invoice, summed over invoices
    pub itc_at_risk: f64,
    /// Ranked by impact, highest first
    pub mismatches: Vec<Mismatch>,
}

impl ReconciliationReport {
    /// Rank findings and compute the totals
    pub fn from_findings(period: &str, mut mismatches: Vec<Mismatch>) -> Self {
        rank_by_impact(&mut mismatches);

        let mut worst: HashMap<&str, f64> = HashMap::new();
        for m in &mismatches {
            let entry = worst.entry(m.invoice_key.as_str()).or_insert(0.0);
            if m.impact > *entry {
                *entry = m.impact;
            }
        }
        let itc_at_risk = worst.values().sum();

        Self {
            period: period.to_string(),
            total_mismatches: mismatches.len(),
            by_type: MismatchCounts::tally(&mismatches),
            itc_at_risk,
            mismatches,
        }
    }

    pub fn high_risk_count(&self) -> usize {
        self.mismatches
            .iter()
            .filter(|m| m.severity == Severity::High)
            .count()
    }
}

/// Impact descending; ties by invoice key, then kind
pub fn rank_by_impact(mismatches: &mut [Mismatch]) {
    mismatches.sort_by(|a, b| {
        b.impact
            .total_cmp(&a.impact)
            .then_with(|| a.invoice_key.cmp(&b.invoice_key))
            .then_with(|| a.issue_type.cmp(&b.issue_type))
    });
}
