//! Matching rules over an in-memory view of one period

use std::collections::{BTreeMap, HashMap, HashSet};

use super::{
    classify_mismatch, Mismatch, MismatchKind, ReconciliationReport, EWAY_BILL_THRESHOLD,
    TAX_TOLERANCE,
};
use crate::graph::{FiledValues, Filing};
use crate::models::ReturnType;

/// One invoice with whatever each return of the period says about it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceFilings {
    pub invoice_number: String,
    pub gstin: String,
    pub vendor_name: String,
    pub gstr1: Option<FiledValues>,
    pub gstr2b: Option<FiledValues>,
}

impl InvoiceFilings {
    /// The buyer-side figures when present; they drive the ITC claim
    pub fn primary(&self) -> Option<&FiledValues> {
        self.gstr2b.as_ref().or(self.gstr1.as_ref())
    }

    pub fn in_both(&self) -> Option<(&FiledValues, &FiledValues)> {
        self.gstr1.as_ref().zip(self.gstr2b.as_ref())
    }
}

/// Everything reconciliation needs to know about one period
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodSnapshot {
    pub period: String,
    /// Keyed by invoice business key, ordered for stable output
    pub invoices: BTreeMap<String, InvoiceFilings>,
    /// Invoice keys with a `COVERS_SHIPMENT` edge
    pub eway_covered: HashSet<String>,
    /// Past non-matched invoices per vendor GSTIN
    pub vendor_history: HashMap<String, usize>,
}

impl PeriodSnapshot {
    pub fn new(
        period: &str,
        filings: Vec<Filing>,
        eway_covered: HashSet<String>,
        vendor_history: HashMap<String, usize>,
    ) -> Self {
        let mut invoices: BTreeMap<String, InvoiceFilings> = BTreeMap::new();
        for filing in filings {
            let entry = invoices.entry(filing.invoice_key).or_default();
            entry.invoice_number = filing.invoice_number;
            entry.gstin = filing.gstin;
            if !filing.vendor_name.is_empty() {
                entry.vendor_name = filing.vendor_name;
            }
            match filing.return_type {
                ReturnType::Gstr1 => entry.gstr1 = Some(filing.filed),
                ReturnType::Gstr2b => entry.gstr2b = Some(filing.filed),
            }
        }

        Self {
            period: period.to_string(),
            invoices,
            eway_covered,
            vendor_history,
        }
    }

    fn past_mismatches(&self, gstin: &str) -> usize {
        self.vendor_history.get(gstin).copied().unwrap_or(0)
    }

    fn mismatch(
        &self,
        key: &str,
        inv: &InvoiceFilings,
        kind: MismatchKind,
        values: &FiledValues,
        impact: f64,
    ) -> Mismatch {
        Mismatch {
            invoice_key: key.to_string(),
            invoice_number: inv.invoice_number.clone(),
            vendor_gstin: inv.gstin.clone(),
            vendor_name: inv.vendor_name.clone(),
            issue_type: kind,
            amount: values.taxable_value,
            tax: values.total_tax(),
            tax_difference: None,
            hsn_gstr1: None,
            hsn_gstr2b: None,
            impact,
            severity: classify_mismatch(impact, self.past_mismatches(&inv.gstin)),
        }
    }

    /// Claimed by the buyer (GSTR-2B) but never filed by the seller (GSTR-1)
    pub fn find_missing_invoices(&self) -> Vec<Mismatch> {
        self.invoices
            .iter()
            .filter_map(|(key, inv)| match (&inv.gstr1, &inv.gstr2b) {
                (None, Some(b)) => {
                    Some(self.mismatch(key, inv, MismatchKind::MissingInGstr1, b, b.total_tax()))
                }
                _ => None,
            })
            .collect()
    }

    /// Filed by the seller but absent from the buyer's GSTR-2B
    pub fn find_missing_in_gstr2b(&self) -> Vec<Mismatch> {
        self.invoices
            .iter()
            .filter_map(|(key, inv)| match (&inv.gstr1, &inv.gstr2b) {
                (Some(a), None) => {
                    Some(self.mismatch(key, inv, MismatchKind::MissingInGstr2b, a, a.total_tax()))
                }
                _ => None,
            })
            .collect()
    }

    /// In both returns with tax heads differing by more than the tolerance
    pub fn find_tax_mismatches(&self) -> Vec<Mismatch> {
        self.invoices
            .iter()
            .filter_map(|(key, inv)| {
                let (a, b) = inv.in_both()?;
                let difference = (a.cgst - b.cgst).abs()
                    + (a.sgst - b.sgst).abs()
                    + (a.igst - b.igst).abs();
                if difference <= TAX_TOLERANCE {
                    return None;
                }
                let mut m = self.mismatch(key, inv, MismatchKind::TaxAmountMismatch, b, difference);
                m.tax_difference = Some(difference);
                Some(m)
            })
            .collect()
    }

    /// In both returns with different, non-empty HSN codes
    pub fn find_hsn_mismatches(&self) -> Vec<Mismatch> {
        self.invoices
            .iter()
            .filter_map(|(key, inv)| {
                let (a, b) = inv.in_both()?;
                let (hsn1, hsn2) = (a.hsn.trim(), b.hsn.trim());
                if hsn1.is_empty() || hsn2.is_empty() || hsn1 == hsn2 {
                    return None;
                }
                let mut m = self.mismatch(key, inv, MismatchKind::HsnMismatch, b, b.total_tax());
                m.hsn_gstr1 = Some(hsn1.to_string());
                m.hsn_gstr2b = Some(hsn2.to_string());
                Some(m)
            })
            .collect()
    }

    /// Above the e-Way Bill threshold with no bill covering the shipment
    pub fn find_missing_ewaybills(&self) -> Vec<Mismatch> {
        self.invoices
            .iter()
            .filter(|(key, _)| !self.eway_covered.contains(key.as_str()))
            .filter_map(|(key, inv)| {
                let values = inv.primary()?;
                if values.taxable_value <= EWAY_BILL_THRESHOLD {
                    return None;
                }
                Some(self.mismatch(
                    key,
                    inv,
                    MismatchKind::EWayBillMissing,
                    values,
                    values.total_tax(),
                ))
            })
            .collect()
    }

    /// Every finding, ranked by financial impact
    pub fn full_reconciliation(&self) -> ReconciliationReport {
        let mut all = self.find_missing_invoices();
        all.extend(self.find_missing_in_gstr2b());
        all.extend(self.find_tax_mismatches());
        all.extend(self.find_hsn_mismatches());
        all.extend(self.find_missing_ewaybills());
        ReconciliationReport::from_findings(&self.period, all)
    }
}
