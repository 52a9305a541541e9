//! Graph-backed reconciliation

use serde::Serialize;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use tracing::info;

use super::{Mismatch, MismatchKind, PeriodSnapshot, ReconciliationReport};
use crate::graph::{GraphStore, Label, RelType};
use crate::ingest::validate_period;
use crate::models::MatchStatus;
use crate::Result;

/// Outcome of writing statuses back to invoice nodes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub matched: usize,
    pub mismatched: usize,
}

/// Reconciles periods stored in the graph
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    graph: GraphStore,
}

impl ReconciliationEngine {
    pub fn new(graph: GraphStore) -> Self {
        Self { graph }
    }

    /// Read everything reconciliation needs for one period
    pub async fn snapshot(&self, period: &str) -> Result<PeriodSnapshot> {
        validate_period(period)?;
        let filings = self.graph.period_filings(period).await?;
        let eway_covered = self
            .graph
            .invoices_with_relation(RelType::CoversShipment)
            .await?;
        // History comes from other periods only
        let in_period: HashSet<String> = filings.iter().map(|f| f.invoice_key.clone()).collect();
        let history = self.graph.vendor_mismatch_history(&in_period).await?;
        Ok(PeriodSnapshot::new(period, filings, eway_covered, history))
    }

    pub async fn find_missing_invoices(&self, period: &str) -> Result<Vec<Mismatch>> {
        Ok(self.snapshot(period).await?.find_missing_invoices())
    }

    pub async fn find_missing_in_gstr2b(&self, period: &str) -> Result<Vec<Mismatch>> {
        Ok(self.snapshot(period).await?.find_missing_in_gstr2b())
    }

    pub async fn find_tax_mismatches(&self, period: &str) -> Result<Vec<Mismatch>> {
        Ok(self.snapshot(period).await?.find_tax_mismatches())
    }

    pub async fn find_hsn_mismatches(&self, period: &str) -> Result<Vec<Mismatch>> {
        Ok(self.snapshot(period).await?.find_hsn_mismatches())
    }

    pub async fn find_missing_ewaybills(&self, period: &str) -> Result<Vec<Mismatch>> {
        Ok(self.snapshot(period).await?.find_missing_ewaybills())
    }

    /// Every finding for the period, ranked by impact
    pub async fn full_reconciliation(&self, period: &str) -> Result<ReconciliationReport> {
        let report = self.snapshot(period).await?.full_reconciliation();
        info!(
            "Reconciled {}: {} mismatches, ITC at risk {:.2}",
            report.period, report.total_mismatches, report.itc_at_risk
        );
        Ok(report)
    }

    /// Persist `match_status` on every invoice reported in the period
    ///
    /// Invoices with several findings take the status of the first kind in
    /// [`MismatchKind`] order; invoices in both returns without findings
    /// become `Matched`.
    pub async fn apply_statuses(&self, report: &ReconciliationReport) -> Result<StatusSummary> {
        let mut flagged: HashMap<&str, MismatchKind> = HashMap::new();
        for m in &report.mismatches {
            flagged
                .entry(m.invoice_key.as_str())
                .and_modify(|kind| *kind = (*kind).min(m.issue_type))
                .or_insert(m.issue_type);
        }

        let snapshot = self.snapshot(&report.period).await?;
        let mut summary = StatusSummary::default();

        for (key, filings) in &snapshot.invoices {
            let status = match flagged.get(key.as_str()) {
                Some(kind) => {
                    summary.mismatched += 1;
                    kind.status()
                }
                None if filings.in_both().is_some() => {
                    summary.matched += 1;
                    MatchStatus::Matched
                }
                None => continue,
            };

            if let Some(node) = self.graph.find_node(Label::Invoice, key).await? {
                self.graph
                    .set_node_property(node.id, "match_status", json!(status.as_str()))
                    .await?;
            }
        }

        info!(
            "Applied statuses for {}: {} matched, {} mismatched",
            report.period, summary.matched, summary.mismatched
        );
        Ok(summary)
    }

    /// Reconcile a period and persist the statuses; returns the matched count
    pub async fn run_matching(&self, period: &str) -> Result<usize> {
        let report = self.full_reconciliation(period).await?;
        Ok(self.apply_statuses(&report).await?.matched)
    }
}
