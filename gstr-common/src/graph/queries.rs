//! Fixed-shape reads over the reconciliation graph
//!
//! Each query is one or two hops from a known starting point; nothing here
//! is parameterized by schema.

use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::collections::{HashMap, HashSet};

use super::store::{node_from_row, GraphStore};
use super::types::{Label, Node, NodeId, Properties, RelType};
use crate::models::{MatchStatus, ReturnType};
use crate::{Error, Result};

/// Invoice values exactly as filed in one return (the `REPORTED_IN` edge)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FiledValues {
    #[serde(default)]
    pub taxable_value: f64,
    #[serde(default)]
    pub igst: f64,
    #[serde(default)]
    pub cgst: f64,
    #[serde(default)]
    pub sgst: f64,
    #[serde(default)]
    pub hsn: String,
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub itc_available: Option<String>,
}

impl FiledValues {
    pub fn total_tax(&self) -> f64 {
        self.igst + self.cgst + self.sgst
    }
}

/// One invoice as reported in one return of a period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Filing {
    pub return_type: ReturnType,
    pub invoice_key: String,
    pub invoice_number: String,
    pub gstin: String,
    pub vendor_name: String,
    pub filed: FiledValues,
}

/// A return that reported an invoice, with the as-filed values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnFiling {
    pub return_type: String,
    pub period: String,
    pub filed: Properties,
}

/// Everything the graph knows about one invoice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceContext {
    pub invoice: Node,
    pub vendor: Option<Node>,
    pub filings: Vec<ReturnFiling>,
    pub e_invoices: Vec<Node>,
    pub eway_bills: Vec<Node>,
}

impl InvoiceContext {
    pub fn reported_in(&self, return_type: ReturnType) -> bool {
        self.filings
            .iter()
            .any(|f| f.return_type == return_type.as_str())
    }

    pub fn match_status(&self) -> Option<MatchStatus> {
        self.invoice.get_str("match_status").and_then(|s| s.parse().ok())
    }
}

/// A vendor and every invoice it issued
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorContext {
    pub vendor: Node,
    pub invoices: Vec<Node>,
}

impl VendorContext {
    /// Invoices whose last reconciliation found a problem
    pub fn mismatched(&self) -> impl Iterator<Item = &Node> {
        self.invoices.iter().filter(|inv| is_mismatched(inv))
    }
}

/// Whether an invoice node carries a non-`Matched` status
pub fn is_mismatched(invoice: &Node) -> bool {
    matches!(invoice.get_str("match_status"), Some(status) if status != MatchStatus::Matched.as_str())
}

impl GraphStore {
    /// Every `REPORTED_IN` edge into the GSTR-1 and GSTR-2B nodes of a period
    pub async fn period_filings(&self, period: &str) -> Result<Vec<Filing>> {
        let gstr1_key = ReturnType::Gstr1.node_key(period);
        let gstr2b_key = ReturnType::Gstr2b.node_key(period);

        let rows = sqlx::query(
            r#"
            SELECT g.node_key AS return_key,
                   inv.node_key AS invoice_key,
                   inv.properties AS invoice_props,
                   e.properties AS filed_props,
                   v.node_key AS vendor_key,
                   v.properties AS vendor_props
            FROM graph_nodes g
            JOIN graph_edges e ON e.dst = g.id AND e.rel_type = ?
            JOIN graph_nodes inv ON inv.id = e.src AND inv.label = ?
            LEFT JOIN graph_edges iss ON iss.dst = inv.id AND iss.rel_type = ?
            LEFT JOIN graph_nodes v ON v.id = iss.src AND v.label = ?
            WHERE g.label = ? AND g.node_key IN (?, ?)
            ORDER BY inv.node_key, g.node_key
            "#,
        )
        .bind(RelType::ReportedIn.as_str())
        .bind(Label::Invoice.as_str())
        .bind(RelType::IssuedInvoice.as_str())
        .bind(Label::Vendor.as_str())
        .bind(Label::Gstr.as_str())
        .bind(&gstr1_key)
        .bind(&gstr2b_key)
        .fetch_all(self.pool())
        .await?;

        let mut filings = Vec::with_capacity(rows.len());
        for row in &rows {
            let return_key: String = row.get("return_key");
            let return_type = if return_key == gstr1_key {
                ReturnType::Gstr1
            } else {
                ReturnType::Gstr2b
            };

            let invoice_raw: String = row.get("invoice_props");
            let filed_raw: String = row.get("filed_props");
            let invoice_props: Properties = serde_json::from_str(&invoice_raw)?;
            let filed: FiledValues = serde_json::from_str(&filed_raw)?;
            let vendor_props: Option<String> = row.get("vendor_props");
            let vendor_name = match vendor_props {
                Some(raw) => serde_json::from_str::<Properties>(&raw)?
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                None => String::new(),
            };

            let invoice_key: String = row.get("invoice_key");
            let vendor_key: Option<String> = row.get("vendor_key");
            let gstin = vendor_key.unwrap_or_else(|| {
                invoice_key
                    .split_once('/')
                    .map(|(g, _)| g.to_string())
                    .unwrap_or_default()
            });

            filings.push(Filing {
                return_type,
                invoice_number: invoice_props
                    .get("invoice_number")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                invoice_key,
                gstin,
                vendor_name,
                filed,
            });
        }

        Ok(filings)
    }

    /// Keys of invoices having at least one outgoing edge of `rel`
    pub async fn invoices_with_relation(&self, rel: RelType) -> Result<HashSet<String>> {
        let keys: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT n.node_key
            FROM graph_edges e
            JOIN graph_nodes n ON n.id = e.src
            WHERE e.rel_type = ? AND n.label = ?
            "#,
        )
        .bind(rel.as_str())
        .bind(Label::Invoice.as_str())
        .fetch_all(self.pool())
        .await?;

        Ok(keys.into_iter().collect())
    }

    /// Every `(vendor, invoice)` pair joined by `ISSUED_INVOICE`
    pub async fn issued_invoices(&self) -> Result<Vec<(Node, Node)>> {
        let rows = sqlx::query(
            r#"
            SELECT v.id AS v_id, v.node_key AS v_key, v.properties AS v_props,
                   i.id, i.label, i.node_key, i.properties
            FROM graph_edges e
            JOIN graph_nodes v ON v.id = e.src AND v.label = ?
            JOIN graph_nodes i ON i.id = e.dst AND i.label = ?
            WHERE e.rel_type = ?
            ORDER BY v.node_key, i.node_key
            "#,
        )
        .bind(Label::Vendor.as_str())
        .bind(Label::Invoice.as_str())
        .bind(RelType::IssuedInvoice.as_str())
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| {
                let vendor_raw: String = row.get("v_props");
                let vendor = Node {
                    id: NodeId(row.get("v_id")),
                    label: Label::Vendor,
                    key: row.get("v_key"),
                    properties: serde_json::from_str(&vendor_raw)?,
                };
                Ok((vendor, node_from_row(row)?))
            })
            .collect()
    }

    /// Per vendor GSTIN, the number of invoices with a non-`Matched` status
    ///
    /// Invoices whose keys are in `exclude` are not counted, so a period's
    /// own saved statuses never feed back into its severities.
    pub async fn vendor_mismatch_history(
        &self,
        exclude: &HashSet<String>,
    ) -> Result<HashMap<String, usize>> {
        let mut history = HashMap::new();
        for (vendor, invoice) in self.issued_invoices().await? {
            if is_mismatched(&invoice) && !exclude.contains(&invoice.key) {
                *history.entry(vendor.key).or_insert(0) += 1;
            }
        }
        Ok(history)
    }

    /// The invoice node with its vendor, filings and shipment documents
    pub async fn invoice_context(&self, invoice_key: &str) -> Result<InvoiceContext> {
        let invoice = self
            .find_node(Label::Invoice, invoice_key)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Invoice {}", invoice_key)))?;

        let vendor = self
            .incoming(invoice.id, RelType::IssuedInvoice)
            .await?
            .into_iter()
            .map(|(_, node)| node)
            .next();

        let filings = self
            .outgoing(invoice.id, RelType::ReportedIn)
            .await?
            .into_iter()
            .map(|(edge, gstr)| ReturnFiling {
                return_type: gstr.get_str("type").unwrap_or_default().to_string(),
                period: gstr.get_str("period").unwrap_or_default().to_string(),
                filed: edge.properties,
            })
            .collect();

        let e_invoices = self
            .outgoing(invoice.id, RelType::ElectronicVersion)
            .await?
            .into_iter()
            .map(|(_, node)| node)
            .collect();

        let eway_bills = self
            .outgoing(invoice.id, RelType::CoversShipment)
            .await?
            .into_iter()
            .map(|(_, node)| node)
            .collect();

        Ok(InvoiceContext {
            invoice,
            vendor,
            filings,
            e_invoices,
            eway_bills,
        })
    }

    /// The vendor node and all of its invoices
    pub async fn vendor_context(&self, gstin: &str) -> Result<VendorContext> {
        let vendor = self
            .find_node(Label::Vendor, gstin)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Vendor {}", gstin)))?;

        let invoices = self
            .outgoing(vendor.id, RelType::IssuedInvoice)
            .await?
            .into_iter()
            .map(|(_, node)| node)
            .collect();

        Ok(VendorContext { vendor, invoices })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_in_memory;
    use crate::graph::types::props;
    use serde_json::json;

    async fn graph_with_one_invoice() -> GraphStore {
        let graph = GraphStore::new(init_in_memory().await.unwrap());
        let vendor = graph
            .merge_node(Label::Vendor, "29AABCU9603R1ZM", props([("name", json!("Tata Steel"))]))
            .await
            .unwrap();
        let invoice = graph
            .merge_node(
                Label::Invoice,
                "29AABCU9603R1ZM/T-1",
                props([("invoice_number", json!("T-1")), ("match_status", json!("HSN Mismatch"))]),
            )
            .await
            .unwrap();
        let gstr1 = graph
            .merge_node(
                Label::Gstr,
                "GSTR-1:2025-07",
                props([("type", json!("GSTR-1")), ("period", json!("2025-07"))]),
            )
            .await
            .unwrap();
        graph
            .merge_edge(vendor, RelType::IssuedInvoice, invoice, Properties::new())
            .await
            .unwrap();
        graph
            .merge_edge(
                invoice,
                RelType::ReportedIn,
                gstr1,
                props([("taxable_value", json!(100.0)), ("igst", json!(18.0)), ("hsn", json!("7208"))]),
            )
            .await
            .unwrap();
        graph
    }

    #[tokio::test]
    async fn test_period_filings_joins_vendor() {
        let graph = graph_with_one_invoice().await;

        let filings = graph.period_filings("2025-07").await.unwrap();
        assert_eq!(filings.len(), 1);
        let f = &filings[0];
        assert_eq!(f.return_type, ReturnType::Gstr1);
        assert_eq!(f.invoice_number, "T-1");
        assert_eq!(f.gstin, "29AABCU9603R1ZM");
        assert_eq!(f.vendor_name, "Tata Steel");
        assert_eq!(f.filed.total_tax(), 18.0);
        assert_eq!(f.filed.hsn, "7208");

        assert!(graph.period_filings("2025-08").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_vendor_history_and_relations() {
        let graph = graph_with_one_invoice().await;

        let history = graph.vendor_mismatch_history(&HashSet::new()).await.unwrap();
        assert_eq!(history.get("29AABCU9603R1ZM"), Some(&1));

        let exclude: HashSet<String> = ["29AABCU9603R1ZM/T-1".to_string()].into();
        let history = graph.vendor_mismatch_history(&exclude).await.unwrap();
        assert!(history.get("29AABCU9603R1ZM").is_none());

        let reported = graph.invoices_with_relation(RelType::ReportedIn).await.unwrap();
        assert!(reported.contains("29AABCU9603R1ZM/T-1"));
        assert!(graph
            .invoices_with_relation(RelType::CoversShipment)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_invoice_context() {
        let graph = graph_with_one_invoice().await;

        let ctx = graph.invoice_context("29AABCU9603R1ZM/T-1").await.unwrap();
        assert_eq!(ctx.vendor.as_ref().map(|v| v.key.as_str()), Some("29AABCU9603R1ZM"));
        assert!(ctx.reported_in(ReturnType::Gstr1));
        assert!(!ctx.reported_in(ReturnType::Gstr2b));
        assert_eq!(ctx.match_status(), Some(MatchStatus::HsnMismatch));
        assert!(ctx.eway_bills.is_empty());

        let missing = graph.invoice_context("NOPE/1").await;
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }
}
