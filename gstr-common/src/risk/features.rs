//! Graph-derived compliance features
//!
//! Counts come from the vendor's invoices; centrality, community, e-invoice
//! rate, state risk and filing delay are precomputed scalars stored on the
//! vendor node, with neutral defaults when absent.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::graph::{is_mismatched, GraphStore, Label, Node};
use crate::Result;

/// Feature order used by [`ComplianceFeatures::to_vector`]
pub const FEATURE_NAMES: [&str; 8] = [
    "mismatch_count",
    "total_tax_at_risk",
    "filing_delay_days",
    "graph_centrality",
    "transaction_volume",
    "community_cluster",
    "einvoice_compliance_rate",
    "state_risk_factor",
];

const DEFAULT_CENTRALITY: f64 = 0.5;
const DEFAULT_EINVOICE_RATE: f64 = 0.9;
const DEFAULT_STATE_RISK: f64 = 0.5;

/// Fixed-shape feature vector for one vendor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplianceFeatures {
    pub mismatch_count: f64,
    pub total_tax_at_risk: f64,
    pub filing_delay_days: f64,
    pub graph_centrality: f64,
    pub transaction_volume: f64,
    pub community_cluster: f64,
    pub einvoice_compliance_rate: f64,
    pub state_risk_factor: f64,
}

impl Default for ComplianceFeatures {
    fn default() -> Self {
        Self {
            mismatch_count: 0.0,
            total_tax_at_risk: 0.0,
            filing_delay_days: 0.0,
            graph_centrality: DEFAULT_CENTRALITY,
            transaction_volume: 0.0,
            community_cluster: 0.0,
            einvoice_compliance_rate: DEFAULT_EINVOICE_RATE,
            state_risk_factor: DEFAULT_STATE_RISK,
        }
    }
}

impl ComplianceFeatures {
    pub fn to_vector(&self) -> [f64; 8] {
        [
            self.mismatch_count,
            self.total_tax_at_risk,
            self.filing_delay_days,
            self.graph_centrality,
            self.transaction_volume,
            self.community_cluster,
            self.einvoice_compliance_rate,
            self.state_risk_factor,
        ]
    }

    /// Scalars precomputed onto the vendor node
    fn from_vendor(vendor: &Node) -> Self {
        let defaults = Self::default();
        Self {
            filing_delay_days: vendor
                .get_f64("filing_delay_days")
                .unwrap_or(defaults.filing_delay_days),
            graph_centrality: vendor.get_f64("pagerank").unwrap_or(defaults.graph_centrality),
            community_cluster: vendor
                .get_f64("community_id")
                .unwrap_or(defaults.community_cluster),
            einvoice_compliance_rate: vendor
                .get_f64("einvoice_rate")
                .unwrap_or(defaults.einvoice_compliance_rate),
            state_risk_factor: vendor.get_f64("state_risk").unwrap_or(defaults.state_risk_factor),
            ..defaults
        }
    }

    fn add_invoice(&mut self, invoice: &Node) {
        self.transaction_volume += 1.0;
        if is_mismatched(invoice) {
            self.mismatch_count += 1.0;
            self.total_tax_at_risk += ["igst", "cgst", "sgst"]
                .iter()
                .filter_map(|k| invoice.get_f64(k))
                .sum::<f64>();
        }
    }
}

/// Features of one graph vendor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorFeatures {
    pub gstin: String,
    pub name: String,
    pub features: ComplianceFeatures,
}

/// Features for every vendor in the graph, ordered by GSTIN
pub async fn extract_features(graph: &GraphStore) -> Result<Vec<VendorFeatures>> {
    let mut by_gstin: BTreeMap<String, VendorFeatures> = graph
        .nodes_by_label(Label::Vendor)
        .await?
        .into_iter()
        .map(|vendor| {
            let features = VendorFeatures {
                gstin: vendor.key.clone(),
                name: vendor.get_str("name").unwrap_or_default().to_string(),
                features: ComplianceFeatures::from_vendor(&vendor),
            };
            (vendor.key, features)
        })
        .collect();

    for (vendor, invoice) in graph.issued_invoices().await? {
        if let Some(entry) = by_gstin.get_mut(&vendor.key) {
            entry.features.add_invoice(&invoice);
        }
    }

    Ok(by_gstin.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_in_memory;
    use crate::graph::{props, Properties, RelType};
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let f = ComplianceFeatures::default();
        assert_eq!(f.graph_centrality, 0.5);
        assert_eq!(f.einvoice_compliance_rate, 0.9);
        assert_eq!(f.state_risk_factor, 0.5);
        assert_eq!(f.to_vector().len(), FEATURE_NAMES.len());
    }

    #[tokio::test]
    async fn test_extract_features_counts_mismatched_invoices() {
        let graph = GraphStore::new(init_in_memory().await.unwrap());
        let vendor = graph
            .merge_node(
                Label::Vendor,
                "36AAACH7409R1ZK",
                props([("name", json!("Hyderabad Steels Pvt")), ("pagerank", json!(0.8))]),
            )
            .await
            .unwrap();
        graph
            .merge_node(Label::Vendor, "29AABCU9603R1ZM", Properties::new())
            .await
            .unwrap();

        for (number, status, igst) in [
            ("H-1", "Missing in GSTR-1", 120_600.0),
            ("H-2", "Matched", 10_000.0),
            ("H-3", "HSN Mismatch", 400.0),
        ] {
            let invoice = graph
                .merge_node(
                    Label::Invoice,
                    &format!("36AAACH7409R1ZK/{}", number),
                    props([("match_status", json!(status)), ("igst", json!(igst))]),
                )
                .await
                .unwrap();
            graph
                .merge_edge(vendor, RelType::IssuedInvoice, invoice, Properties::new())
                .await
                .unwrap();
        }

        let all = extract_features(&graph).await.unwrap();
        assert_eq!(all.len(), 2);

        // Ordered by GSTIN
        assert_eq!(all[0].gstin, "29AABCU9603R1ZM");
        assert_eq!(all[0].features.transaction_volume, 0.0);

        let h = &all[1].features;
        assert_eq!(all[1].name, "Hyderabad Steels Pvt");
        assert_eq!(h.transaction_volume, 3.0);
        assert_eq!(h.mismatch_count, 2.0);
        assert_eq!(h.total_tax_at_risk, 121_000.0);
        assert_eq!(h.graph_centrality, 0.8);
        assert_eq!(h.einvoice_compliance_rate, 0.9);
    }
}
