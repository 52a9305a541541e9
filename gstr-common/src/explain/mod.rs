//! Audit explanations for invoices, vendors and periods
//!
//! Facts always come from the graph. When an LLM is configured it writes the
//! narrative from those facts; otherwise, or when the call fails, a template
//! does.

pub mod client;
pub mod templates;

use serde::Serialize;
use tracing::warn;

use crate::config::LlmSettings;
use crate::graph::{invoice_key, GraphStore};
use crate::reconcile::ReconciliationEngine;
use crate::risk::{extract_features, ComplianceModel};
use crate::{Error, Result};

pub use client::LlmClient;

pub const TEMPLATE_SOURCE: &str = "Knowledge graph template";
pub const LLM_SOURCE: &str = "LLM grounded on knowledge graph";

const SYSTEM_PROMPT: &str = "You are a GST compliance auditor.";

/// A generated explanation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    /// Invoice key, vendor GSTIN or period
    pub subject: String,
    pub explanation: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

fn auditor_prompt(question: &str, context: &str) -> String {
    format!(
        "Based on the following data from the Knowledge Graph, provide a clear, factual audit explanation.\n\n\
         Question: {}\n\n\
         Knowledge Graph Data:\n{}\n\n\
         Provide:\n\
         1. A clear summary of why this is flagged\n\
         2. Specific evidence from the graph data\n\
         3. The relevant CGST Act section\n\
         4. A recommendation for the taxpayer\n\n\
         Use professional but readable language. Cite specific amounts in INR.",
        question, context
    )
}

pub struct Explainer {
    graph: GraphStore,
    model: ComplianceModel,
    llm: Option<LlmClient>,
}

impl Explainer {
    /// Template-only explainer
    pub fn new(graph: GraphStore, model: ComplianceModel) -> Self {
        Self {
            graph,
            model,
            llm: None,
        }
    }

    /// Use the LLM when the settings carry an API key
    pub fn with_settings(
        graph: GraphStore,
        model: ComplianceModel,
        settings: &LlmSettings,
    ) -> Result<Self> {
        let llm = match settings.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Some(LlmClient::new(settings)?),
            _ => None,
        };
        Ok(Self { graph, model, llm })
    }

    pub fn llm_enabled(&self) -> bool {
        self.llm.is_some()
    }

    async fn narrate<C: Serialize>(
        &self,
        subject: String,
        question: &str,
        context: &C,
        template: String,
    ) -> Explanation {
        if let Some(llm) = &self.llm {
            let attempt = match serde_json::to_string_pretty(context) {
                Ok(facts) => llm.chat(SYSTEM_PROMPT, &auditor_prompt(question, &facts)).await,
                Err(e) => Err(Error::Json(e)),
            };
            match attempt {
                Ok(text) => {
                    return Explanation {
                        subject,
                        explanation: text,
                        source: LLM_SOURCE.to_string(),
                        model: Some(llm.model().to_string()),
                    }
                }
                Err(e) => warn!("LLM explanation for {} failed, using template: {}", subject, e),
            }
        }

        Explanation {
            subject,
            explanation: template,
            source: TEMPLATE_SOURCE.to_string(),
            model: None,
        }
    }

    /// Why an invoice is (or is not) flagged
    pub async fn explain_invoice(&self, gstin: &str, invoice_number: &str) -> Result<Explanation> {
        let key = invoice_key(gstin, invoice_number);
        let ctx = self.graph.invoice_context(&key).await?;
        let template = templates::invoice_explanation(&ctx);
        let question = format!(
            "Why is invoice {} from GSTIN {} flagged for ITC risk?",
            invoice_number.trim(),
            gstin.trim()
        );
        Ok(self.narrate(key, &question, &ctx, template).await)
    }

    /// A vendor's compliance history and model risk
    pub async fn explain_vendor_risk(&self, gstin: &str) -> Result<Explanation> {
        let gstin = gstin.trim().to_uppercase();
        let ctx = self.graph.vendor_context(&gstin).await?;
        let features = extract_features(&self.graph)
            .await?
            .into_iter()
            .find(|v| v.gstin == gstin)
            .map(|v| v.features)
            .ok_or_else(|| Error::NotFound(format!("Vendor {}", gstin)))?;
        let (probability, level) = self.model.predict(&features);

        let template = templates::vendor_explanation(&ctx, &features, probability, level);
        let question = format!(
            "What is the compliance history of vendor with GSTIN {}? \
             Show their filing patterns and mismatch history.",
            gstin
        );

        #[derive(Serialize)]
        struct VendorFacts<'a> {
            vendor: &'a crate::graph::VendorContext,
            features: &'a crate::risk::ComplianceFeatures,
            risk_probability: f64,
            risk_level: crate::risk::ComplianceLevel,
        }
        let facts = VendorFacts {
            vendor: &ctx,
            features: &features,
            risk_probability: probability,
            risk_level: level,
        };

        Ok(self.narrate(gstin.clone(), &question, &facts, template).await)
    }

    /// ITC risk for a period, from a fresh reconciliation
    pub async fn explain_itc_claim(&self, period: &str) -> Result<Explanation> {
        let report = ReconciliationEngine::new(self.graph.clone())
            .full_reconciliation(period)
            .await?;
        let template = templates::period_explanation(&report);
        let question = format!(
            "Summarize the ITC risk for period {}. How many invoices are unmatched? \
             What is the total tax at risk? Which vendors are the biggest contributors?",
            period
        );
        Ok(self
            .narrate(period.to_string(), &question, &report, template)
            .await)
    }
}
