//! Loading return filings and shipment documents into the graph
//!
//! Every document is validated in full before anything is written, and the
//! writes for one document share a transaction, so a failure leaves the
//! graph as it was. All writes are merges: loading the same file twice
//! leaves the graph unchanged.

pub mod formats;

use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use crate::graph::{invoice_key, props, GraphStore, GraphTx, Label, NodeId, Properties, RelType};
use crate::models::ReturnType;
use crate::{Error, Result};

pub use formats::{
    EInvoiceRecord, EWayBillRecord, Gstr1Document, Gstr2bDocument,
};

/// Outcome of one ingestion call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    /// `GSTR-1`, `GSTR-2B`, `e-Invoice` or `e-Way Bill`
    pub document: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    pub vendors: usize,
    pub invoices: usize,
    /// Records read from the document
    pub records: usize,
}

impl IngestSummary {
    fn new(document: &str, period: Option<&str>) -> Self {
        Self {
            document: document.to_string(),
            period: period.map(str::to_string),
            vendors: 0,
            invoices: 0,
            records: 0,
        }
    }

    fn log(&self) {
        match &self.period {
            Some(period) => info!(
                "Ingested {} for {}: {} records, {} invoices, {} vendors",
                self.document, period, self.records, self.invoices, self.vendors
            ),
            None => info!(
                "Ingested {}: {} records, {} invoices, {} vendors",
                self.document, self.records, self.invoices, self.vendors
            ),
        }
    }
}

/// Reject anything but `YYYY-MM` with a real month
pub fn validate_period(period: &str) -> Result<()> {
    let bytes = period.as_bytes();
    let shaped = bytes.len() == 7
        && bytes[4] == b'-'
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[5..].iter().all(u8::is_ascii_digit);
    let month = period.get(5..).and_then(|m| m.parse::<u32>().ok());

    if shaped && matches!(month, Some(1..=12)) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "Period must be YYYY-MM, got '{}'",
            period
        )))
    }
}

/// Normalize a GSTIN to upper case, rejecting anything but 15 alphanumerics
pub fn normalize_gstin(gstin: &str) -> Result<String> {
    let gstin = gstin.trim().to_uppercase();
    if gstin.len() == 15 && gstin.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(gstin)
    } else {
        Err(Error::InvalidInput(format!("Invalid GSTIN '{}'", gstin)))
    }
}

fn require_number(kind: &str, number: &str) -> Result<()> {
    if number.trim().is_empty() {
        Err(Error::InvalidInput(format!("{} without an invoice number", kind)))
    } else {
        Ok(())
    }
}

/// Read a JSON document from disk
pub fn load_document<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

async fn merge_return_node(
    tx: &mut GraphTx,
    return_type: ReturnType,
    period: &str,
) -> Result<NodeId> {
    tx.merge_node(
        Label::Gstr,
        &return_type.node_key(period),
        props([
            ("type", json!(return_type.as_str())),
            ("period", json!(period)),
        ]),
    )
    .await
}

/// Vendor and invoice nodes for a business key, linked by `ISSUED_INVOICE`
async fn merge_vendor_invoice(
    tx: &mut GraphTx,
    gstin: &str,
    vendor_props: Properties,
    number: &str,
    invoice_props: Properties,
) -> Result<NodeId> {
    let vendor = tx.merge_node(Label::Vendor, gstin, vendor_props).await?;

    let mut base = props([
        ("invoice_number", json!(number.trim())),
        ("supplier_gstin", json!(gstin)),
    ]);
    base.extend(invoice_props);
    let invoice = tx
        .merge_node(Label::Invoice, &invoice_key(gstin, number), base)
        .await?;

    tx.merge_edge(vendor, RelType::IssuedInvoice, invoice, Properties::new())
        .await?;
    Ok(invoice)
}

/// Load a seller's GSTR-1 for one period
pub async fn ingest_gstr1(
    graph: &GraphStore,
    doc: &Gstr1Document,
    period: &str,
) -> Result<IngestSummary> {
    validate_period(period)?;
    let mut parties = Vec::with_capacity(doc.b2b.len());
    for party in &doc.b2b {
        let gstin = normalize_gstin(&party.ctin)?;
        for inv in &party.inv {
            require_number("GSTR-1 invoice", &inv.inum)?;
        }
        parties.push((gstin, party));
    }

    let mut tx = graph.begin().await?;
    let gstr = merge_return_node(&mut tx, ReturnType::Gstr1, period).await?;
    let mut summary = IngestSummary::new(ReturnType::Gstr1.as_str(), Some(period));
    let mut vendors = HashSet::new();
    let mut invoices = HashSet::new();

    for (gstin, party) in parties {
        vendors.insert(gstin.clone());
        for inv in &party.inv {
            let mut invoice_props = props([
                ("date", json!(inv.idt)),
                ("taxable_value", json!(inv.val)),
                ("tax_rate", json!(inv.rt)),
                ("igst", json!(inv.iamt)),
                ("cgst", json!(inv.camt)),
                ("sgst", json!(inv.samt)),
            ]);
            if !inv.hsn.is_empty() {
                invoice_props.insert("hsn".to_string(), json!(inv.hsn));
            }

            let invoice =
                merge_vendor_invoice(&mut tx, &gstin, Properties::new(), &inv.inum, invoice_props)
                    .await?;

            let filed = props([
                ("taxable_value", json!(inv.val)),
                ("igst", json!(inv.iamt)),
                ("cgst", json!(inv.camt)),
                ("sgst", json!(inv.samt)),
                ("hsn", json!(inv.hsn)),
                ("date", json!(inv.idt)),
            ]);
            tx.merge_edge(invoice, RelType::ReportedIn, gstr, filed)
                .await?;

            invoices.insert(invoice_key(&gstin, &inv.inum));
            summary.records += 1;
        }
    }

    tx.commit().await?;
    summary.vendors = vendors.len();
    summary.invoices = invoices.len();
    summary.log();
    Ok(summary)
}

/// Load a buyer's auto-populated GSTR-2B for one period
pub async fn ingest_gstr2b(
    graph: &GraphStore,
    doc: &Gstr2bDocument,
    period: &str,
) -> Result<IngestSummary> {
    validate_period(period)?;
    let mut suppliers = Vec::with_capacity(doc.docdata.b2b.len());
    for supplier in &doc.docdata.b2b {
        let gstin = normalize_gstin(&supplier.ctin)?;
        for inv in &supplier.inv {
            require_number("GSTR-2B invoice", &inv.inum)?;
        }
        suppliers.push((gstin, supplier));
    }

    let mut tx = graph.begin().await?;
    let gstr = merge_return_node(&mut tx, ReturnType::Gstr2b, period).await?;
    let mut summary = IngestSummary::new(ReturnType::Gstr2b.as_str(), Some(period));
    let mut vendors = HashSet::new();
    let mut invoices = HashSet::new();

    for (gstin, supplier) in suppliers {
        vendors.insert(gstin.clone());

        // An empty trade name must not erase a known one
        let vendor_props = if supplier.trdnm.trim().is_empty() {
            Properties::new()
        } else {
            props([("name", json!(supplier.trdnm.trim()))])
        };

        for inv in &supplier.inv {
            let mut invoice_props = props([
                ("date", json!(inv.dt)),
                ("taxable_value", json!(inv.val)),
                ("igst", json!(inv.iamt)),
                ("cgst", json!(inv.camt)),
                ("sgst", json!(inv.samt)),
                ("itc_available", json!(inv.itcavl)),
            ]);
            if !inv.hsn.is_empty() {
                invoice_props.insert("hsn".to_string(), json!(inv.hsn));
            }

            let invoice =
                merge_vendor_invoice(&mut tx, &gstin, vendor_props.clone(), &inv.inum, invoice_props)
                    .await?;

            let filed = props([
                ("taxable_value", json!(inv.val)),
                ("igst", json!(inv.iamt)),
                ("cgst", json!(inv.camt)),
                ("sgst", json!(inv.samt)),
                ("hsn", json!(inv.hsn)),
                ("date", json!(inv.dt)),
                ("itc_available", json!(inv.itcavl)),
            ]);
            tx.merge_edge(invoice, RelType::ReportedIn, gstr, filed)
                .await?;

            invoices.insert(invoice_key(&gstin, &inv.inum));
            summary.records += 1;
        }
    }

    tx.commit().await?;
    summary.vendors = vendors.len();
    summary.invoices = invoices.len();
    summary.log();
    Ok(summary)
}

/// Link IRP e-Invoices to their invoices
///
/// The seller GSTIN is required: invoices are identified by supplier and
/// number, and numbers alone collide across suppliers.
pub async fn ingest_einvoice(graph: &GraphStore, docs: &[EInvoiceRecord]) -> Result<IngestSummary> {
    let mut records = Vec::with_capacity(docs.len());
    for doc in docs {
        if doc.irn.trim().is_empty() {
            return Err(Error::InvalidInput("e-Invoice without an IRN".to_string()));
        }
        let seller = doc.seller_dtls.as_ref().ok_or_else(|| {
            Error::InvalidInput(format!("e-Invoice {} has no seller GSTIN", doc.irn))
        })?;
        let gstin = normalize_gstin(&seller.gstin)?;
        require_number("e-Invoice", &doc.doc_dtls.no)?;
        records.push((gstin, doc));
    }

    let mut tx = graph.begin().await?;
    let mut summary = IngestSummary::new("e-Invoice", None);
    let mut vendors = HashSet::new();
    let mut invoices = HashSet::new();

    for (gstin, doc) in records {
        let invoice = merge_vendor_invoice(
            &mut tx,
            &gstin,
            Properties::new(),
            &doc.doc_dtls.no,
            Properties::new(),
        )
        .await?;

        let einvoice = tx
            .merge_node(
                Label::EInvoice,
                doc.irn.trim(),
                props([
                    ("ack_date", json!(doc.ack_dt)),
                    ("status", json!(doc.status)),
                    ("doc_date", json!(doc.doc_dtls.dt)),
                ]),
            )
            .await?;
        tx.merge_edge(invoice, RelType::ElectronicVersion, einvoice, Properties::new())
            .await?;

        invoices.insert(invoice_key(&gstin, &doc.doc_dtls.no));
        vendors.insert(gstin);
        summary.records += 1;
    }

    tx.commit().await?;
    summary.vendors = vendors.len();
    summary.invoices = invoices.len();
    summary.log();
    Ok(summary)
}

/// Link e-Way Bills to the invoices whose goods they cover
pub async fn ingest_ewaybill(graph: &GraphStore, docs: &[EWayBillRecord]) -> Result<IngestSummary> {
    let mut records = Vec::with_capacity(docs.len());
    for doc in docs {
        if doc.ewb_no.trim().is_empty() {
            return Err(Error::InvalidInput("e-Way Bill without a number".to_string()));
        }
        let gstin = normalize_gstin(&doc.from_gstin)?;
        require_number("e-Way Bill", &doc.doc_no)?;
        records.push((gstin, doc));
    }

    let mut tx = graph.begin().await?;
    let mut summary = IngestSummary::new("e-Way Bill", None);
    let mut vendors = HashSet::new();
    let mut invoices = HashSet::new();

    for (gstin, doc) in records {
        let invoice =
            merge_vendor_invoice(&mut tx, &gstin, Properties::new(), &doc.doc_no, Properties::new())
                .await?;

        let ewaybill = tx
            .merge_node(
                Label::EWayBill,
                doc.ewb_no.trim(),
                props([
                    ("date", json!(doc.doc_date)),
                    ("value", json!(doc.tot_inv_value)),
                ]),
            )
            .await?;
        tx.merge_edge(invoice, RelType::CoversShipment, ewaybill, Properties::new())
            .await?;

        invoices.insert(invoice_key(&gstin, &doc.doc_no));
        vendors.insert(gstin);
        summary.records += 1;
    }

    tx.commit().await?;
    summary.vendors = vendors.len();
    summary.invoices = invoices.len();
    summary.log();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_in_memory;

    const SUPPLIER: &str = "29AABCU9603R1ZM";

    async fn graph() -> GraphStore {
        GraphStore::new(init_in_memory().await.unwrap())
    }

    fn gstr1() -> Gstr1Document {
        serde_json::from_value(json!({
            "b2b": [{"ctin": SUPPLIER, "inv": [
                {"inum": "T-1", "idt": "2025-07-18", "val": 780000, "rt": 18,
                 "camt": 70200, "samt": 70200, "hsn": "7210"},
                {"inum": "T-2", "idt": "2025-07-20", "val": 1000, "iamt": 180, "hsn": "7208"}
            ]}]
        }))
        .unwrap()
    }

    #[test]
    fn test_validate_period() {
        assert!(validate_period("2025-07").is_ok());
        assert!(validate_period("2025-13").is_err());
        assert!(validate_period("2025-7").is_err());
        assert!(validate_period("July 2025").is_err());
        assert!(validate_period("2025-00").is_err());
    }

    #[test]
    fn test_normalize_gstin() {
        assert_eq!(normalize_gstin(" 29aabcu9603r1zm ").unwrap(), SUPPLIER);
        assert!(normalize_gstin("29AABCU9603R1Z").is_err());
        assert!(normalize_gstin("29AABCU9603R1Z-").is_err());
    }

    #[tokio::test]
    async fn test_ingest_gstr1_builds_graph() {
        let graph = graph().await;
        let summary = ingest_gstr1(&graph, &gstr1(), "2025-07").await.unwrap();

        assert_eq!(summary.document, "GSTR-1");
        assert_eq!(summary.records, 2);
        assert_eq!(summary.invoices, 2);
        assert_eq!(summary.vendors, 1);

        // 1 vendor + 2 invoices + 1 return
        assert_eq!(graph.node_count().await.unwrap(), 4);
        // 2 ISSUED_INVOICE + 2 REPORTED_IN
        assert_eq!(graph.edge_count().await.unwrap(), 4);

        let invoice = graph
            .find_node(Label::Invoice, &invoice_key(SUPPLIER, "T-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(invoice.get_str("hsn"), Some("7210"));
        assert_eq!(invoice.get_f64("cgst"), Some(70200.0));
    }

    #[tokio::test]
    async fn test_reingest_is_idempotent() {
        let graph = graph().await;
        ingest_gstr1(&graph, &gstr1(), "2025-07").await.unwrap();
        ingest_gstr1(&graph, &gstr1(), "2025-07").await.unwrap();

        assert_eq!(graph.node_count().await.unwrap(), 4);
        assert_eq!(graph.edge_count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_gstr2b_keeps_vendor_name_on_empty_trade_name() {
        let graph = graph().await;
        let named: Gstr2bDocument = serde_json::from_value(json!({
            "docdata": {"b2b": [{"ctin": SUPPLIER, "trdnm": "Tata Steel Ltd",
                                 "inv": [{"inum": "T-1", "dt": "2025-07-18"}]}]}
        }))
        .unwrap();
        let unnamed: Gstr2bDocument = serde_json::from_value(json!({
            "docdata": {"b2b": [{"ctin": SUPPLIER, "trdnm": "",
                                 "inv": [{"inum": "T-3", "dt": "2025-07-28"}]}]}
        }))
        .unwrap();

        ingest_gstr2b(&graph, &named, "2025-07").await.unwrap();
        ingest_gstr2b(&graph, &unnamed, "2025-07").await.unwrap();

        let vendor = graph.find_node(Label::Vendor, SUPPLIER).await.unwrap().unwrap();
        assert_eq!(vendor.get_str("name"), Some("Tata Steel Ltd"));
    }

    #[tokio::test]
    async fn test_invalid_input_writes_nothing() {
        let graph = graph().await;
        let bad: Gstr1Document = serde_json::from_value(json!({
            "b2b": [
                {"ctin": SUPPLIER, "inv": [{"inum": "T-1", "idt": "2025-07-18"}]},
                {"ctin": "NOT-A-GSTIN", "inv": [{"inum": "X-1", "idt": "2025-07-18"}]}
            ]
        }))
        .unwrap();

        let result = ingest_gstr1(&graph, &bad, "2025-07").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        let result = ingest_gstr1(&graph, &gstr1(), "2025-7").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        assert_eq!(graph.node_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_partial_filing() {
        let graph = graph().await;
        sqlx::query("DROP TABLE graph_edges")
            .execute(graph.pool())
            .await
            .unwrap();

        // Nodes are written before the first edge fails
        assert!(ingest_gstr1(&graph, &gstr1(), "2025-07").await.is_err());
        assert_eq!(graph.node_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_einvoice_and_ewaybill_link_to_invoice() {
        let graph = graph().await;
        ingest_gstr1(&graph, &gstr1(), "2025-07").await.unwrap();

        let einvoices: Vec<EInvoiceRecord> = serde_json::from_value(json!([
            {"Irn": "IRN-1", "AckDt": "2025-07-18", "DocDtls": {"No": "T-1", "Dt": "18/07/2025"},
             "SellerDtls": {"Gstin": SUPPLIER}}
        ]))
        .unwrap();
        let ewaybills: Vec<EWayBillRecord> = serde_json::from_value(json!([
            {"ewbNo": 331001234567u64, "docNo": "T-1", "docDate": "18/07/2025",
             "fromGstin": SUPPLIER, "totInvValue": 920400}
        ]))
        .unwrap();

        let summary = ingest_einvoice(&graph, &einvoices).await.unwrap();
        assert_eq!(summary.invoices, 1);
        ingest_ewaybill(&graph, &ewaybills).await.unwrap();

        let ctx = graph
            .invoice_context(&invoice_key(SUPPLIER, "T-1"))
            .await
            .unwrap();
        assert_eq!(ctx.e_invoices.len(), 1);
        assert_eq!(ctx.e_invoices[0].get_str("status"), Some("ACT"));
        assert_eq!(ctx.eway_bills.len(), 1);
        assert_eq!(ctx.eway_bills[0].key, "331001234567");

        // Linking must not create a second invoice node
        assert_eq!(graph.nodes_by_label(Label::Invoice).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_einvoice_without_seller_is_rejected() {
        let graph = graph().await;
        let records: Vec<EInvoiceRecord> = serde_json::from_value(json!([
            {"Irn": "IRN-1", "DocDtls": {"No": "T-1"}}
        ]))
        .unwrap();
        assert!(matches!(
            ingest_einvoice(&graph, &records).await,
            Err(Error::InvalidInput(_))
        ));
    }
}
