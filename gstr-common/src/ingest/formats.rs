//! Portal JSON document shapes
//!
//! Field names follow the GST portal and IRP/e-Way Bill exports. Amounts
//! default to zero and codes to empty when omitted.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// GSTR-1 outward supplies (B2B section only)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Gstr1Document {
    #[serde(default)]
    pub b2b: Vec<Gstr1Party>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Gstr1Party {
    /// Supplier GSTIN
    pub ctin: String,
    #[serde(default)]
    pub inv: Vec<Gstr1Invoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Gstr1Invoice {
    #[serde(deserialize_with = "string_or_number")]
    pub inum: String,
    #[serde(default)]
    pub idt: String,
    #[serde(default)]
    pub val: f64,
    #[serde(default)]
    pub rt: f64,
    #[serde(default)]
    pub iamt: f64,
    #[serde(default)]
    pub camt: f64,
    #[serde(default)]
    pub samt: f64,
    #[serde(default, deserialize_with = "string_or_number")]
    pub hsn: String,
}

/// GSTR-2B auto-populated inward supplies
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Gstr2bDocument {
    #[serde(default)]
    pub docdata: Gstr2bDocData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Gstr2bDocData {
    #[serde(default)]
    pub b2b: Vec<Gstr2bSupplier>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Gstr2bSupplier {
    pub ctin: String,
    /// Trade name
    #[serde(default)]
    pub trdnm: String,
    #[serde(default)]
    pub inv: Vec<Gstr2bInvoice>,
}

fn default_itc_available() -> String {
    "Y".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Gstr2bInvoice {
    #[serde(deserialize_with = "string_or_number")]
    pub inum: String,
    #[serde(default)]
    pub dt: String,
    #[serde(default)]
    pub val: f64,
    #[serde(default)]
    pub iamt: f64,
    #[serde(default)]
    pub camt: f64,
    #[serde(default)]
    pub samt: f64,
    #[serde(default, deserialize_with = "string_or_number")]
    pub hsn: String,
    #[serde(default = "default_itc_available")]
    pub itcavl: String,
}

fn default_einvoice_status() -> String {
    "ACT".to_string()
}

/// One IRP e-Invoice record
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EInvoiceRecord {
    pub irn: String,
    #[serde(default)]
    pub ack_dt: String,
    #[serde(default = "default_einvoice_status")]
    pub status: String,
    pub doc_dtls: EInvoiceDocDetails,
    #[serde(default)]
    pub seller_dtls: Option<EInvoiceSeller>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EInvoiceDocDetails {
    #[serde(deserialize_with = "string_or_number")]
    pub no: String,
    #[serde(default)]
    pub dt: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EInvoiceSeller {
    pub gstin: String,
}

/// One e-Way Bill record
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EWayBillRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub ewb_no: String,
    #[serde(deserialize_with = "string_or_number")]
    pub doc_no: String,
    #[serde(default)]
    pub doc_date: String,
    pub from_gstin: String,
    #[serde(default)]
    pub tot_inv_value: f64,
}

/// Portal exports are inconsistent about quoting numeric identifiers
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, found {}",
            other
        ))),
    }
}
