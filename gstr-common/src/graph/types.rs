//! Core type definitions for the property graph

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Property bag stored on nodes and edges
pub type Properties = Map<String, Value>;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Unique identifier for an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EdgeId(pub i64);

/// Node labels used by the reconciliation graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    /// Keyed by GSTIN
    Vendor,
    /// Keyed by `<supplier GSTIN>/<invoice number>`
    Invoice,
    /// A return for one period, keyed by `<type>:<period>`
    #[serde(rename = "GSTR")]
    Gstr,
    /// Keyed by IRN
    EInvoice,
    /// Keyed by e-Way Bill number
    EWayBill,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Vendor => "Vendor",
            Label::Invoice => "Invoice",
            Label::Gstr => "GSTR",
            Label::EInvoice => "EInvoice",
            Label::EWayBill => "EWayBill",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Vendor" => Some(Label::Vendor),
            "Invoice" => Some(Label::Invoice),
            "GSTR" => Some(Label::Gstr),
            "EInvoice" => Some(Label::EInvoice),
            "EWayBill" => Some(Label::EWayBill),
            _ => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelType {
    /// Vendor -> Invoice
    IssuedInvoice,
    /// Invoice -> GSTR, carrying the values as filed in that return
    ReportedIn,
    /// Invoice -> EInvoice
    ElectronicVersion,
    /// Invoice -> EWayBill
    CoversShipment,
}

impl RelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelType::IssuedInvoice => "ISSUED_INVOICE",
            RelType::ReportedIn => "REPORTED_IN",
            RelType::ElectronicVersion => "ELECTRONIC_VERSION",
            RelType::CoversShipment => "COVERS_SHIPMENT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ISSUED_INVOICE" => Some(RelType::IssuedInvoice),
            "REPORTED_IN" => Some(RelType::ReportedIn),
            "ELECTRONIC_VERSION" => Some(RelType::ElectronicVersion),
            "COVERS_SHIPMENT" => Some(RelType::CoversShipment),
            _ => None,
        }
    }
}

impl fmt::Display for RelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node in the property graph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub label: Label,
    pub key: String,
    pub properties: Properties,
}

impl Node {
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(Value::as_f64)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.properties.get(key).and_then(Value::as_i64)
    }
}

/// A directed, typed edge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub id: EdgeId,
    pub src: NodeId,
    pub rel: RelType,
    pub dst: NodeId,
    pub properties: Properties,
}

/// Business key of an invoice: supplier GSTIN plus the supplier's invoice number
pub fn invoice_key(supplier_gstin: &str, invoice_number: &str) -> String {
    format!("{}/{}", supplier_gstin.trim().to_uppercase(), invoice_number.trim())
}

/// Build a property bag from `(key, value)` pairs
pub fn props<I, K>(pairs: I) -> Properties
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}
