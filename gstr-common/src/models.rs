//! Document-store records and shared enumerations
//!
//! Records serialize with camelCase keys, the shape the dashboard consumes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// The two return types reconciled against each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnType {
    /// Seller-filed outward-supply return
    #[serde(rename = "GSTR-1")]
    Gstr1,
    /// Auto-populated buyer-side purchase return
    #[serde(rename = "GSTR-2B")]
    Gstr2b,
}

impl ReturnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnType::Gstr1 => "GSTR-1",
            ReturnType::Gstr2b => "GSTR-2B",
        }
    }

    /// Graph key of the return node for a filing period, e.g. `GSTR-1:2025-07`
    pub fn node_key(&self, period: &str) -> String {
        format!("{}:{}", self.as_str(), period)
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReturnType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GSTR-1" => Ok(ReturnType::Gstr1),
            "GSTR-2B" => Ok(ReturnType::Gstr2b),
            other => Err(Error::InvalidInput(format!("Unknown return type: {}", other))),
        }
    }
}

/// Reconciliation status of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    #[serde(rename = "Matched")]
    Matched,
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
    #[serde(rename = "Late Filing")]
    LateFiling,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Matched => "Matched",
            MatchStatus::MissingInGstr1 => "Missing in GSTR-1",
            MatchStatus::MissingInGstr2b => "Missing in GSTR-2B",
            MatchStatus::TaxAmountMismatch => "Tax Amount Mismatch",
            MatchStatus::HsnMismatch => "HSN Mismatch",
            MatchStatus::EWayBillMissing => "E-Way Bill Missing",
            MatchStatus::LateFiling => "Late Filing",
        }
    }

    /// Status implied by which returns carry the invoice
    ///
    /// An invoice in neither return is treated as matched; there is nothing
    /// to reconcile it against.
    pub fn from_reported(gstr1: bool, gstr2b: bool) -> Self {
        match (gstr1, gstr2b) {
            (false, true) => MatchStatus::MissingInGstr1,
            (true, false) => MatchStatus::MissingInGstr2b,
            _ => MatchStatus::Matched,
        }
    }

    pub fn is_matched(&self) -> bool {
        *self == MatchStatus::Matched
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = match s {
            "Matched" => MatchStatus::Matched,
            "Missing in GSTR-1" => MatchStatus::MissingInGstr1,
            "Missing in GSTR-2B" => MatchStatus::MissingInGstr2b,
            "Tax Amount Mismatch" => MatchStatus::TaxAmountMismatch,
            "HSN Mismatch" => MatchStatus::HsnMismatch,
            "E-Way Bill Missing" => MatchStatus::EWayBillMissing,
            "Late Filing" => MatchStatus::LateFiling,
            other => {
                return Err(Error::InvalidInput(format!("Unknown match status: {}", other)))
            }
        };
        Ok(status)
    }
}

/// Vendor compliance classification derived from the risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VendorStatus {
    #[serde(rename = "Compliant")]
    Compliant,
    #[serde(rename = "Review")]
    Review,
    #[serde(rename = "High Risk")]
    HighRisk,
}

impl VendorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorStatus::Compliant => "Compliant",
            VendorStatus::Review => "Review",
            VendorStatus::HighRisk => "High Risk",
        }
    }

    /// Alert raised when a vendor with this status is registered
    pub fn alert_type(&self) -> AlertType {
        match self {
            VendorStatus::HighRisk => AlertType::Critical,
            VendorStatus::Review => AlertType::Warning,
            VendorStatus::Compliant => AlertType::Success,
        }
    }
}

impl fmt::Display for VendorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VendorStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Compliant" => Ok(VendorStatus::Compliant),
            "Review" => Ok(VendorStatus::Review),
            "High Risk" => Ok(VendorStatus::HighRisk),
            other => Err(Error::InvalidInput(format!("Unknown vendor status: {}", other))),
        }
    }
}

/// Invoice-level risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    /// Non-matched invoices carrying more than this much tax are high risk
    pub const HIGH_TAX_THRESHOLD: f64 = 50_000.0;

    pub fn for_invoice(status: MatchStatus, total_tax: f64) -> Self {
        if status.is_matched() {
            RiskLevel::Low
        } else if total_tax > Self::HIGH_TAX_THRESHOLD {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        }
    }
}

impl FromStr for RiskLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(RiskLevel::Low),
            "Medium" => Ok(RiskLevel::Medium),
            "High" => Ok(RiskLevel::High),
            other => Err(Error::InvalidInput(format!("Unknown risk level: {}", other))),
        }
    }
}

/// Dashboard alert category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Critical,
    Warning,
    Success,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Critical => "critical",
            AlertType::Warning => "warning",
            AlertType::Success => "success",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            AlertType::Critical => "🔴",
            AlertType::Warning => "🟡",
            AlertType::Success => "🟢",
        }
    }
}

impl FromStr for AlertType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(AlertType::Critical),
            "warning" => Ok(AlertType::Warning),
            "success" => Ok(AlertType::Success),
            other => Err(Error::InvalidInput(format!("Unknown alert type: {}", other))),
        }
    }
}

/// Vendor record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: String,
    pub name: String,
    pub gstin: String,
    pub state: String,
    pub risk_score: f64,
    pub status: VendorStatus,
    pub total_transactions: i64,
    pub missed_filings: i64,
    pub avg_days_late: f64,
}

/// Payload for registering a vendor
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVendor {
    pub name: String,
    pub gstin: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub total_transactions: Option<i64>,
    #[serde(default)]
    pub missed_filings: i64,
    #[serde(default)]
    pub avg_days_late: f64,
}

/// Invoice record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub vendor_id: String,
    pub vendor_name: String,
    pub gstin: String,
    pub date: String,
    pub taxable_amount: f64,
    pub cgst: f64,
    pub sgst: f64,
    pub igst: f64,
    pub total_tax: f64,
    pub total: f64,
    pub hsn: String,
    pub period: String,
    pub gstr1_reported: bool,
    pub gstr2b_reported: bool,
    pub e_invoice: bool,
    pub e_way_bill: bool,
    pub match_status: MatchStatus,
    pub risk_level: RiskLevel,
}

fn default_true() -> bool {
    true
}

/// Payload for recording an invoice
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvoice {
    #[serde(default)]
    pub vendor_id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub taxable_amount: f64,
    #[serde(default)]
    pub cgst: f64,
    #[serde(default)]
    pub sgst: f64,
    #[serde(default)]
    pub igst: f64,
    #[serde(default)]
    pub hsn: String,
    #[serde(default)]
    pub period: String,
    #[serde(default = "default_true")]
    pub gstr1_reported: bool,
    #[serde(default = "default_true")]
    pub gstr2b_reported: bool,
    #[serde(default = "default_true")]
    pub e_invoice: bool,
    #[serde(default = "default_true")]
    pub e_way_bill: bool,
}

impl NewInvoice {
    pub fn total_tax(&self) -> f64 {
        self.cgst + self.sgst + self.igst
    }
}

/// Dashboard alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub message: String,
    pub time: String,
    pub icon: String,
}

impl Alert {
    /// Alert raised by the running service
    pub fn now(alert_type: AlertType, message: impl Into<String>) -> Self {
        Self {
            alert_type,
            message: message.into(),
            time: "Just now".to_string(),
            icon: alert_type.icon().to_string(),
        }
    }
}

/// User as exposed over the API (never carries credentials)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: String,
    pub name: String,
    pub role: String,
    pub created_at: String,
}

/// Format an amount in whole rupees with thousands separators: `81,000`
pub fn format_inr(amount: f64) -> String {
    let whole = amount.trunc().abs() as u64;
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if amount < 0.0 && whole > 0 {
        format!("-{}", out)
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_status_from_reported_flags() {
        assert_eq!(MatchStatus::from_reported(true, true), MatchStatus::Matched);
        assert_eq!(MatchStatus::from_reported(false, true), MatchStatus::MissingInGstr1);
        assert_eq!(MatchStatus::from_reported(true, false), MatchStatus::MissingInGstr2b);
        assert_eq!(MatchStatus::from_reported(false, false), MatchStatus::Matched);
    }

    #[test]
    fn test_match_status_serializes_display_string() {
        let json = serde_json::to_string(&MatchStatus::MissingInGstr1).unwrap();
        assert_eq!(json, "\"Missing in GSTR-1\"");
        assert_eq!(
            "E-Way Bill Missing".parse::<MatchStatus>().unwrap(),
            MatchStatus::EWayBillMissing
        );
        assert!("Unknown".parse::<MatchStatus>().is_err());
    }

    #[test]
    fn test_invoice_risk_level() {
        assert_eq!(RiskLevel::for_invoice(MatchStatus::Matched, 900_000.0), RiskLevel::Low);
        assert_eq!(
            RiskLevel::for_invoice(MatchStatus::MissingInGstr1, 81_000.0),
            RiskLevel::High
        );
        assert_eq!(
            RiskLevel::for_invoice(MatchStatus::MissingInGstr2b, 50_000.0),
            RiskLevel::Medium
        );
    }

    #[test]
    fn test_new_invoice_defaults_reported_flags() {
        let payload: NewInvoice =
            serde_json::from_str(r#"{"vendorId": "V001", "cgst": 10.0, "sgst": 10.0}"#).unwrap();
        assert!(payload.gstr1_reported);
        assert!(payload.gstr2b_reported);
        assert!(payload.e_way_bill);
        assert_eq!(payload.total_tax(), 20.0);
    }

    #[test]
    fn test_alert_serialization_uses_type_key() {
        let alert = Alert::now(AlertType::Critical, "Mismatch");
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["type"], "critical");
        assert_eq!(json["icon"], "🔴");
        assert_eq!(json["time"], "Just now");
    }

    #[test]
    fn test_format_inr() {
        assert_eq!(format_inr(81000.0), "81,000");
        assert_eq!(format_inr(1340400.4), "1,340,400");
        assert_eq!(format_inr(999.0), "999");
        assert_eq!(format_inr(0.0), "0");
    }
}
