//! Demonstration data seeded into empty collections
//!
//! Each collection is seeded independently and only when empty, so a
//! restart never duplicates records.

use sqlx::SqlitePool;
use tracing::info;

use super::{alerts, invoices, users, vendors};
use crate::models::{Alert, AlertType, Invoice, MatchStatus, RiskLevel, Vendor, VendorStatus};
use crate::Result;

/// (id, name, gstin, state, risk score, status, transactions, missed filings, avg days late)
type VendorSeed = (&'static str, &'static str, &'static str, &'static str, f64, VendorStatus, i64, i64, f64);

const VENDORS: &[VendorSeed] = &[
    ("V001", "Tata Steel Ltd", "29AABCU9603R1ZM", "Karnataka", 0.12, VendorStatus::Compliant, 245, 0, 0.0),
    ("V002", "Reliance Industries", "27AABCR9718E1ZL", "Maharashtra", 0.08, VendorStatus::Compliant, 312, 0, 0.0),
    ("V003", "Infosys Technologies", "29AABCI1332L1ZJ", "Karnataka", 0.15, VendorStatus::Compliant, 189, 0, 1.0),
    ("V004", "Wipro Limited", "29AABCW6273R1ZA", "Karnataka", 0.22, VendorStatus::Compliant, 156, 1, 2.0),
    ("V005", "Hyderabad Steels Pvt", "36AAACH7409R1ZK", "Telangana", 0.78, VendorStatus::HighRisk, 67, 4, 12.0),
    ("V006", "Bajaj Auto Ltd", "27AABCB8482K1Z5", "Maharashtra", 0.19, VendorStatus::Compliant, 198, 0, 1.0),
    ("V007", "Hindalco Industries", "22AABCH0812J1ZF", "Chhattisgarh", 0.35, VendorStatus::Review, 143, 1, 3.0),
    ("V008", "ITC Limited", "19AABCI5765M1ZO", "West Bengal", 0.11, VendorStatus::Compliant, 276, 0, 0.0),
    ("V009", "Mahindra & Mahindra", "27AABCM5964F1ZE", "Maharashtra", 0.28, VendorStatus::Compliant, 167, 1, 2.0),
    ("V010", "SunPharma Industries", "09AABCS1429B1ZE", "Uttar Pradesh", 0.65, VendorStatus::HighRisk, 89, 3, 8.0),
    ("V011", "Grasim Industries", "09AABCG0127K1ZP", "Uttar Pradesh", 0.18, VendorStatus::Compliant, 134, 0, 1.0),
    ("V012", "NTPC Limited", "07AABCN8726L1ZF", "Delhi", 0.09, VendorStatus::Compliant, 223, 0, 0.0),
    ("V013", "EID Parry India", "33AABCE9012P1ZS", "Tamil Nadu", 0.72, VendorStatus::HighRisk, 56, 4, 10.0),
    ("V014", "Godrej Consumer", "27AABCG3456R1ZM", "Maharashtra", 0.31, VendorStatus::Review, 145, 1, 3.0),
    ("V015", "Hero MotoCorp", "06AABCH7890K1ZR", "Haryana", 0.14, VendorStatus::Compliant, 201, 0, 1.0),
    ("V016", "DLF Limited", "07AABCD1234L1ZP", "Delhi", 0.42, VendorStatus::Review, 98, 2, 5.0),
    ("V017", "Asian Paints", "27AABCA5678E1ZK", "Maharashtra", 0.10, VendorStatus::Compliant, 267, 0, 0.0),
    ("V018", "Jubilant Foodworks", "09AABCJ9012B1ZM", "Uttar Pradesh", 0.55, VendorStatus::Review, 78, 2, 6.0),
    ("V019", "Torrent Pharma", "24AABCT3456P1ZG", "Gujarat", 0.48, VendorStatus::Review, 112, 2, 4.0),
    ("V020", "Adani Enterprises", "24AABCA7890E1ZL", "Gujarat", 0.25, VendorStatus::Compliant, 189, 1, 2.0),
];

/// (id, vendor id, date, taxable, cgst, sgst, igst, hsn, gstr1, gstr2b, e-invoice, e-way bill, status, risk)
type InvoiceSeed = (
    &'static str,
    &'static str,
    &'static str,
    f64,
    f64,
    f64,
    f64,
    &'static str,
    bool,
    bool,
    bool,
    bool,
    MatchStatus,
    RiskLevel,
);

const INVOICES: &[InvoiceSeed] = &[
    ("INV-2025-001", "V005", "2025-07-15", 450000.0, 40500.0, 40500.0, 0.0, "7208", false, true, true, true, MatchStatus::MissingInGstr1, RiskLevel::High),
    ("INV-2025-002", "V001", "2025-07-18", 780000.0, 70200.0, 70200.0, 0.0, "7210", true, true, true, true, MatchStatus::Matched, RiskLevel::Low),
    ("INV-2025-003", "V010", "2025-07-22", 320000.0, 0.0, 0.0, 38400.0, "3004", true, true, true, true, MatchStatus::TaxAmountMismatch, RiskLevel::Medium),
    ("INV-2025-004", "V013", "2025-07-25", 1200000.0, 0.0, 0.0, 140400.0, "1701", false, true, true, false, MatchStatus::MissingInGstr1, RiskLevel::High),
    ("INV-2025-005", "V002", "2025-07-28", 560000.0, 50400.0, 50400.0, 0.0, "2710", true, true, true, true, MatchStatus::Matched, RiskLevel::Low),
    ("INV-2025-006", "V006", "2025-08-02", 890000.0, 80100.0, 80100.0, 0.0, "8711", true, true, true, true, MatchStatus::Matched, RiskLevel::Low),
    ("INV-2025-007", "V018", "2025-08-05", 95000.0, 0.0, 0.0, 17100.0, "2106", false, true, false, true, MatchStatus::MissingInGstr1, RiskLevel::High),
    ("INV-2025-008", "V003", "2025-08-08", 1500000.0, 135000.0, 135000.0, 0.0, "9983", true, true, true, false, MatchStatus::Matched, RiskLevel::Low),
    ("INV-2025-009", "V007", "2025-08-10", 410000.0, 0.0, 0.0, 49200.0, "7208", true, true, true, true, MatchStatus::HsnMismatch, RiskLevel::Medium),
    ("INV-2025-010", "V008", "2025-08-12", 230000.0, 0.0, 0.0, 27600.0, "2401", true, true, true, true, MatchStatus::Matched, RiskLevel::Low),
    ("INV-2025-011", "V005", "2025-08-15", 670000.0, 0.0, 0.0, 120600.0, "7208", false, true, true, true, MatchStatus::MissingInGstr1, RiskLevel::High),
    ("INV-2025-012", "V009", "2025-08-18", 340000.0, 30600.0, 30600.0, 0.0, "8429", true, true, true, true, MatchStatus::Matched, RiskLevel::Low),
    ("INV-2025-013", "V014", "2025-08-20", 120000.0, 10800.0, 10800.0, 0.0, "3401", true, true, true, true, MatchStatus::LateFiling, RiskLevel::Medium),
    ("INV-2025-014", "V015", "2025-09-01", 980000.0, 0.0, 0.0, 176400.0, "8711", true, true, true, true, MatchStatus::Matched, RiskLevel::Low),
    ("INV-2025-015", "V019", "2025-09-03", 150000.0, 0.0, 0.0, 18000.0, "3004", true, true, true, true, MatchStatus::EWayBillMissing, RiskLevel::Medium),
    ("INV-2025-016", "V012", "2025-09-05", 2100000.0, 189000.0, 189000.0, 0.0, "2716", true, true, true, true, MatchStatus::Matched, RiskLevel::Low),
    ("INV-2025-017", "V016", "2025-09-08", 4500000.0, 405000.0, 405000.0, 0.0, "9972", true, true, true, false, MatchStatus::Matched, RiskLevel::Low),
    ("INV-2025-018", "V010", "2025-09-10", 280000.0, 0.0, 0.0, 33600.0, "2933", false, true, true, true, MatchStatus::MissingInGstr1, RiskLevel::High),
    ("INV-2025-019", "V020", "2025-09-12", 670000.0, 0.0, 0.0, 120600.0, "2701", true, true, true, true, MatchStatus::Matched, RiskLevel::Low),
    ("INV-2025-020", "V004", "2025-09-15", 890000.0, 80100.0, 80100.0, 0.0, "9983", true, true, true, false, MatchStatus::Matched, RiskLevel::Low),
];

/// (email, password, name, role, created at)
const USERS: &[(&str, &str, &str, &str, &str)] = &[
    ("admin@gstreconcile.ai", "admin123", "Admin User", "admin", "2025-01-01"),
    ("auditor@gstreconcile.ai", "auditor123", "Tax Auditor", "auditor", "2025-03-15"),
];

const ALERTS: &[(AlertType, &str, &str)] = &[
    (AlertType::Critical, "5 invoices missing from vendor GSTR-1 filings", "2 hours ago"),
    (AlertType::Warning, "Vendor V005 risk score increased to 78%", "5 hours ago"),
    (AlertType::Success, "GSTR-2B auto-reconciliation completed for Aug 2025", "1 day ago"),
    (AlertType::Warning, "3 vendors have pending GSTR-1 amendments", "1 day ago"),
    (AlertType::Critical, "₹8.1L ITC at risk due to unmatched invoices", "2 days ago"),
];

/// What a seeding pass inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub vendors: usize,
    pub invoices: usize,
    pub users: usize,
    pub alerts: usize,
}

/// Seed every empty collection with demonstration records
pub async fn seed_demo_data(pool: &SqlitePool) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    if vendors::count_vendors(pool).await? == 0 {
        for v in VENDORS {
            vendors::insert_vendor(
                pool,
                &Vendor {
                    id: v.0.to_string(),
                    name: v.1.to_string(),
                    gstin: v.2.to_string(),
                    state: v.3.to_string(),
                    risk_score: v.4,
                    status: v.5,
                    total_transactions: v.6,
                    missed_filings: v.7,
                    avg_days_late: v.8,
                },
            )
            .await?;
        }
        report.vendors = VENDORS.len();
        info!("Seeded {} vendors", report.vendors);
    }

    if invoices::count_invoices(pool).await? == 0 {
        for inv in INVOICES {
            let (vendor_name, gstin) = VENDORS
                .iter()
                .find(|v| v.0 == inv.1)
                .map(|v| (v.1, v.2))
                .unwrap_or(("Unknown", ""));
            let total_tax = inv.4 + inv.5 + inv.6;

            invoices::insert_invoice(
                pool,
                &Invoice {
                    id: inv.0.to_string(),
                    vendor_id: inv.1.to_string(),
                    vendor_name: vendor_name.to_string(),
                    gstin: gstin.to_string(),
                    date: inv.2.to_string(),
                    taxable_amount: inv.3,
                    cgst: inv.4,
                    sgst: inv.5,
                    igst: inv.6,
                    total_tax,
                    total: inv.3 + total_tax,
                    hsn: inv.7.to_string(),
                    period: inv.2[..7].to_string(),
                    gstr1_reported: inv.8,
                    gstr2b_reported: inv.9,
                    e_invoice: inv.10,
                    e_way_bill: inv.11,
                    match_status: inv.12,
                    risk_level: inv.13,
                },
            )
            .await?;
        }
        report.invoices = INVOICES.len();
        info!("Seeded {} invoices", report.invoices);
    }

    if users::count_users(pool).await? == 0 {
        for (email, password, name, role, created_at) in USERS {
            users::create_user(pool, email, password, name, role, created_at).await?;
        }
        report.users = USERS.len();
        info!("Seeded default users");
    }

    if alerts::count_alerts(pool).await? == 0 {
        for (alert_type, message, time) in ALERTS {
            alerts::insert_alert(
                pool,
                &Alert {
                    alert_type: *alert_type,
                    message: message.to_string(),
                    time: time.to_string(),
                    icon: alert_type.icon().to_string(),
                },
            )
            .await?;
        }
        report.alerts = ALERTS.len();
        info!("Seeded alerts");
    }

    Ok(report)
}
