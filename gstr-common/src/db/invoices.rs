//! Invoice document operations

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::models::Invoice;
use crate::Result;

/// Prefix for service-assigned invoice identifiers
pub const INVOICE_ID_PREFIX: &str = "INV-2025-";

/// Count stored invoices
pub async fn count_invoices(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Identifier for the next invoice: `INV-2025-001`, ...
pub async fn next_invoice_id(pool: &SqlitePool) -> Result<String> {
    let count = count_invoices(pool).await?;
    Ok(format!("{}{:03}", INVOICE_ID_PREFIX, count + 1))
}

/// Insert an invoice
pub async fn insert_invoice(pool: &SqlitePool, invoice: &Invoice) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO invoices (
            id, vendor_id, vendor_name, gstin, date,
            taxable_amount, cgst, sgst, igst, total_tax, total,
            hsn, period, gstr1_reported, gstr2b_reported, e_invoice, e_way_bill,
            match_status, risk_level
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&invoice.id)
    .bind(&invoice.vendor_id)
    .bind(&invoice.vendor_name)
    .bind(&invoice.gstin)
    .bind(&invoice.date)
    .bind(invoice.taxable_amount)
    .bind(invoice.cgst)
    .bind(invoice.sgst)
    .bind(invoice.igst)
    .bind(invoice.total_tax)
    .bind(invoice.total)
    .bind(&invoice.hsn)
    .bind(&invoice.period)
    .bind(invoice.gstr1_reported)
    .bind(invoice.gstr2b_reported)
    .bind(invoice.e_invoice)
    .bind(invoice.e_way_bill)
    .bind(invoice.match_status.as_str())
    .bind(invoice.risk_level.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

/// All invoices in insertion order
pub async fn list_invoices(pool: &SqlitePool) -> Result<Vec<Invoice>> {
    let rows = sqlx::query(
        r#"
        SELECT id, vendor_id, vendor_name, gstin, date,
               taxable_amount, cgst, sgst, igst, total_tax, total,
               hsn, period, gstr1_reported, gstr2b_reported, e_invoice, e_way_bill,
               match_status, risk_level
        FROM invoices
        ORDER BY rowid
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(invoice_from_row).collect()
}

/// Invoice counters for the dashboard
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvoiceTotals {
    pub total_invoices: i64,
    pub mismatches: i64,
    /// Sum of tax on every invoice that is not matched
    pub at_risk_itc: f64,
}

/// Aggregate invoice totals
pub async fn invoice_totals(pool: &SqlitePool) -> Result<InvoiceTotals> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS total_invoices,
               COALESCE(SUM(CASE WHEN match_status != 'Matched' THEN 1 ELSE 0 END), 0) AS mismatches,
               COALESCE(SUM(CASE WHEN match_status != 'Matched' THEN total_tax ELSE 0.0 END), 0.0) AS at_risk
        FROM invoices
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(InvoiceTotals {
        total_invoices: row.get("total_invoices"),
        mismatches: row.get("mismatches"),
        at_risk_itc: row.get("at_risk"),
    })
}

fn invoice_from_row(row: &SqliteRow) -> Result<Invoice> {
    let match_status: String = row.get("match_status");
    let risk_level: String = row.get("risk_level");

    Ok(Invoice {
        id: row.get("id"),
        vendor_id: row.get("vendor_id"),
        vendor_name: row.get("vendor_name"),
        gstin: row.get("gstin"),
        date: row.get("date"),
        taxable_amount: row.get("taxable_amount"),
        cgst: row.get("cgst"),
        sgst: row.get("sgst"),
        igst: row.get("igst"),
        total_tax: row.get("total_tax"),
        total: row.get("total"),
        hsn: row.get("hsn"),
        period: row.get("period"),
        gstr1_reported: row.get("gstr1_reported"),
        gstr2b_reported: row.get("gstr2b_reported"),
        e_invoice: row.get("e_invoice"),
        e_way_bill: row.get("e_way_bill"),
        match_status: match_status.parse()?,
        risk_level: risk_level.parse()?,
    })
}
