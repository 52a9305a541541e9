//! Vendor document operations

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::models::Vendor;
use crate::Result;

/// Count stored vendors
pub async fn count_vendors(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vendors")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Identifier for the next vendor: `V001`, `V002`, ...
pub async fn next_vendor_id(pool: &SqlitePool) -> Result<String> {
    let count = count_vendors(pool).await?;
    Ok(format!("V{:03}", count + 1))
}

/// Insert a vendor
pub async fn insert_vendor(pool: &SqlitePool, vendor: &Vendor) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO vendors (
            id, name, gstin, state, risk_score, status,
            total_transactions, missed_filings, avg_days_late
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&vendor.id)
    .bind(&vendor.name)
    .bind(&vendor.gstin)
    .bind(&vendor.state)
    .bind(vendor.risk_score)
    .bind(vendor.status.as_str())
    .bind(vendor.total_transactions)
    .bind(vendor.missed_filings)
    .bind(vendor.avg_days_late)
    .execute(pool)
    .await?;

    Ok(())
}

/// All vendors in insertion order
pub async fn list_vendors(pool: &SqlitePool) -> Result<Vec<Vendor>> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, gstin, state, risk_score, status,
               total_transactions, missed_filings, avg_days_late
        FROM vendors
        ORDER BY rowid
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(vendor_from_row).collect()
}

/// Load vendor by id
pub async fn find_vendor(pool: &SqlitePool, id: &str) -> Result<Option<Vendor>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, gstin, state, risk_score, status,
               total_transactions, missed_filings, avg_days_late
        FROM vendors
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(vendor_from_row).transpose()
}

/// Load vendor by GSTIN
pub async fn find_vendor_by_gstin(pool: &SqlitePool, gstin: &str) -> Result<Option<Vendor>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, gstin, state, risk_score, status,
               total_transactions, missed_filings, avg_days_late
        FROM vendors
        WHERE gstin = ?
        ORDER BY rowid
        LIMIT 1
        "#,
    )
    .bind(gstin)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(vendor_from_row).transpose()
}

/// Count vendors flagged `High Risk`
pub async fn count_high_risk_vendors(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vendors WHERE status = 'High Risk'")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

fn vendor_from_row(row: &SqliteRow) -> Result<Vendor> {
    let status: String = row.get("status");

    Ok(Vendor {
        id: row.get("id"),
        name: row.get("name"),
        gstin: row.get("gstin"),
        state: row.get("state"),
        risk_score: row.get("risk_score"),
        status: status.parse()?,
        total_transactions: row.get("total_transactions"),
        missed_filings: row.get("missed_filings"),
        avg_days_late: row.get("avg_days_late"),
    })
}
