//! Alert feed operations

use sqlx::{Row, SqlitePool};

use crate::models::Alert;
use crate::Result;

/// Number of alerts returned by the feed
pub const ALERT_FEED_LIMIT: i64 = 20;

/// Append an alert to the feed
pub async fn insert_alert(pool: &SqlitePool, alert: &Alert) -> Result<()> {
    sqlx::query("INSERT INTO alerts (alert_type, message, time, icon) VALUES (?, ?, ?, ?)")
        .bind(alert.alert_type.as_str())
        .bind(&alert.message)
        .bind(&alert.time)
        .bind(&alert.icon)
        .execute(pool)
        .await?;

    Ok(())
}

/// Most recent alerts, newest first
pub async fn recent_alerts(pool: &SqlitePool, limit: i64) -> Result<Vec<Alert>> {
    let rows = sqlx::query(
        "SELECT alert_type, message, time, icon FROM alerts ORDER BY id DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let alert_type: String = row.get("alert_type");
            Ok(Alert {
                alert_type: alert_type.parse()?,
                message: row.get("message"),
                time: row.get("time"),
                icon: row.get("icon"),
            })
        })
        .collect()
}

/// Count stored alerts
pub async fn count_alerts(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alerts")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
