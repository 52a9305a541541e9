//! Database initialization, demo seeding and document-store round trips

use gstr_common::db::{alerts, init_database, init_in_memory, invoices, seed_demo_data, users, vendors};
use gstr_common::models::{Alert, AlertType, VendorStatus};
use gstr_common::Error;
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("gstr.db");
    assert!(!db_path.exists());

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("gstr.db");

    let pool = init_database(&db_path).await.unwrap();
    seed_demo_data(&pool).await.unwrap();
    pool.close().await;

    // Schema creation is idempotent and data survives
    let pool = init_database(&db_path).await.unwrap();
    assert_eq!(vendors::count_vendors(&pool).await.unwrap(), 20);
}

#[tokio::test]
async fn test_all_tables_created() {
    let pool = init_in_memory().await.unwrap();

    for table in ["vendors", "invoices", "alerts", "users", "graph_nodes", "graph_edges"] {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1, "missing table {}", table);
    }
}

#[tokio::test]
async fn test_seed_only_fills_empty_collections() {
    let pool = init_in_memory().await.unwrap();

    let first = seed_demo_data(&pool).await.unwrap();
    assert_eq!(first.vendors, 20);
    assert_eq!(first.invoices, 20);
    assert_eq!(first.users, 2);
    assert_eq!(first.alerts, 5);

    let second = seed_demo_data(&pool).await.unwrap();
    assert_eq!(second.vendors + second.invoices + second.users + second.alerts, 0);
    assert_eq!(invoices::count_invoices(&pool).await.unwrap(), 20);

    assert_eq!(vendors::next_vendor_id(&pool).await.unwrap(), "V021");
    assert_eq!(invoices::next_invoice_id(&pool).await.unwrap(), "INV-2025-021");
}

#[tokio::test]
async fn test_seeded_records_read_back() {
    let pool = init_in_memory().await.unwrap();
    seed_demo_data(&pool).await.unwrap();

    let all = vendors::list_vendors(&pool).await.unwrap();
    assert_eq!(all[0].id, "V001");
    assert_eq!(all[0].name, "Tata Steel Ltd");

    let hyderabad = vendors::find_vendor_by_gstin(&pool, "36AAACH7409R1ZK")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hyderabad.id, "V005");
    assert_eq!(hyderabad.status, VendorStatus::HighRisk);
    assert!(vendors::find_vendor(&pool, "V999").await.unwrap().is_none());

    let invoice = &invoices::list_invoices(&pool).await.unwrap()[0];
    assert_eq!(invoice.id, "INV-2025-001");
    assert_eq!(invoice.vendor_name, "Hyderabad Steels Pvt");
    assert_eq!(invoice.total_tax, 81_000.0);
    assert_eq!(invoice.total, 531_000.0);
    assert_eq!(invoice.period, "2025-07");

    let totals = invoices::invoice_totals(&pool).await.unwrap();
    assert_eq!(totals.total_invoices, 20);
    assert!(totals.mismatches > 0 && totals.mismatches < 20);
    assert!(totals.at_risk_itc >= 81_000.0);
}

#[tokio::test]
async fn test_alert_feed_is_newest_first() {
    let pool = init_in_memory().await.unwrap();
    seed_demo_data(&pool).await.unwrap();

    alerts::insert_alert(&pool, &Alert::now(AlertType::Success, "Reconciliation completed"))
        .await
        .unwrap();

    let feed = alerts::recent_alerts(&pool, alerts::ALERT_FEED_LIMIT).await.unwrap();
    assert_eq!(feed.len(), 6);
    assert_eq!(feed[0].message, "Reconciliation completed");
    assert_eq!(feed[0].time, "Just now");
    assert_eq!(feed[0].icon, "🟢");

    let limited = alerts::recent_alerts(&pool, 2).await.unwrap();
    assert_eq!(limited.len(), 2);
}

#[tokio::test]
async fn test_users_signup_and_login() {
    let pool = init_in_memory().await.unwrap();
    seed_demo_data(&pool).await.unwrap();

    let admin = users::authenticate(&pool, "admin@gstreconcile.ai", "admin123")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(admin.role, "admin");
    assert!(users::authenticate(&pool, "admin@gstreconcile.ai", "wrong")
        .await
        .unwrap()
        .is_none());
    assert!(users::authenticate(&pool, "nobody@example.com", "admin123")
        .await
        .unwrap()
        .is_none());

    let created = users::create_user(&pool, "ca@example.com", "s3cret", "CA Firm", "user", "2025-10-01")
        .await
        .unwrap();
    assert_eq!(created.name, "CA Firm");

    let duplicate =
        users::create_user(&pool, "ca@example.com", "other", "Other", "user", "2025-10-02").await;
    assert!(matches!(duplicate, Err(Error::InvalidInput(msg)) if msg == "Email already registered"));
}
