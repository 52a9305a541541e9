//! gstr-ingest - batch loader for return filings and shipment documents
//!
//! Writes into the same database the REST service reads, so documents can
//! be loaded and reconciled from scripts without the service running.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use gstr_common::config::{AppConfig, CliOverrides, ENV_DATABASE};
use gstr_common::db::init_database;
use gstr_common::ingest::{
    self, load_document, EInvoiceRecord, EWayBillRecord, Gstr1Document, Gstr2bDocument,
    IngestSummary,
};
use gstr_common::reconcile::ReconciliationEngine;
use gstr_common::GraphStore;

#[derive(Parser, Debug)]
#[command(name = "gstr-ingest", version, about = "Load GST returns into the graph and reconcile them")]
struct Cli {
    /// Database file (overrides the configured one)
    #[arg(long, global = true, env = ENV_DATABASE)]
    database: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a seller's GSTR-1 JSON for one period
    Gstr1 {
        #[arg(long)]
        file: PathBuf,
        /// Return period, YYYY-MM
        #[arg(long)]
        period: String,
    },
    /// Load a buyer's GSTR-2B JSON for one period
    Gstr2b {
        #[arg(long)]
        file: PathBuf,
        /// Return period, YYYY-MM
        #[arg(long)]
        period: String,
    },
    /// Link a JSON array of IRP e-Invoices to their invoices
    Einvoice {
        #[arg(long)]
        file: PathBuf,
    },
    /// Link a JSON array of e-Way Bills to their invoices
    Ewaybill {
        #[arg(long)]
        file: PathBuf,
    },
    /// Reconcile a period and print the ranked report as JSON
    Reconcile {
        /// Return period, YYYY-MM
        #[arg(long)]
        period: String,
        /// Write match statuses back onto the invoices
        #[arg(long)]
        apply: bool,
    },
}

fn read<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    load_document(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn print_summary(summary: &IngestSummary) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::resolve(&CliOverrides {
        config_file: cli.config.clone(),
        database: cli.database.clone(),
        ..CliOverrides::default()
    });

    info!("Database path: {}", config.database_path.display());
    let pool = init_database(&config.database_path)
        .await
        .context("Failed to open database")?;
    let graph = GraphStore::new(pool);

    match cli.command {
        Command::Gstr1 { file, period } => {
            let doc: Gstr1Document = read(&file)?;
            print_summary(&ingest::ingest_gstr1(&graph, &doc, &period).await?)?;
        }
        Command::Gstr2b { file, period } => {
            let doc: Gstr2bDocument = read(&file)?;
            print_summary(&ingest::ingest_gstr2b(&graph, &doc, &period).await?)?;
        }
        Command::Einvoice { file } => {
            let records: Vec<EInvoiceRecord> = read(&file)?;
            print_summary(&ingest::ingest_einvoice(&graph, &records).await?)?;
        }
        Command::Ewaybill { file } => {
            let records: Vec<EWayBillRecord> = read(&file)?;
            print_summary(&ingest::ingest_ewaybill(&graph, &records).await?)?;
        }
        Command::Reconcile { period, apply } => {
            let engine = ReconciliationEngine::new(graph);
            let report = engine.full_reconciliation(&period).await?;
            if apply {
                let statuses = engine.apply_statuses(&report).await?;
                info!(
                    "{} invoices matched, {} mismatched",
                    statuses.matched, statuses.mismatched
                );
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
