//! gstr-api - GST reconciliation REST service
//!
//! Serves dashboard records, return ingestion, reconciliation, vendor risk
//! and audit explanations over one SQLite database.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

use gstr_api::{build_router, AppState};
use gstr_common::config::{AppConfig, CliOverrides, ENV_DATABASE, ENV_ROOT_FOLDER};
use gstr_common::db::{init_database, seed_demo_data};
use gstr_common::risk::ComplianceModel;

/// Command-line arguments for gstr-api
#[derive(Parser, Debug)]
#[command(name = "gstr-api")]
#[command(about = "GST reconciliation REST service")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root folder holding the database
    #[arg(short, long, env = ENV_ROOT_FOLDER)]
    root_folder: Option<PathBuf>,

    /// Database file (overrides <root_folder>/gstr.db)
    #[arg(short, long, env = ENV_DATABASE)]
    database: Option<PathBuf>,

    /// Interface to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (GSTR_PORT is read by the config resolver)
    #[arg(short, long)]
    port: Option<u16>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            config_file: self.config.clone(),
            root_folder: self.root_folder.clone(),
            database: self.database.clone(),
            host: self.host.clone(),
            port: self.port,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG wins; otherwise start at info and switch to the configured level
    let rust_log = EnvFilter::try_from_default_env().ok();
    let from_env = rust_log.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(rust_log.unwrap_or_else(|| EnvFilter::new("info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting GST ReconcileAI service (gstr-api) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let args = Args::parse();
    let config = AppConfig::resolve(&args.overrides());

    if !from_env {
        if let Err(e) = filter_handle.reload(EnvFilter::new(&config.log_level)) {
            warn!("Could not apply log level '{}': {}", config.log_level, e);
        }
    }

    info!("Database path: {}", config.database_path.display());
    let pool = match init_database(&config.database_path).await {
        Ok(pool) => {
            info!("✓ Connected to database");
            pool
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    if config.seed_demo_data {
        let seeded = seed_demo_data(&pool).await.context("Failed to seed demo data")?;
        info!(
            "Demo data: {} vendors, {} invoices, {} users, {} alerts inserted",
            seeded.vendors, seeded.invoices, seeded.users, seeded.alerts
        );
    }

    let model = ComplianceModel::reference().context("Failed to fit compliance model")?;
    info!("Compliance model ready (threshold {:.3})", model.threshold());

    let state = AppState::new(pool, model, &config.llm).context("Failed to build state")?;
    if state.explainer.llm_enabled() {
        info!("Explanations: LLM ({})", config.llm.model);
    } else {
        info!("Explanations: templates (no LLM API key configured)");
    }

    let app = build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("gstr-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
