//! # GSTR Common Library
//!
//! Shared code for the GST reconciliation service and its batch loader:
//! - Document-store records (vendors, invoices, alerts, users)
//! - Property graph over SQLite (vendors, invoices, returns, shipment documents)
//! - Return ingestion (GSTR-1, GSTR-2B, e-Invoice, e-Way Bill)
//! - Reconciliation between seller and buyer returns
//! - Vendor compliance risk scoring
//! - Audit explanations (template and LLM-backed)
//! - Configuration loading

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod explain;
pub mod graph;
pub mod ingest;
pub mod models;
pub mod reconcile;
pub mod risk;

pub use error::{Error, Result};
pub use graph::GraphStore;
