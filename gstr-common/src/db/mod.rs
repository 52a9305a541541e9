//! SQLite document store: vendors, invoices, alerts, users
//!
//! The property graph shares the same database file; see [`crate::graph`].

pub mod alerts;
pub mod init;
pub mod invoices;
pub mod seed;
pub mod users;
pub mod vendors;

pub use init::{create_schema, init_database, init_in_memory};
pub use seed::{seed_demo_data, SeedReport};
