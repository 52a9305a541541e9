//! Property graph of vendors, invoices, returns and shipment documents
//!
//! ```text
//! (Vendor)-[ISSUED_INVOICE]->(Invoice)-[REPORTED_IN {as filed}]->(GSTR)
//!                                     -[ELECTRONIC_VERSION]->(EInvoice)
//!                                     -[COVERS_SHIPMENT]->(EWayBill)
//! ```
//!
//! Stored in the same SQLite database as the document store.

pub mod queries;
pub mod store;
pub mod types;

pub use queries::{
    is_mismatched, FiledValues, Filing, InvoiceContext, ReturnFiling, VendorContext,
};
pub use store::{GraphStore, GraphTx};
pub use types::{invoice_key, props, Edge, EdgeId, Label, Node, NodeId, Properties, RelType};
