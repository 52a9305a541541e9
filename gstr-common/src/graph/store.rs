//! SQLite-backed property graph storage
//!
//! Nodes are unique per `(label, key)` and edges per `(src, rel, dst)`, so
//! every write is a merge: re-ingesting a document updates properties in
//! place instead of creating duplicates.

use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqliteExecutor, SqlitePool, Transaction};
use tracing::debug;

use super::types::{Edge, EdgeId, Label, Node, NodeId, Properties, RelType};
use crate::{Error, Result};

/// Property graph over the `graph_nodes` / `graph_edges` tables
#[derive(Debug, Clone)]
pub struct GraphStore {
    pool: SqlitePool,
}

impl GraphStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create or update a node, merging properties
    ///
    /// Keys present in `props` overwrite stored values; keys absent from
    /// `props` are retained. A `null` value removes the key.
    pub async fn merge_node(&self, label: Label, key: &str, props: Properties) -> Result<NodeId> {
        merge_node_on(&self.pool, label, key, props).await
    }

    /// Create or update an edge, merging properties
    pub async fn merge_edge(
        &self,
        src: NodeId,
        rel: RelType,
        dst: NodeId,
        props: Properties,
    ) -> Result<EdgeId> {
        merge_edge_on(&self.pool, src, rel, dst, props).await
    }

    /// Start a write batch; nothing is visible to readers until `commit`
    pub async fn begin(&self) -> Result<GraphTx> {
        Ok(GraphTx {
            tx: self.pool.begin().await?,
        })
    }

    /// Look up a node by label and key
    pub async fn find_node(&self, label: Label, key: &str) -> Result<Option<Node>> {
        let row = sqlx::query(
            "SELECT id, label, node_key, properties FROM graph_nodes WHERE label = ? AND node_key = ?",
        )
        .bind(label.as_str())
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(node_from_row).transpose()
    }

    /// Look up a node by id
    pub async fn get_node(&self, id: NodeId) -> Result<Option<Node>> {
        let row = sqlx::query("SELECT id, label, node_key, properties FROM graph_nodes WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(node_from_row).transpose()
    }

    /// Set a single property on an existing node
    pub async fn set_node_property(&self, id: NodeId, key: &str, value: Value) -> Result<()> {
        let mut patch = Properties::new();
        patch.insert(key.to_string(), value);

        let result = sqlx::query(
            r#"
            UPDATE graph_nodes
            SET properties = json_patch(properties, ?), updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(Value::Object(patch).to_string())
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Graph node {}", id)));
        }
        Ok(())
    }

    /// Edges of a type leaving `id`, each paired with its target node
    pub async fn outgoing(&self, id: NodeId, rel: RelType) -> Result<Vec<(Edge, Node)>> {
        let rows = sqlx::query(
            r#"
            SELECT e.id AS edge_id, e.src, e.rel_type, e.dst, e.properties AS edge_props,
                   n.id, n.label, n.node_key, n.properties
            FROM graph_edges e
            JOIN graph_nodes n ON n.id = e.dst
            WHERE e.src = ? AND e.rel_type = ?
            ORDER BY e.id
            "#,
        )
        .bind(id.0)
        .bind(rel.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Ok((edge_from_row(row)?, node_from_row(row)?)))
            .collect()
    }

    /// Edges of a type arriving at `id`, each paired with its source node
    pub async fn incoming(&self, id: NodeId, rel: RelType) -> Result<Vec<(Edge, Node)>> {
        let rows = sqlx::query(
            r#"
            SELECT e.id AS edge_id, e.src, e.rel_type, e.dst, e.properties AS edge_props,
                   n.id, n.label, n.node_key, n.properties
            FROM graph_edges e
            JOIN graph_nodes n ON n.id = e.src
            WHERE e.dst = ? AND e.rel_type = ?
            ORDER BY e.id
            "#,
        )
        .bind(id.0)
        .bind(rel.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Ok((edge_from_row(row)?, node_from_row(row)?)))
            .collect()
    }

    /// All nodes with a label, ordered by key
    pub async fn nodes_by_label(&self, label: Label) -> Result<Vec<Node>> {
        let rows = sqlx::query(
            "SELECT id, label, node_key, properties FROM graph_nodes WHERE label = ? ORDER BY node_key",
        )
        .bind(label.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(node_from_row).collect()
    }

    pub async fn node_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM graph_nodes")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn edge_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM graph_edges")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Remove every node and edge
    pub async fn clear(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM graph_edges").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM graph_nodes").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }
}

/// Graph writes inside one database transaction
///
/// Dropping without `commit` rolls every write back.
pub struct GraphTx {
    tx: Transaction<'static, Sqlite>,
}

impl GraphTx {
    pub async fn merge_node(&mut self, label: Label, key: &str, props: Properties) -> Result<NodeId> {
        merge_node_on(&mut *self.tx, label, key, props).await
    }

    pub async fn merge_edge(
        &mut self,
        src: NodeId,
        rel: RelType,
        dst: NodeId,
        props: Properties,
    ) -> Result<EdgeId> {
        merge_edge_on(&mut *self.tx, src, rel, dst, props).await
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

async fn merge_node_on(
    executor: impl SqliteExecutor<'_>,
    label: Label,
    key: &str,
    props: Properties,
) -> Result<NodeId> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO graph_nodes (label, node_key, properties)
        VALUES (?, ?, ?)
        ON CONFLICT(label, node_key) DO UPDATE SET
            properties = json_patch(graph_nodes.properties, excluded.properties),
            updated_at = CURRENT_TIMESTAMP
        RETURNING id
        "#,
    )
    .bind(label.as_str())
    .bind(key)
    .bind(Value::Object(props).to_string())
    .fetch_one(executor)
    .await?;

    debug!("Merged {} node {} ({})", label, key, id);
    Ok(NodeId(id))
}

async fn merge_edge_on(
    executor: impl SqliteExecutor<'_>,
    src: NodeId,
    rel: RelType,
    dst: NodeId,
    props: Properties,
) -> Result<EdgeId> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO graph_edges (src, rel_type, dst, properties)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(src, rel_type, dst) DO UPDATE SET
            properties = json_patch(graph_edges.properties, excluded.properties)
        RETURNING id
        "#,
    )
    .bind(src.0)
    .bind(rel.as_str())
    .bind(dst.0)
    .bind(Value::Object(props).to_string())
    .fetch_one(executor)
    .await?;

    Ok(EdgeId(id))
}

fn parse_properties(raw: &str) -> Result<Properties> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::Internal(format!(
            "Graph properties are not an object: {}",
            other
        ))),
    }
}

pub(crate) fn node_from_row(row: &SqliteRow) -> Result<Node> {
    let label: String = row.get("label");
    let properties: String = row.get("properties");
    Ok(Node {
        id: NodeId(row.get("id")),
        label: Label::parse(&label)
            .ok_or_else(|| Error::Internal(format!("Unknown graph label: {}", label)))?,
        key: row.get("node_key"),
        properties: parse_properties(&properties)?,
    })
}

fn edge_from_row(row: &SqliteRow) -> Result<Edge> {
    let rel: String = row.get("rel_type");
    let properties: String = row.get("edge_props");
    Ok(Edge {
        id: EdgeId(row.get("edge_id")),
        src: NodeId(row.get("src")),
        rel: RelType::parse(&rel)
            .ok_or_else(|| Error::Internal(format!("Unknown relationship type: {}", rel)))?,
        dst: NodeId(row.get("dst")),
        properties: parse_properties(&properties)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_in_memory;
    use crate::graph::types::props;
    use serde_json::json;

    async fn store() -> GraphStore {
        GraphStore::new(init_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_merge_node_is_idempotent_and_merges_properties() {
        let graph = store().await;

        let first = graph
            .merge_node(Label::Vendor, "29AABCU9603R1ZM", props([("name", json!("Tata Steel"))]))
            .await
            .unwrap();
        let second = graph
            .merge_node(Label::Vendor, "29AABCU9603R1ZM", props([("pagerank", json!(0.4))]))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(graph.node_count().await.unwrap(), 1);

        let node = graph
            .find_node(Label::Vendor, "29AABCU9603R1ZM")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(node.get_str("name"), Some("Tata Steel"));
        assert_eq!(node.get_f64("pagerank"), Some(0.4));
    }

    #[tokio::test]
    async fn test_same_key_under_different_labels_is_distinct() {
        let graph = store().await;
        let a = graph.merge_node(Label::EInvoice, "X1", Properties::new()).await.unwrap();
        let b = graph.merge_node(Label::EWayBill, "X1", Properties::new()).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(graph.node_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_merge_edge_and_traversal() {
        let graph = store().await;
        let vendor = graph.merge_node(Label::Vendor, "V", Properties::new()).await.unwrap();
        let invoice = graph.merge_node(Label::Invoice, "V/1", Properties::new()).await.unwrap();

        let e1 = graph
            .merge_edge(vendor, RelType::IssuedInvoice, invoice, props([("a", json!(1))]))
            .await
            .unwrap();
        let e2 = graph
            .merge_edge(vendor, RelType::IssuedInvoice, invoice, props([("b", json!(2))]))
            .await
            .unwrap();
        assert_eq!(e1, e2);
        assert_eq!(graph.edge_count().await.unwrap(), 1);

        let out = graph.outgoing(vendor, RelType::IssuedInvoice).await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].1.key, "V/1");
        assert_eq!(out[0].0.properties.get("a"), Some(&json!(1)));
        assert_eq!(out[0].0.properties.get("b"), Some(&json!(2)));

        let inc = graph.incoming(invoice, RelType::IssuedInvoice).await.unwrap();
        assert_eq!(inc.len(), 1);
        assert_eq!(inc[0].1.label, Label::Vendor);

        assert!(graph.outgoing(vendor, RelType::ReportedIn).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_node_property() {
        let graph = store().await;
        let id = graph
            .merge_node(Label::Invoice, "V/1", props([("hsn", json!("7208"))]))
            .await
            .unwrap();

        graph
            .set_node_property(id, "match_status", json!("Matched"))
            .await
            .unwrap();

        let node = graph.get_node(id).await.unwrap().unwrap();
        assert_eq!(node.get_str("match_status"), Some("Matched"));
        assert_eq!(node.get_str("hsn"), Some("7208"));

        let missing = graph.set_node_property(NodeId(999), "x", json!(1)).await;
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let graph = store().await;
        let a = graph.merge_node(Label::Vendor, "V", Properties::new()).await.unwrap();
        let b = graph.merge_node(Label::Invoice, "V/1", Properties::new()).await.unwrap();
        graph
            .merge_edge(a, RelType::IssuedInvoice, b, Properties::new())
            .await
            .unwrap();

        graph.clear().await.unwrap();
        assert_eq!(graph.node_count().await.unwrap(), 0);
        assert_eq!(graph.edge_count().await.unwrap(), 0);
        assert!(graph.nodes_by_label(Label::Vendor).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transaction_commits_or_rolls_back() {
        let graph = store().await;

        let mut tx = graph.begin().await.unwrap();
        let a = tx.merge_node(Label::Vendor, "V", Properties::new()).await.unwrap();
        let b = tx.merge_node(Label::Invoice, "V/1", Properties::new()).await.unwrap();
        tx.merge_edge(a, RelType::IssuedInvoice, b, Properties::new())
            .await
            .unwrap();
        drop(tx);
        assert_eq!(graph.node_count().await.unwrap(), 0);
        assert_eq!(graph.edge_count().await.unwrap(), 0);

        let mut tx = graph.begin().await.unwrap();
        tx.merge_node(Label::Vendor, "V", Properties::new()).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(graph.node_count().await.unwrap(), 1);
    }
}
