use rusqlite::Connection;
use schemagraph::aggregate::MetadataAggregator;
use schemagraph::diagram::SchemaDiagram;
use schemagraph::metadata::{MetadataError, MetadataProvider, SqliteMetadataProvider};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn create_database(dir: &TempDir, ddl: &str) -> std::path::PathBuf {
    let path = dir.path().join("app.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(ddl).unwrap();
    path
}

const SHOP: &str = "
    CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT NOT NULL, created_at TEXT);
    CREATE TABLE orders (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id),
        total REAL
    );
    CREATE TABLE order_items (
        order_id INTEGER REFERENCES orders(id),
        sku TEXT,
        PRIMARY KEY (order_id, sku)
    );
";

fn provider_for(path: &Path) -> SqliteMetadataProvider {
    SqliteMetadataProvider::new().with_database("shop", path)
}

#[tokio::test]
async fn test_list_tables_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = create_database(&dir, SHOP);

    let tables = provider_for(&path).list_tables("shop").await.unwrap();
    assert_eq!(tables, vec!["order_items", "orders", "users"]);
}

#[tokio::test]
async fn test_columns_preserve_declaration_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = create_database(&dir, SHOP);

    let columns = provider_for(&path).get_columns("shop", "users").await.unwrap();
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["id", "email", "created_at"]);
    assert!(columns[0].is_primary_key);
    assert!(!columns[1].nullable);
    assert!(columns[2].nullable);
}

#[tokio::test]
async fn test_composite_primary_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = create_database(&dir, SHOP);

    let columns = provider_for(&path)
        .get_columns("shop", "order_items")
        .await
        .unwrap();
    assert!(columns.iter().all(|c| c.is_primary_key));
}

#[tokio::test]
async fn test_foreign_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = create_database(&dir, SHOP);

    let fks = provider_for(&path)
        .get_foreign_keys("shop", "orders")
        .await
        .unwrap();
    assert_eq!(fks.len(), 1);
    assert_eq!(fks[0].column_name, "user_id");
    assert_eq!(fks[0].referenced_table, "users");
    assert_eq!(fks[0].referenced_column, "id");
}

#[tokio::test]
async fn test_missing_file_is_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let provider = provider_for(&dir.path().join("absent.db"));

    let err = provider.list_tables("shop").await.unwrap_err();
    assert!(matches!(err, MetadataError::Connection(_)));
    assert!(err.is_connection_error());
}

#[tokio::test]
async fn test_aggregate_sqlite_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = create_database(&dir, SHOP);

    let aggregator = MetadataAggregator::new(Arc::new(provider_for(&path)));
    let tables = aggregator.load("shop").await.unwrap();

    assert_eq!(tables.len(), 3);
    assert_eq!(tables[1].name, "orders");
    assert_eq!(tables[1].foreign_keys.len(), 1);
}

#[tokio::test]
async fn test_sqlite_diagram_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = create_database(&dir, SHOP);

    let pipeline = SchemaDiagram::new(Arc::new(provider_for(&path)));
    let diagram = pipeline.refresh("shop").await.unwrap();

    assert_eq!(diagram.nodes.len(), 3);
    assert_eq!(diagram.edges.len(), 2);
    assert_eq!(diagram.dangling_references, 0);

    let users = diagram.layout.position("users").unwrap();
    let orders = diagram.layout.position("orders").unwrap();
    let items = diagram.layout.position("order_items").unwrap();
    assert!(users.x < orders.x);
    assert!(orders.x < items.x);
}
