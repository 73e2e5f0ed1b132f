use async_trait::async_trait;
use schemagraph::diagram::{LoadError, SchemaDiagram};
use schemagraph::metadata::{
    ColumnInfo, ForeignKeyRef, MetadataError, MetadataProvider, MetadataResult, TableSnapshot,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Provider with swappable schemas, gated connections and injected failures.
#[derive(Default)]
struct ScriptedProvider {
    schemas: Mutex<HashMap<String, Vec<TableSnapshot>>>,
    /// Connections whose table listing waits until notified
    gates: HashMap<String, Arc<Notify>>,
    /// Signalled when a gated listing starts waiting
    entered: Notify,
    failing_foreign_keys: Mutex<Option<String>>,
}

impl ScriptedProvider {
    fn with_schema(self, connection_id: &str, tables: Vec<TableSnapshot>) -> Self {
        self.set_schema(connection_id, tables);
        self
    }

    fn with_gate(mut self, connection_id: &str) -> Self {
        self.gates
            .insert(connection_id.to_string(), Arc::new(Notify::new()));
        self
    }

    fn set_schema(&self, connection_id: &str, tables: Vec<TableSnapshot>) {
        self.schemas
            .lock()
            .unwrap()
            .insert(connection_id.to_string(), tables);
    }

    fn fail_foreign_keys_of(&self, table: Option<&str>) {
        *self.failing_foreign_keys.lock().unwrap() = table.map(str::to_string);
    }

    fn table(&self, connection_id: &str, table: &str) -> MetadataResult<TableSnapshot> {
        let schemas = self.schemas.lock().unwrap();
        let tables = schemas
            .get(connection_id)
            .ok_or_else(|| MetadataError::ConnectionNotFound(connection_id.to_string()))?;
        tables
            .iter()
            .find(|t| t.name == table)
            .cloned()
            .ok_or_else(|| MetadataError::TableNotFound(table.to_string()))
    }
}

#[async_trait]
impl MetadataProvider for ScriptedProvider {
    async fn list_tables(&self, connection_id: &str) -> MetadataResult<Vec<String>> {
        if let Some(gate) = self.gates.get(connection_id) {
            self.entered.notify_one();
            gate.notified().await;
        }
        let schemas = self.schemas.lock().unwrap();
        schemas
            .get(connection_id)
            .map(|tables| tables.iter().map(|t| t.name.clone()).collect())
            .ok_or_else(|| MetadataError::ConnectionNotFound(connection_id.to_string()))
    }

    async fn get_columns(
        &self,
        connection_id: &str,
        table: &str,
    ) -> MetadataResult<Vec<ColumnInfo>> {
        Ok(self.table(connection_id, table)?.columns)
    }

    async fn get_foreign_keys(
        &self,
        connection_id: &str,
        table: &str,
    ) -> MetadataResult<Vec<ForeignKeyRef>> {
        if self.failing_foreign_keys.lock().unwrap().as_deref() == Some(table) {
            return Err(MetadataError::Connection("connection reset".to_string()));
        }
        Ok(self.table(connection_id, table)?.foreign_keys)
    }
}

fn table(name: &str, references: &[&str]) -> TableSnapshot {
    let mut t = TableSnapshot::new(name).with_column(ColumnInfo::primary_key("id", "INTEGER"));
    for target in references {
        let column = format!("{}_id", target);
        t = t
            .with_column(ColumnInfo::new(&column, "INTEGER"))
            .with_foreign_key(ForeignKeyRef::new(column, *target, "id"));
    }
    t
}

fn five_tables() -> Vec<TableSnapshot> {
    vec![
        table("users", &[]),
        table("products", &[]),
        table("orders", &["users"]),
        table("order_items", &["orders", "products"]),
        table("payments", &["orders"]),
    ]
}

#[tokio::test]
async fn test_refresh_publishes_diagram() {
    let provider = Arc::new(ScriptedProvider::default().with_schema("shop", five_tables()));
    let pipeline = SchemaDiagram::new(provider);

    assert!(pipeline.current().await.is_none());
    assert!(!pipeline.is_loading());

    let diagram = pipeline.refresh("shop").await.unwrap();

    assert_eq!(diagram.connection_id, "shop");
    assert_eq!(diagram.generation, 1);
    assert_eq!(diagram.nodes.len(), 5);
    assert_eq!(diagram.edges.len(), 4);
    assert!(!pipeline.is_loading());

    let current = pipeline.current().await.unwrap();
    assert!(Arc::ptr_eq(&current, &diagram));
}

#[tokio::test]
async fn test_failed_fetch_keeps_previous_diagram() {
    let provider = Arc::new(ScriptedProvider::default().with_schema("shop", five_tables()));
    let pipeline = SchemaDiagram::new(Arc::clone(&provider));

    let before = pipeline.refresh("shop").await.unwrap();

    // Third of five tables fails on its foreign keys
    provider.fail_foreign_keys_of(Some("orders"));
    let err = pipeline.refresh("shop").await.unwrap_err();

    assert!(matches!(err, LoadError::Fetch(_)));
    assert!(err.to_string().contains("orders"));

    let current = pipeline.current().await.unwrap();
    assert!(Arc::ptr_eq(&current, &before));
    assert_eq!(current.generation, 1);

    let status = pipeline.status().await;
    assert!(!status.loading);
    assert_eq!(status.generation, 2);
    let last_error = status.last_error.unwrap();
    assert!(last_error.contains("connection reset"), "{last_error}");

    // Explicit retry clears the error
    provider.fail_foreign_keys_of(None);
    let after = pipeline.refresh("shop").await.unwrap();
    assert_eq!(after.generation, 3);
    assert!(pipeline.status().await.last_error.is_none());
}

#[tokio::test]
async fn test_failure_before_first_success_publishes_nothing() {
    let provider = Arc::new(ScriptedProvider::default());
    let pipeline = SchemaDiagram::new(provider);

    let err = pipeline.refresh("unknown").await.unwrap_err();

    assert!(matches!(err, LoadError::Fetch(_)));
    assert!(pipeline.current().await.is_none());
    assert!(pipeline.status().await.last_error.is_some());
}

#[tokio::test]
async fn test_newer_refresh_supersedes_pending_one() {
    let provider = Arc::new(
        ScriptedProvider::default()
            .with_schema("a", vec![table("alpha", &[])])
            .with_schema("b", vec![table("beta", &[]), table("gamma", &["beta"])])
            .with_gate("a"),
    );
    let pipeline = Arc::new(SchemaDiagram::new(Arc::clone(&provider)));

    let pending = tokio::spawn({
        let pipeline = Arc::clone(&pipeline);
        async move { pipeline.refresh("a").await }
    });

    provider.entered.notified().await;
    assert!(pipeline.is_loading());

    let latest = pipeline.refresh("b").await.unwrap();
    assert_eq!(latest.connection_id, "b");

    let superseded = pending.await.unwrap();
    assert!(matches!(superseded, Err(LoadError::Superseded)));

    let current = pipeline.current().await.unwrap();
    assert_eq!(current.connection_id, "b");
    assert_eq!(current.generation, 2);
    assert!(current.node("beta").is_some());
    assert!(current.node("alpha").is_none());
    assert!(!pipeline.is_loading());
    assert!(pipeline.status().await.last_error.is_none());
}

#[tokio::test]
async fn test_loading_flag_tracks_newest_refresh() {
    let provider = Arc::new(
        ScriptedProvider::default()
            .with_schema("slow", vec![table("users", &[])])
            .with_gate("slow"),
    );
    let pipeline = Arc::new(SchemaDiagram::new(Arc::clone(&provider)));

    let task = tokio::spawn({
        let pipeline = Arc::clone(&pipeline);
        async move { pipeline.refresh("slow").await }
    });

    provider.entered.notified().await;
    assert!(pipeline.is_loading());
    assert!(pipeline.status().await.loading);

    provider.gates["slow"].notify_one();
    let diagram = task.await.unwrap().unwrap();

    assert_eq!(diagram.nodes.len(), 1);
    assert!(!pipeline.is_loading());
}

#[tokio::test]
async fn test_readers_keep_their_snapshot() {
    let provider =
        Arc::new(ScriptedProvider::default().with_schema("shop", vec![table("users", &[])]));
    let pipeline = SchemaDiagram::new(Arc::clone(&provider));

    let old = pipeline.refresh("shop").await.unwrap();
    provider.set_schema("shop", five_tables());
    let new = pipeline.refresh("shop").await.unwrap();

    assert_eq!(old.nodes.len(), 1);
    assert_eq!(new.nodes.len(), 5);
    assert_ne!(old.fingerprint, new.fingerprint);
}

#[tokio::test]
async fn test_unchanged_schema_keeps_fingerprint() {
    let provider = Arc::new(ScriptedProvider::default().with_schema("shop", five_tables()));
    let pipeline = SchemaDiagram::new(provider);

    let first = pipeline.refresh("shop").await.unwrap();
    let second = pipeline.refresh("shop").await.unwrap();

    assert_eq!(first.fingerprint, second.fingerprint);
    assert_eq!(first.layout, second.layout);
    assert_eq!(first.edges, second.edges);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_refresh_clears_loading_flag() {
    let provider = Arc::new(
        ScriptedProvider::default()
            .with_schema("slow", vec![table("users", &[])])
            .with_gate("slow"),
    );
    let pipeline = SchemaDiagram::new(Arc::clone(&provider));

    let outcome = tokio::time::timeout(Duration::from_millis(20), pipeline.refresh("slow")).await;
    assert!(outcome.is_err());

    assert!(!pipeline.is_loading());
    let status = pipeline.status().await;
    assert!(!status.loading);
    assert_eq!(status.generation, 1);
    assert!(pipeline.current().await.is_none());

    // The next refresh is unaffected
    provider.gates["slow"].notify_one();
    let diagram = pipeline.refresh("slow").await.unwrap();
    assert_eq!(diagram.generation, 2);
    assert!(!pipeline.is_loading());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refreshes_publish_newest_generation() {
    let provider = Arc::new(ScriptedProvider::default().with_schema("shop", five_tables()));
    let pipeline = Arc::new(SchemaDiagram::new(provider));

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move { pipeline.refresh("shop").await })
        })
        .collect();

    let mut published = Vec::new();
    for task in tasks {
        match task.await.unwrap() {
            Ok(diagram) => published.push(diagram.generation),
            Err(err) => assert!(err.is_superseded(), "{err}"),
        }
    }

    let status = pipeline.status().await;
    assert_eq!(status.generation, 16);
    assert!(!status.loading);
    assert!(published.contains(&16));
    assert_eq!(pipeline.current().await.unwrap().generation, 16);
}
