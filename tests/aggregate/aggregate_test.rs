use async_trait::async_trait;
use schemagraph::aggregate::{AggregateError, AggregatorConfig, FetchPhase, MetadataAggregator};
use schemagraph::metadata::{
    ColumnInfo, ForeignKeyRef, MetadataError, MetadataProvider, MetadataResult, TableSnapshot,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Provider over fixed tables with per-table latency and injected failures.
#[derive(Default)]
struct MockProvider {
    tables: Vec<TableSnapshot>,
    latency: HashMap<String, Duration>,
    failing_foreign_keys: Option<String>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl MockProvider {
    fn new(tables: Vec<TableSnapshot>) -> Self {
        Self {
            tables,
            ..Default::default()
        }
    }

    fn with_latency(mut self, table: &str, latency: Duration) -> Self {
        self.latency.insert(table.to_string(), latency);
        self
    }

    fn failing_foreign_keys(mut self, table: &str) -> Self {
        self.failing_foreign_keys = Some(table.to_string());
        self
    }

    fn table(&self, name: &str) -> MetadataResult<&TableSnapshot> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| MetadataError::TableNotFound(name.to_string()))
    }

    async fn delay(&self, table: &str) {
        if let Some(latency) = self.latency.get(table) {
            tokio::time::sleep(*latency).await;
        }
    }
}

#[async_trait]
impl MetadataProvider for MockProvider {
    async fn list_tables(&self, _connection_id: &str) -> MetadataResult<Vec<String>> {
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn get_columns(
        &self,
        _connection_id: &str,
        table: &str,
    ) -> MetadataResult<Vec<ColumnInfo>> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.delay(table).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(self.table(table)?.columns.clone())
    }

    async fn get_foreign_keys(
        &self,
        _connection_id: &str,
        table: &str,
    ) -> MetadataResult<Vec<ForeignKeyRef>> {
        self.delay(table).await;
        if self.failing_foreign_keys.as_deref() == Some(table) {
            return Err(MetadataError::query("permission denied for pragma"));
        }
        Ok(self.table(table)?.foreign_keys.clone())
    }
}

fn shop() -> Vec<TableSnapshot> {
    let names = ["users", "products", "orders", "order_items", "payments"];
    names
        .iter()
        .map(|name| {
            TableSnapshot::new(*name)
                .with_column(ColumnInfo::primary_key("id", "INTEGER"))
                .with_column(ColumnInfo::new("name", "TEXT"))
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_results_follow_table_list_order() {
    // Earlier tables finish last
    let provider = MockProvider::new(shop())
        .with_latency("users", Duration::from_millis(50))
        .with_latency("products", Duration::from_millis(40))
        .with_latency("orders", Duration::from_millis(30))
        .with_latency("order_items", Duration::from_millis(20))
        .with_latency("payments", Duration::from_millis(10));

    let aggregator = MetadataAggregator::new(Arc::new(provider));
    let tables = aggregator.load("shop").await.unwrap();

    let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["users", "products", "orders", "order_items", "payments"]);
    assert!(tables.iter().all(|t| t.columns.len() == 2));
}

#[tokio::test(start_paused = true)]
async fn test_failure_on_third_table_fails_whole_load() {
    let provider = MockProvider::new(shop()).failing_foreign_keys("orders");
    let aggregator = MetadataAggregator::new(Arc::new(provider));

    let err = aggregator.load("shop").await.unwrap_err();

    assert_eq!(err.phase(), FetchPhase::ForeignKeys);
    assert_eq!(err.table(), Some("orders"));
    assert!(!err.is_timeout());
    let message = err.to_string();
    assert!(message.contains("orders"), "{message}");
    assert!(message.contains("permission denied"), "{message}");
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_is_bounded() {
    let tables: Vec<TableSnapshot> = (0..12)
        .map(|i| TableSnapshot::new(format!("t{i}")).with_column(ColumnInfo::new("id", "INTEGER")))
        .collect();
    let mut provider = MockProvider::new(tables);
    for i in 0..12 {
        provider = provider.with_latency(&format!("t{i}"), Duration::from_millis(10));
    }
    let provider = Arc::new(provider);

    let aggregator = MetadataAggregator::new(Arc::clone(&provider))
        .with_config(AggregatorConfig::default().with_concurrency(3));
    let loaded = aggregator.load("wide").await.unwrap();

    assert_eq!(loaded.len(), 12);
    assert_eq!(provider.peak.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_slow_call_times_out() {
    let provider = MockProvider::new(shop()).with_latency("payments", Duration::from_secs(3600));
    let aggregator = MetadataAggregator::new(Arc::new(provider))
        .with_config(AggregatorConfig::default().with_fetch_timeout(Duration::from_millis(500)));

    let err = aggregator.load("shop").await.unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(err.table(), Some("payments"));
    assert!(matches!(
        err,
        AggregateError::Timeout { after, .. } if after == Duration::from_millis(500)
    ));
}

#[tokio::test]
async fn test_empty_schema() {
    let aggregator = MetadataAggregator::new(Arc::new(MockProvider::new(Vec::new())));
    let tables = aggregator.load("empty").await.unwrap();
    assert!(tables.is_empty());
}

#[tokio::test]
async fn test_foreign_keys_are_carried_through() {
    let tables = vec![
        TableSnapshot::new("users").with_column(ColumnInfo::primary_key("id", "INTEGER")),
        TableSnapshot::new("orders")
            .with_column(ColumnInfo::primary_key("id", "INTEGER"))
            .with_column(ColumnInfo::new("user_id", "INTEGER"))
            .with_foreign_key(ForeignKeyRef::new("user_id", "users", "id")),
    ];
    let aggregator = MetadataAggregator::new(Arc::new(MockProvider::new(tables.clone())));

    let loaded = aggregator.load("shop").await.unwrap();
    assert_eq!(loaded, tables);
}
