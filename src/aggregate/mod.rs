//! Metadata aggregation for one load cycle.
//!
//! The aggregator lists the tables of a connection, then fetches columns and
//! foreign keys for every table concurrently under a concurrency budget:
//!
//! ```text
//!   list_tables ──► [t1, t2, t3, ...]
//!                     │
//!                     ▼  buffered(concurrency), table-list order
//!   t1: try_join(get_columns, get_foreign_keys) ─┐
//!   t2: try_join(get_columns, get_foreign_keys) ─┼─► Vec<TableSnapshot>
//!   t3: ...                                      ─┘
//! ```
//!
//! The first failing fetch fails the whole cycle and drops the fetches still
//! in flight. No partial snapshot is ever returned.

mod error;

pub use error::{AggregateError, AggregateResult, FetchPhase};

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::metadata::{MetadataProvider, MetadataResult, TableSnapshot};

/// Default number of tables fetched at once.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Aggregation configuration.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Maximum number of tables with fetches in flight.
    pub concurrency: usize,
    /// Upper bound for each remote call. `None` leaves it to the provider.
    pub fetch_timeout: Option<Duration>,
    /// Tables whose name matches any pattern are skipped.
    pub exclude_tables: Vec<Regex>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            fetch_timeout: None,
            exclude_tables: Vec::new(),
        }
    }
}

impl AggregatorConfig {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    pub fn with_exclude(mut self, pattern: Regex) -> Self {
        self.exclude_tables.push(pattern);
        self
    }

    pub fn is_excluded(&self, table: &str) -> bool {
        self.exclude_tables.iter().any(|re| re.is_match(table))
    }
}

/// Collects a consistent [`TableSnapshot`] sequence from a provider.
pub struct MetadataAggregator<P: ?Sized> {
    provider: Arc<P>,
    config: AggregatorConfig,
}

impl<P: MetadataProvider + ?Sized> MetadataAggregator<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            config: AggregatorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AggregatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Fetch the full schema snapshot of a connection.
    ///
    /// Snapshots come back in table-list order regardless of which fetch
    /// finishes first.
    pub async fn load(&self, connection_id: &str) -> AggregateResult<Vec<TableSnapshot>> {
        let names = self
            .bounded(
                FetchPhase::ListTables,
                connection_id,
                self.provider.list_tables(connection_id),
            )
            .await?;

        let names = self.select_tables(names);
        debug!(
            connection = connection_id,
            tables = names.len(),
            concurrency = self.config.concurrency,
            "fetching table metadata"
        );

        let tables: Vec<TableSnapshot> = stream::iter(names)
            .map(|name| self.fetch_table(connection_id, name))
            .buffered(self.config.concurrency.max(1))
            .try_collect()
            .await?;

        info!(
            connection = connection_id,
            tables = tables.len(),
            "aggregated schema metadata"
        );
        Ok(tables)
    }

    /// Apply exclusions and collapse duplicate names to their first occurrence.
    fn select_tables(&self, names: Vec<String>) -> Vec<String> {
        let mut seen = HashSet::new();
        names
            .into_iter()
            .filter(|name| {
                if self.config.is_excluded(name) {
                    debug!(table = %name, "table excluded");
                    return false;
                }
                if !seen.insert(name.clone()) {
                    warn!(table = %name, "duplicate table name, keeping first occurrence");
                    return false;
                }
                true
            })
            .collect()
    }

    async fn fetch_table(
        &self,
        connection_id: &str,
        name: String,
    ) -> AggregateResult<TableSnapshot> {
        let columns = self.bounded(
            FetchPhase::Columns,
            &name,
            self.provider.get_columns(connection_id, &name),
        );
        let foreign_keys = self.bounded(
            FetchPhase::ForeignKeys,
            &name,
            self.provider.get_foreign_keys(connection_id, &name),
        );

        let (columns, foreign_keys) = futures::try_join!(columns, foreign_keys)?;
        Ok(TableSnapshot {
            name,
            columns,
            foreign_keys,
        })
    }

    /// Await a remote call under the configured timeout, tagging failures.
    async fn bounded<T, F>(&self, phase: FetchPhase, target: &str, call: F) -> AggregateResult<T>
    where
        F: Future<Output = MetadataResult<T>>,
    {
        let result = match self.config.fetch_timeout {
            Some(after) => tokio::time::timeout(after, call).await.map_err(|_| {
                AggregateError::Timeout {
                    phase,
                    target: target.to_string(),
                    after,
                }
            })?,
            None => call.await,
        };

        result.map_err(|source| {
            warn!(phase = %phase, subject = target, error = %source, "metadata fetch failed");
            AggregateError::Fetch {
                phase,
                target: target.to_string(),
                source,
            }
        })
    }
}
