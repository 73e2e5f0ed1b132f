//! Load-cycle pipeline: aggregation → graph build → layout → publish.
//!
//! ```text
//! refresh(connection)
//!   │  generation += 1, abort the previous in-flight load
//!   ▼
//! MetadataAggregator::load      (async, the only suspension point)
//!   ▼
//! GraphBuilder::build           (sync)
//!   ▼
//! LayoutEngine::layout          (sync)
//!   ▼
//! publish Arc<Diagram>          (only if still the newest generation)
//! ```
//!
//! Published diagrams are immutable. A refresh swaps in a new `Arc`, so
//! readers holding the previous one are never affected.

mod error;

pub use error::LoadError;

use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{AbortHandle, Abortable};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::aggregate::{AggregatorConfig, MetadataAggregator};
use crate::graph::{schema_fingerprint, GraphBuilder, GraphEdge, GraphNode};
use crate::layout::{LayoutConfig, LayoutEngine, LayoutResult};
use crate::metadata::{MetadataProvider, TableSnapshot};

/// Everything the presentation layer needs to draw one schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    pub connection_id: String,
    /// Load cycle this diagram came from.
    pub generation: u64,
    /// SHA-256 of the schema snapshot.
    pub fingerprint: String,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub layout: LayoutResult,
    /// Foreign keys dropped because they referenced unknown tables.
    pub dangling_references: usize,
}

impl Diagram {
    /// Build and lay out a snapshot synchronously.
    pub fn compose(
        connection_id: impl Into<String>,
        generation: u64,
        tables: &[TableSnapshot],
        config: &LayoutConfig,
    ) -> Self {
        let graph = GraphBuilder::new(config.geometry()).build(tables);
        let layout = LayoutEngine::new(config.clone()).layout(&graph);
        let (nodes, edges) = graph.to_parts();

        Self {
            connection_id: connection_id.into(),
            generation,
            fingerprint: schema_fingerprint(tables),
            nodes,
            edges,
            layout,
            dangling_references: graph.dangling_count(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Plain-text rendering: one line per rank member, then one per edge.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{}: {} tables, {} references, {} dropped",
            self.connection_id,
            self.nodes.len(),
            self.edges.len(),
            self.dangling_references
        );
        for rank in 0..self.layout.rank_count() {
            for id in self.layout.rank_members(rank) {
                if let Some(p) = self.layout.position(id) {
                    let _ = writeln!(out, "rank {}: {} @ ({}, {})", rank, id, p.x, p.y);
                }
            }
        }
        for edge in &self.edges {
            let _ = writeln!(
                out,
                "{}: {}.{} -> {}.{}",
                edge.id,
                edge.source_node_id,
                edge.source_port_id.trim_end_matches("-source"),
                edge.target_node_id,
                edge.target_port_id.trim_end_matches("-target"),
            );
        }
        out
    }

    /// Node ids appearing in placements but not in nodes, or the reverse.
    pub fn orphaned_nodes(&self) -> Vec<&str> {
        let placed: HashSet<&str> = self
            .layout
            .placements()
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        let known: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        let mut orphans: Vec<&str> = placed.symmetric_difference(&known).copied().collect();
        orphans.sort_unstable();
        orphans
    }
}

/// Snapshot of pipeline state for the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramStatus {
    pub loading: bool,
    /// Newest generation started.
    pub generation: u64,
    /// Message of the newest failed load, cleared by the next success.
    pub last_error: Option<String>,
}

#[derive(Default)]
struct Published {
    diagram: Option<Arc<Diagram>>,
    last_error: Option<String>,
}

/// Owns the current diagram of a connection and recomputes it on refresh.
pub struct SchemaDiagram<P: ?Sized> {
    aggregator: MetadataAggregator<P>,
    layout: LayoutConfig,
    /// Newest generation started
    generation: AtomicU64,
    /// Newest generation finished (published or failed)
    settled: AtomicU64,
    in_flight: Mutex<Option<AbortHandle>>,
    state: RwLock<Published>,
}

impl<P: MetadataProvider + ?Sized> SchemaDiagram<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            aggregator: MetadataAggregator::new(provider),
            layout: LayoutConfig::default(),
            generation: AtomicU64::new(0),
            settled: AtomicU64::new(0),
            in_flight: Mutex::new(None),
            state: RwLock::new(Published::default()),
        }
    }

    pub fn with_aggregator_config(mut self, config: AggregatorConfig) -> Self {
        self.aggregator = self.aggregator.with_config(config);
        self
    }

    /// Node sizing and layout both come from this one config.
    pub fn with_layout_config(mut self, config: LayoutConfig) -> Self {
        self.layout = config;
        self
    }

    pub fn layout_config(&self) -> &LayoutConfig {
        &self.layout
    }

    /// True while the newest refresh has not finished.
    pub fn is_loading(&self) -> bool {
        self.settled.load(Ordering::SeqCst) < self.generation.load(Ordering::SeqCst)
    }

    /// The last successfully published diagram.
    pub async fn current(&self) -> Option<Arc<Diagram>> {
        self.state.read().await.diagram.clone()
    }

    pub async fn status(&self) -> DiagramStatus {
        let state = self.state.read().await;
        DiagramStatus {
            loading: self.is_loading(),
            generation: self.generation.load(Ordering::SeqCst),
            last_error: state.last_error.clone(),
        }
    }

    /// Run a full load cycle for `connection_id`.
    ///
    /// Starting a refresh aborts the one still in flight; the older call
    /// then returns [`LoadError::Superseded`]. On a fetch failure the
    /// previously published diagram stays current.
    pub async fn refresh(&self, connection_id: &str) -> Result<Arc<Diagram>, LoadError> {
        let (handle, registration) = AbortHandle::new_pair();
        // Generation order must match handle replacement order
        let generation = {
            let mut in_flight = self.in_flight.lock().await;
            if let Some(previous) = in_flight.replace(handle) {
                previous.abort();
            }
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };
        let _settle = SettleOnDrop {
            generation,
            latest: &self.generation,
            settled: &self.settled,
        };

        info!(connection = connection_id, generation, "refreshing schema diagram");

        let loaded = Abortable::new(self.aggregator.load(connection_id), registration).await;
        let outcome = match loaded {
            Err(_aborted) => Err(LoadError::Superseded),
            Ok(Err(err)) => Err(LoadError::Fetch(err)),
            Ok(Ok(tables)) => Ok(Diagram::compose(
                connection_id,
                generation,
                &tables,
                &self.layout,
            )),
        };

        self.commit(generation, outcome).await
    }

    /// Publish the outcome of `generation` if no newer refresh has started.
    async fn commit(
        &self,
        generation: u64,
        outcome: Result<Diagram, LoadError>,
    ) -> Result<Arc<Diagram>, LoadError> {
        let mut state = self.state.write().await;

        if generation != self.generation.load(Ordering::SeqCst) {
            debug!(generation, "discarding result of superseded load");
            return Err(LoadError::Superseded);
        }
        self.settled.fetch_max(generation, Ordering::SeqCst);

        match outcome {
            Ok(diagram) => {
                let diagram = Arc::new(diagram);
                info!(
                    connection = %diagram.connection_id,
                    generation,
                    nodes = diagram.nodes.len(),
                    edges = diagram.edges.len(),
                    "published schema diagram"
                );
                state.diagram = Some(Arc::clone(&diagram));
                state.last_error = None;
                Ok(diagram)
            }
            Err(err) => {
                warn!(generation, error = %err, "schema load failed");
                state.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }
}

/// Marks a generation finished when its `refresh` future completes or is
/// dropped, unless a newer refresh has started since.
struct SettleOnDrop<'a> {
    generation: u64,
    latest: &'a AtomicU64,
    settled: &'a AtomicU64,
}

impl Drop for SettleOnDrop<'_> {
    fn drop(&mut self) {
        if self.latest.load(Ordering::SeqCst) == self.generation {
            self.settled.fetch_max(self.generation, Ordering::SeqCst);
        }
    }
}
