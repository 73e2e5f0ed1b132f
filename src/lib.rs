//! # schemagraph
//!
//! Builds entity-relationship diagrams from live database metadata.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │          MetadataProvider (sqlite, snapshot, ...)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [aggregate]
//! ┌─────────────────────────────────────────────────────────┐
//! │         Vec<TableSnapshot> (table-list order)            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [graph]
//! ┌─────────────────────────────────────────────────────────┐
//! │        SchemaGraph (nodes, port-level FK edges)          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [layout]
//! ┌─────────────────────────────────────────────────────────┐
//! │     LayoutResult (ranks, order, left-to-right coords)    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [diagram]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Arc<Diagram> published per refresh cycle          │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod aggregate;
pub mod config;
pub mod diagram;
pub mod graph;
pub mod layout;
pub mod metadata;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::aggregate::{AggregateError, AggregatorConfig, MetadataAggregator};
    pub use crate::config::{Settings, SettingsError};
    pub use crate::diagram::{Diagram, DiagramStatus, LoadError, SchemaDiagram};
    pub use crate::graph::{GraphBuilder, GraphEdge, GraphNode, SchemaGraph};
    pub use crate::layout::{LayoutConfig, LayoutEngine, LayoutResult, Position};
    pub use crate::metadata::{
        ColumnInfo, ForeignKeyRef, MetadataError, MetadataProvider, TableSnapshot,
    };
}

// Also export at crate root for convenience
pub use diagram::{Diagram, SchemaDiagram};
pub use graph::{GraphBuilder, SchemaGraph};
pub use layout::{LayoutEngine, LayoutResult};
pub use metadata::{MetadataProvider, TableSnapshot};
