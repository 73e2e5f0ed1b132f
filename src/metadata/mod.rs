//! Metadata provider module.
//!
//! This module defines the seam to the external connection that answers
//! schema questions, plus the providers shipped with the crate.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MetadataProvider                           │
//! │  - list_tables(connection)                                      │
//! │  - get_columns(connection, table)                               │
//! │  - get_foreign_keys(connection, table)                          │
//! └─────────────────────────────────────────────────────────────────┘
//!            │                                    │
//!            ▼                                    ▼
//! ┌──────────────────────────┐      ┌──────────────────────────────┐
//! │  SqliteMetadataProvider  │      │   StaticMetadataProvider     │
//! │  (PRAGMA introspection)  │      │   (JSON snapshot / fixture)  │
//! └──────────────────────────┘      └──────────────────────────────┘
//! ```

mod error;
mod provider;
mod sqlite_provider;
mod static_provider;
mod types;

pub use error::{MetadataError, MetadataResult};
pub use provider::MetadataProvider;
pub use sqlite_provider::SqliteMetadataProvider;
pub use static_provider::StaticMetadataProvider;
pub use types::{ColumnInfo, ForeignKeyRef, TableSnapshot};
