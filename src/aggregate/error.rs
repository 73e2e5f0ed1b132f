//! Aggregation error types.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::metadata::MetadataError;

/// Result type for aggregation.
pub type AggregateResult<T> = Result<T, AggregateError>;

/// Which remote call a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    ListTables,
    Columns,
    ForeignKeys,
}

impl FetchPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchPhase::ListTables => "table list",
            FetchPhase::Columns => "columns",
            FetchPhase::ForeignKeys => "foreign keys",
        }
    }
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A load cycle failed. Any single failing fetch fails the whole cycle.
///
/// `target` is the table name, or the connection id for [`FetchPhase::ListTables`].
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("failed to load {phase} for `{target}`: {source}")]
    Fetch {
        phase: FetchPhase,
        target: String,
        #[source]
        source: MetadataError,
    },

    #[error("timed out after {}ms loading {phase} for `{target}`", .after.as_millis())]
    Timeout {
        phase: FetchPhase,
        target: String,
        after: Duration,
    },
}

impl AggregateError {
    pub fn phase(&self) -> FetchPhase {
        match self {
            Self::Fetch { phase, .. } | Self::Timeout { phase, .. } => *phase,
        }
    }

    /// The table whose fetch failed, if the failure is table-scoped.
    pub fn table(&self) -> Option<&str> {
        match self {
            Self::Fetch { phase, target, .. } | Self::Timeout { phase, target, .. } => {
                (*phase != FetchPhase::ListTables).then_some(target.as_str())
            }
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
