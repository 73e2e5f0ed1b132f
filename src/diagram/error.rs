//! Load-cycle errors.

use thiserror::Error;

use crate::aggregate::AggregateError;

#[derive(Debug, Error)]
pub enum LoadError {
    /// A metadata fetch failed; nothing was published.
    #[error("failed to load schema: {0}")]
    Fetch(#[from] AggregateError),

    /// A newer refresh started before this one finished.
    #[error("load superseded by a newer refresh")]
    Superseded,
}

impl LoadError {
    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded)
    }
}
