//! Configuration module for schemagraph.
//!
//! Handles named metadata sources, aggregation tuning and layout geometry.

mod connection;
mod settings;

pub use connection::{ConnectionError, Driver};
pub use settings::{
    expand_env_vars, AggregationSettings, ConnectionSettings, Settings, SettingsError,
};
