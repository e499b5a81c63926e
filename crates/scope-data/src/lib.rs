//! Data ingestion layer for the AppScope analyzer.
//!
//! Responsible for discovering and pairing the raw-usage and power logs,
//! parsing them into samples, loading the package manifest, resolving the
//! report target and aggregating the samples into a statistics table.

pub mod aggregator;
pub mod analysis;
pub mod packages;
pub mod parser;
pub mod reader;
pub mod selector;

pub use scope_core as core;
