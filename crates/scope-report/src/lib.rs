//! Text report layer for the AppScope analyzer.
//!
//! Turns a merged statistics table or an apps listing into aligned,
//! tab-separated lines and writes them out with optional grep filtering.

pub mod apps_view;
pub mod layout;
pub mod stats_view;

pub use layout::{write_table, RenderedTable};
