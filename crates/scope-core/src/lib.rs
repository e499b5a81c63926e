//! Shared domain types for the AppScope analyzer.
//!
//! Holds the sample and column-store models, the error type, and the CLI
//! settings that every other crate in the workspace builds on.

pub mod error;
pub mod models;
pub mod settings;

pub use error::{IdentityKind, Result, ScopeError};
