//! Extraction of nodes and edges from provider entities.
//!
//! This module provides:
//! - Entity discovery with exclusion patterns
//! - Column reading, preferring parsed schema data over live introspection
//! - Association reading into typed edges
//!
//! Every failure here is recovered: an entity or association that cannot be
//! read is logged and contributes nothing.

mod associations;
mod columns;
mod scanner;

pub use associations::AssociationReader;
pub use columns::ColumnReader;
pub use scanner::ModelScanner;
