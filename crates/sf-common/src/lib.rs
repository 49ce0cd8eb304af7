//! Symbol Forecast common types and errors.
//!
//! This crate provides foundational types shared across sf-core modules:
//! - The validated `Symbol` type and its display catalog
//! - Common error types
//! - Persisted schema versioning

pub mod error;
pub mod schema;
pub mod symbol;

pub use error::{Error, Result};
pub use schema::SCHEMA_VERSION;
pub use symbol::{Symbol, SymbolInfo, SYMBOL_CATALOG, SYMBOL_COUNT};
