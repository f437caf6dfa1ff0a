//! pf-db - Connection provider for Paramflow
//!
//! This crate provides the `ConnectionProvider` trait through which
//! source-driven parameters fetch their rows, and a DuckDB implementation
//! holding any number of named connections.

pub mod duckdb;
pub mod error;
pub mod traits;

pub use duckdb::DuckDbConnections;
pub use error::{DbError, DbResult};
pub use traits::{ConnectionProvider, QueryResult};
