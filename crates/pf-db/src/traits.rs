//! Connection provider trait definition

use crate::error::DbResult;
use async_trait::async_trait;
use serde_json::Value;

/// Rows returned by a query, with their column names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Position of a column, matched case-insensitively
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .or_else(|| self.columns.iter().position(|c| c.eq_ignore_ascii_case(name)))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Source of tabular rows for `create_from_source` parameters.
///
/// Implementations must be Send + Sync; one provider is shared by every
/// project of a service.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Run `query` on the named connection and return all rows
    async fn execute(&self, connection_name: &str, query: &str) -> DbResult<QueryResult>;

    /// Provider type identifier for logging
    fn provider_type(&self) -> &'static str;
}
