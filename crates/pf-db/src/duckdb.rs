//! DuckDB connection provider implementation

use crate::error::{DbError, DbResult};
use crate::traits::{ConnectionProvider, QueryResult};
use async_trait::async_trait;
use duckdb::types::ValueRef;
use duckdb::Connection;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Named DuckDB connections.
///
/// Connections are registered up front, then the provider is shared
/// read-only. Queries run on the blocking thread pool, each on its own
/// clone of the registered connection, so concurrent queries against one
/// database do not wait on each other.
#[derive(Default)]
pub struct DuckDbConnections {
    connections: HashMap<String, Arc<Mutex<Connection>>>,
}

impl DuckDbConnections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new in-memory database under `name`
    pub fn add_in_memory(&mut self, name: &str) -> DbResult<()> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        self.insert(name, conn);
        Ok(())
    }

    /// Register a database file under `name`
    pub fn add_path(&mut self, name: &str, path: &Path) -> DbResult<()> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{}: {e}", path.display())))?;
        self.insert(name, conn);
        Ok(())
    }

    /// Register from a path string (handles the `:memory:` special case)
    pub fn add(&mut self, name: &str, path: &str) -> DbResult<()> {
        if path == ":memory:" {
            self.add_in_memory(name)
        } else {
            self.add_path(name, Path::new(path))
        }
    }

    fn insert(&mut self, name: &str, conn: Connection) {
        if self
            .connections
            .insert(name.to_string(), Arc::new(Mutex::new(conn)))
            .is_some()
        {
            log::warn!("Replaced existing connection '{name}'");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.connections.contains_key(name)
    }

    fn connection(&self, name: &str) -> DbResult<&Arc<Mutex<Connection>>> {
        self.connections
            .get(name)
            .ok_or_else(|| DbError::UnknownConnection(name.to_string()))
    }

    /// Execute multiple SQL statements on a connection
    pub fn execute_batch(&self, name: &str, sql: &str) -> DbResult<()> {
        let conn = self
            .connection(name)?
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        conn.execute_batch(sql)
            .map_err(|e| DbError::ExecutionError(e.to_string()))
    }

}

/// Run `sql` on a fresh handle to the database behind `shared`.
///
/// The lock is held only while cloning the handle.
fn query_blocking(shared: &Mutex<Connection>, sql: &str) -> DbResult<QueryResult> {
    let conn = shared
        .lock()
        .map_err(|e| DbError::MutexPoisoned(e.to_string()))?
        .try_clone()
        .map_err(|e| DbError::ConnectionError(e.to_string()))?;
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| DbError::ExecutionError(format!("{e}: {sql}")))?;
    let (columns, rows) = execute_and_collect(&mut stmt)?;
    Ok(QueryResult::new(columns, rows))
}

/// Read a cell as JSON.
///
/// Primitive DuckDB types map directly; dates become ISO strings and any
/// other type is read as f64 or text where DuckDB can convert it.
fn get_column_as_json(row: &duckdb::Row<'_>, idx: usize) -> Value {
    match row.get_ref(idx) {
        Err(_) | Ok(ValueRef::Null) => Value::Null,
        Ok(ValueRef::Boolean(b)) => Value::Bool(b),
        Ok(ValueRef::TinyInt(n)) => Value::from(n),
        Ok(ValueRef::SmallInt(n)) => Value::from(n),
        Ok(ValueRef::Int(n)) => Value::from(n),
        Ok(ValueRef::BigInt(n)) => Value::from(n),
        Ok(ValueRef::UTinyInt(n)) => Value::from(n),
        Ok(ValueRef::USmallInt(n)) => Value::from(n),
        Ok(ValueRef::UInt(n)) => Value::from(n),
        Ok(ValueRef::UBigInt(n)) => Value::from(n),
        Ok(ValueRef::Float(f)) => float_value(f64::from(f)),
        Ok(ValueRef::Double(f)) => float_value(f),
        Ok(ValueRef::Text(bytes)) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        Ok(_) => {
            if let Ok(Some(d)) = row.get::<_, Option<chrono::NaiveDate>>(idx) {
                return Value::String(d.format("%Y-%m-%d").to_string());
            }
            if let Ok(Some(f)) = row.get::<_, Option<f64>>(idx) {
                return float_value(f);
            }
            if let Ok(Some(s)) = row.get::<_, Option<String>>(idx) {
                return Value::String(s);
            }
            Value::Null
        }
    }
}

fn float_value(f: f64) -> Value {
    serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number)
}

/// Execute a prepared statement and collect every row.
///
/// DuckDB panics on `stmt.column_count()` before execution, so rows are
/// collected via `query_map` first and column metadata read afterwards.
fn execute_and_collect(stmt: &mut duckdb::Statement<'_>) -> DbResult<(Vec<String>, Vec<Vec<Value>>)> {
    let rows: Vec<Vec<Value>> = stmt
        .query_map([], |row| {
            let col_count = row.as_ref().column_count();
            Ok((0..col_count).map(|i| get_column_as_json(row, i)).collect())
        })
        .map_err(|e| DbError::ExecutionError(format!("query failed: {e}")))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DbError::ExecutionError(format!("row error: {e}")))?;

    let columns: Vec<String> = (0..stmt.column_count())
        .map(|i| stmt.column_name(i).map_or("?".to_string(), |v| v.to_string()))
        .collect();

    Ok((columns, rows))
}

#[async_trait]
impl ConnectionProvider for DuckDbConnections {
    async fn execute(&self, connection_name: &str, query: &str) -> DbResult<QueryResult> {
        log::debug!("Running query on '{connection_name}': {query}");
        let shared = Arc::clone(self.connection(connection_name)?);
        let sql = query.to_string();
        tokio::task::spawn_blocking(move || query_blocking(&shared, &sql))
            .await
            .map_err(|e| DbError::ExecutionError(format!("query task failed: {e}")))?
    }

    fn provider_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
