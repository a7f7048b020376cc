//! Storage driver seam.
//!
//! The connection core only needs to open a connection to a named host, run
//! statements on it, and close it. [`Connector`] and [`Connection`] capture
//! exactly that, with parameters and rows expressed as driver-neutral
//! [`Value`]s. Each driver is responsible for classifying its own errors
//! (see [`DatabaseError::is_connectivity`]).

pub mod postgres;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::DatabaseError;

pub use postgres::PostgresConnector;
pub use sqlite::SqliteConnector;

/// A bound parameter or a column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Integer(i64),
    Text(String),
    Bool(bool),
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// One result row, column-indexed from zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    #[must_use]
    pub const fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn value(&self, idx: usize) -> Result<&Value, DatabaseError> {
        self.values.get(idx).ok_or_else(|| {
            DatabaseError::InvalidState(format!(
                "column {idx} out of range ({} columns)",
                self.values.len()
            ))
        })
    }

    /// Read an integer column.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidState` if the column is missing or not an integer.
    pub fn get_i64(&self, idx: usize) -> Result<i64, DatabaseError> {
        match self.value(idx)? {
            Value::Integer(v) => Ok(*v),
            other => Err(type_mismatch(idx, "integer", other)),
        }
    }

    /// Read a boolean column. SQLite stores booleans as `0`/`1` integers.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidState` if the column is missing or not boolean-like.
    pub fn get_bool(&self, idx: usize) -> Result<bool, DatabaseError> {
        match self.value(idx)? {
            Value::Bool(v) => Ok(*v),
            Value::Integer(0) => Ok(false),
            Value::Integer(1) => Ok(true),
            other => Err(type_mismatch(idx, "boolean", other)),
        }
    }

    /// Read a text column.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidState` if the column is missing or not text.
    pub fn get_string(&self, idx: usize) -> Result<String, DatabaseError> {
        match self.value(idx)? {
            Value::Text(v) => Ok(v.clone()),
            other => Err(type_mismatch(idx, "text", other)),
        }
    }
}

fn type_mismatch(idx: usize, expected: &str, found: &Value) -> DatabaseError {
    DatabaseError::InvalidState(format!("column {idx}: expected {expected}, found {found:?}"))
}

/// SQL dialect differences the repositories care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Positional placeholder for the `n`th parameter (1-based).
    #[must_use]
    pub fn placeholder(self, n: usize) -> String {
        match self {
            Self::Postgres => format!("${n}"),
            Self::Sqlite => format!("?{n}"),
        }
    }

    /// Statement that opens a transaction.
    ///
    /// SQLite takes the write lock up front so concurrent writers queue on
    /// the busy timeout rather than deadlocking on a lock upgrade.
    #[must_use]
    pub const fn begin(self) -> &'static str {
        match self {
            Self::Postgres => "BEGIN",
            Self::Sqlite => "BEGIN IMMEDIATE",
        }
    }
}

/// Opens connections to a named host with fixed credentials, port, and timeout.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Conn: Connection;

    fn dialect(&self) -> Dialect;

    /// Open one connection to `host`.
    ///
    /// Failures that mean "could not reach it" must be reported as
    /// `DatabaseError::Connectivity`.
    async fn connect(&self, host: &str) -> Result<Self::Conn, DatabaseError>;
}

/// A live connection. Closed by value, exactly once, by the connection manager.
#[async_trait]
pub trait Connection: Send {
    /// Run a statement, returning the number of affected rows.
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DatabaseError>;

    /// Run a query, returning every row.
    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DatabaseError>;

    /// Run one or more parameterless statements (DDL, `BEGIN`, `COMMIT`, ...).
    async fn execute_batch(&mut self, sql: &str) -> Result<(), DatabaseError>;

    /// Release the connection.
    fn close(self);
}
