//! Local libSQL/SQLite driver.
//!
//! The "host" handed to [`SqliteConnector::connect`] is the database file
//! path. Failure to open the file, `SQLITE_BUSY`, `SQLITE_LOCKED`, and
//! `SQLITE_CANTOPEN` count as connectivity failures; `SQLITE_CONSTRAINT` is a
//! constraint violation; everything else is a fatal query error.
//!
//! Every request opens its own connection, so each one waits up to the busy
//! timeout for a competing writer instead of failing with `SQLITE_BUSY`.

use std::time::Duration;

use async_trait::async_trait;
use libsql::Builder;
use tally_config::DatabaseConfig;

use super::{Connection, Connector, Dialect, Row, Value};
use crate::error::DatabaseError;

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;
const SQLITE_CANTOPEN: i32 = 14;
const SQLITE_CONSTRAINT: i32 = 19;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a fresh libSQL connection to a local file per call.
#[derive(Debug, Clone, Copy)]
pub struct SqliteConnector {
    busy_timeout: Duration,
}

impl SqliteConnector {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// How long a statement waits on a locked database before giving up.
    #[must_use]
    pub const fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }
}

impl SqliteConnector {
    /// Busy timeout taken from `connect_timeout_secs`.
    #[must_use]
    pub const fn from_config(config: &DatabaseConfig) -> Self {
        Self::new().with_busy_timeout(config.connect_timeout())
    }
}

impl Default for SqliteConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for SqliteConnector {
    type Conn = SqliteConnection;

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn connect(&self, host: &str) -> Result<Self::Conn, DatabaseError> {
        let db = Builder::new_local(host)
            .build()
            .await
            .map_err(|e| DatabaseError::connectivity(host, e))?;
        let conn = db.connect().map_err(|e| DatabaseError::connectivity(host, e))?;
        conn.busy_timeout(self.busy_timeout)
            .map_err(|e| classify(host, e))?;

        let mut conn = SqliteConnection {
            _db: db,
            conn,
            path: host.to_string(),
        };
        // WAL lets readers proceed while a writer holds the lock.
        conn.query("PRAGMA journal_mode=WAL", &[]).await?;
        Ok(conn)
    }
}

/// A live libSQL connection plus the database handle it was opened from.
pub struct SqliteConnection {
    _db: libsql::Database,
    conn: libsql::Connection,
    path: String,
}

#[async_trait]
impl Connection for SqliteConnection {
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DatabaseError> {
        self.conn
            .execute(sql, libsql::params_from_iter(to_libsql(params)))
            .await
            .map_err(|e| classify(&self.path, e))
    }

    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DatabaseError> {
        let mut rows = self
            .conn
            .query(sql, libsql::params_from_iter(to_libsql(params)))
            .await
            .map_err(|e| classify(&self.path, e))?;

        let columns = rows.column_count();
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(|e| classify(&self.path, e))? {
            let mut values = Vec::with_capacity(usize::try_from(columns).unwrap_or_default());
            for idx in 0..columns {
                let value = row.get_value(idx).map_err(|e| classify(&self.path, e))?;
                values.push(from_libsql(value)?);
            }
            out.push(Row::new(values));
        }
        Ok(out)
    }

    async fn execute_batch(&mut self, sql: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(sql)
            .await
            .map(|_| ())
            .map_err(|e| classify(&self.path, e))
    }

    fn close(self) {
        drop(self.conn);
    }
}

fn to_libsql(params: &[Value]) -> Vec<libsql::Value> {
    params
        .iter()
        .map(|value| match value {
            Value::Null => libsql::Value::Null,
            Value::Integer(v) => libsql::Value::Integer(*v),
            Value::Text(v) => libsql::Value::Text(v.clone()),
            Value::Bool(v) => libsql::Value::Integer(i64::from(*v)),
        })
        .collect()
}

fn from_libsql(value: libsql::Value) -> Result<Value, DatabaseError> {
    match value {
        libsql::Value::Null => Ok(Value::Null),
        libsql::Value::Integer(v) => Ok(Value::Integer(v)),
        libsql::Value::Text(v) => Ok(Value::Text(v)),
        other => Err(DatabaseError::InvalidState(format!(
            "unsupported column value {other:?}"
        ))),
    }
}

fn classify(path: &str, error: libsql::Error) -> DatabaseError {
    match error {
        libsql::Error::SqliteFailure(code, message) => match code & 0xff {
            SQLITE_BUSY | SQLITE_LOCKED | SQLITE_CANTOPEN => {
                DatabaseError::connectivity(path, message)
            }
            SQLITE_CONSTRAINT => DatabaseError::Constraint(message),
            _ => DatabaseError::Query(message),
        },
        libsql::Error::ConnectionFailed(message) => DatabaseError::connectivity(path, message),
        other => DatabaseError::Query(other.to_string()),
    }
}
