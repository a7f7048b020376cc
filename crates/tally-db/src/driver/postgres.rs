//! PostgreSQL driver built on `tokio-postgres`.
//!
//! Connectivity classification: any connect-phase failure that carries no
//! server SQLSTATE (DNS, refused, reset, timeout), SQLSTATE class `08`,
//! `57P01`-`57P03` (server shutting down or starting up), `53300` (too many
//! connections), and any statement failure on a closed connection. Everything
//! else, including authentication failures, is fatal.

use std::time::Duration;

use async_trait::async_trait;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{Client, NoTls};

use super::{Connection, Connector, Dialect, Row, Value};
use crate::error::DatabaseError;

/// Opens `tokio-postgres` connections with fixed port, credentials, and timeout.
#[derive(Debug, Clone)]
pub struct PostgresConnector {
    port: u16,
    dbname: String,
    user: String,
    password: String,
    connect_timeout: Duration,
}

impl PostgresConnector {
    #[must_use]
    pub fn new(
        port: u16,
        dbname: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            port,
            dbname: dbname.into(),
            user: user.into(),
            password: password.into(),
            connect_timeout,
        }
    }

    #[must_use]
    pub fn from_config(config: &tally_config::DatabaseConfig) -> Self {
        Self::new(
            config.port,
            config.name.clone(),
            config.user.clone(),
            config.password.clone(),
            config.connect_timeout(),
        )
    }

    fn pg_config(&self, host: &str) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(host)
            .port(self.port)
            .dbname(&self.dbname)
            .user(&self.user)
            .connect_timeout(self.connect_timeout);
        if !self.password.is_empty() {
            config.password(&self.password);
        }
        config
    }
}

#[async_trait]
impl Connector for PostgresConnector {
    type Conn = PostgresConnection;

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn connect(&self, host: &str) -> Result<Self::Conn, DatabaseError> {
        let config = self.pg_config(host);
        let (client, connection) = tokio::time::timeout(self.connect_timeout, config.connect(NoTls))
            .await
            .map_err(|_| {
                DatabaseError::connectivity(
                    host,
                    format!("connect timed out after {:?}", self.connect_timeout),
                )
            })?
            .map_err(|e| classify_connect_error(host, &e))?;

        let task_host = host.to_string();
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(host = %task_host, error = %e, "database connection error");
            }
        });

        Ok(PostgresConnection {
            client,
            host: host.to_string(),
        })
    }
}

/// A live `tokio-postgres` client. Dropping the client ends the connection task.
pub struct PostgresConnection {
    client: Client,
    host: String,
}

#[async_trait]
impl Connection for PostgresConnection {
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DatabaseError> {
        let owned = to_sql_params(params);
        let refs = param_refs(&owned);
        self.client
            .execute(sql, &refs)
            .await
            .map_err(|e| classify_statement_error(&self.host, &e))
    }

    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DatabaseError> {
        let owned = to_sql_params(params);
        let refs = param_refs(&owned);
        let rows = self
            .client
            .query(sql, &refs)
            .await
            .map_err(|e| classify_statement_error(&self.host, &e))?;
        rows.iter().map(convert_row).collect()
    }

    async fn execute_batch(&mut self, sql: &str) -> Result<(), DatabaseError> {
        self.client
            .batch_execute(sql)
            .await
            .map_err(|e| classify_statement_error(&self.host, &e))
    }

    fn close(self) {
        drop(self.client);
    }
}

type BoxedParam = Box<dyn ToSql + Sync + Send>;

fn to_sql_params(params: &[Value]) -> Vec<BoxedParam> {
    params
        .iter()
        .map(|value| -> BoxedParam {
            match value {
                Value::Null => Box::new(Option::<String>::None),
                Value::Integer(v) => Box::new(*v),
                Value::Text(v) => Box::new(v.clone()),
                Value::Bool(v) => Box::new(*v),
            }
        })
        .collect()
}

fn param_refs(owned: &[BoxedParam]) -> Vec<&(dyn ToSql + Sync)> {
    owned
        .iter()
        .map(|p| p.as_ref() as &(dyn ToSql + Sync))
        .collect()
}

fn convert_row(row: &tokio_postgres::Row) -> Result<Row, DatabaseError> {
    let mut values = Vec::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        let ty = column.type_();
        let value = if *ty == Type::INT8 {
            row.try_get::<_, Option<i64>>(idx).map(|v| v.map(Value::Integer))
        } else if *ty == Type::INT4 {
            row.try_get::<_, Option<i32>>(idx)
                .map(|v| v.map(|v| Value::Integer(i64::from(v))))
        } else if *ty == Type::INT2 {
            row.try_get::<_, Option<i16>>(idx)
                .map(|v| v.map(|v| Value::Integer(i64::from(v))))
        } else if *ty == Type::BOOL {
            row.try_get::<_, Option<bool>>(idx).map(|v| v.map(Value::Bool))
        } else if *ty == Type::TEXT || *ty == Type::VARCHAR || *ty == Type::NAME {
            row.try_get::<_, Option<String>>(idx).map(|v| v.map(Value::Text))
        } else {
            return Err(DatabaseError::InvalidState(format!(
                "unsupported column type {ty} for '{}'",
                column.name()
            )));
        };
        let value = value.map_err(|e| DatabaseError::InvalidState(e.to_string()))?;
        values.push(value.unwrap_or(Value::Null));
    }
    Ok(Row::new(values))
}

fn is_connectivity_sqlstate(code: &str) -> bool {
    code.starts_with("08") || matches!(code, "57P01" | "57P02" | "57P03" | "53300")
}

/// Classify a failure while establishing the connection.
fn classify_connect_error(host: &str, error: &tokio_postgres::Error) -> DatabaseError {
    match error.as_db_error() {
        Some(db) if !is_connectivity_sqlstate(db.code().code()) => {
            DatabaseError::Query(format!("{host}: {db}"))
        }
        _ => DatabaseError::connectivity(host, error),
    }
}

/// Classify a failure of a statement on an established connection.
fn classify_statement_error(host: &str, error: &tokio_postgres::Error) -> DatabaseError {
    if let Some(db) = error.as_db_error() {
        let code = db.code().code();
        if is_connectivity_sqlstate(code) {
            return DatabaseError::connectivity(host, db);
        }
        if code.starts_with("23") {
            return DatabaseError::Constraint(db.to_string());
        }
        return DatabaseError::Query(db.to_string());
    }
    if error.is_closed() {
        return DatabaseError::connectivity(host, error);
    }
    DatabaseError::Query(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlstate_classes() {
        assert!(is_connectivity_sqlstate("08006"));
        assert!(is_connectivity_sqlstate("08001"));
        assert!(is_connectivity_sqlstate("57P03"));
        assert!(is_connectivity_sqlstate("53300"));
        assert!(!is_connectivity_sqlstate("23505"));
        assert!(!is_connectivity_sqlstate("42601"));
        assert!(!is_connectivity_sqlstate("28P01"));
    }

    #[test]
    fn params_convert_one_to_one() {
        let owned = to_sql_params(&[
            Value::Integer(1),
            Value::Text("a".into()),
            Value::Bool(true),
            Value::Null,
        ]);
        assert_eq!(param_refs(&owned).len(), 4);
    }

    #[tokio::test]
    async fn unreachable_host_is_a_connectivity_failure() {
        // Nothing listens on loopback port 1.
        let connector =
            PostgresConnector::new(1, "tasks", "postgres", "", Duration::from_secs(2));
        let err = match connector.connect("127.0.0.1").await {
            Ok(_) => panic!("nothing should listen on port 1"),
            Err(e) => e,
        };
        assert!(err.is_connectivity(), "unexpected classification: {err}");
    }
}
