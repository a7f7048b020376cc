//! Connection acquisition with host fallback and scoped release.
//!
//! [`ConnectionManager`] owns a connector, the candidate hosts produced by
//! [`crate::host::resolve_candidates`], and a handle to the shared
//! [`ResolvedHost`]. Callers never hold a raw connection: they pass a body
//! to [`ConnectionManager::with_connection`] or
//! [`ConnectionManager::with_transaction`], and the manager closes the
//! connection exactly once however the body finishes.

use futures::future::BoxFuture;

use crate::driver::{Connection, Connector, Dialect};
use crate::error::DatabaseError;
use crate::resolved::ResolvedHost;

pub struct ConnectionManager<C: Connector> {
    connector: C,
    candidates: Vec<String>,
    resolved: ResolvedHost,
}

impl<C: Connector> ConnectionManager<C> {
    pub const fn new(connector: C, candidates: Vec<String>, resolved: ResolvedHost) -> Self {
        Self {
            connector,
            candidates,
            resolved,
        }
    }

    #[must_use]
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.connector.dialect()
    }

    #[must_use]
    pub const fn resolved(&self) -> &ResolvedHost {
        &self.resolved
    }

    /// Hosts in the order [`acquire`](Self::acquire) tries them: the cached
    /// host first, then every candidate in order without repeating it.
    #[must_use]
    pub fn trial_order(&self) -> Vec<String> {
        let cached = self.resolved.get();
        let mut order = Vec::with_capacity(self.candidates.len() + 1);
        if let Some(host) = &cached {
            order.push(host.clone());
        }
        order.extend(
            self.candidates
                .iter()
                .filter(|c| cached.as_deref() != Some(c.as_str()))
                .cloned(),
        );
        order
    }

    /// Open a connection to the first host in trial order that accepts one.
    ///
    /// # Errors
    ///
    /// Returns the last host's error when every host fails, or
    /// `DatabaseError::Unreachable` when there was nothing to try.
    pub async fn acquire(&self) -> Result<C::Conn, DatabaseError> {
        let order = self.trial_order();
        let mut last_error = None;

        for host in &order {
            match self.connector.connect(host).await {
                Ok(conn) => {
                    self.resolved.set(host);
                    tracing::debug!(%host, "database connection established");
                    return Ok(conn);
                }
                Err(error) => {
                    if self.resolved.clear_if(host) {
                        tracing::warn!(%host, %error, "previously working database host failed; falling back");
                    }
                    tracing::debug!(%host, %error, "database host failed");
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or(DatabaseError::Unreachable { hosts: order }))
    }

    /// Run `body` on a fresh connection, then close it.
    ///
    /// The connection is closed exactly once whether `body` succeeds, fails,
    /// or is dropped before finishing. Nothing is committed; use
    /// [`with_transaction`](Self::with_transaction) for writes.
    ///
    /// # Errors
    ///
    /// Returns the acquisition error (converted into `E`) or the body's error.
    pub async fn with_connection<T, E, F>(&self, body: F) -> Result<T, E>
    where
        F: for<'c> FnOnce(&'c mut C::Conn) -> BoxFuture<'c, Result<T, E>> + Send,
        T: Send,
        E: From<DatabaseError> + Send,
    {
        let mut scoped = Scoped::new(self.acquire().await?);
        let result = body(scoped.conn()?).await;
        scoped.finish();
        result
    }

    /// Run `body` inside a transaction on a fresh connection.
    ///
    /// On `Ok` the transaction is committed, and rolled back if the commit
    /// itself fails. On `Err` it is rolled back and never committed. The
    /// connection is closed exactly once in every case; if the caller drops
    /// this future midway, closing the connection discards the open
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns the acquisition, `BEGIN`, or `COMMIT` error (converted into
    /// `E`), or the body's error.
    pub async fn with_transaction<T, E, F>(&self, body: F) -> Result<T, E>
    where
        F: for<'c> FnOnce(&'c mut C::Conn) -> BoxFuture<'c, Result<T, E>> + Send,
        T: Send,
        E: From<DatabaseError> + Send,
    {
        let begin = self.dialect().begin();
        let mut scoped = Scoped::new(self.acquire().await?);
        let conn = scoped.conn()?;
        if let Err(error) = conn.execute_batch(begin).await {
            scoped.finish();
            return Err(error.into());
        }

        let result = match body(&mut *conn).await {
            Ok(value) => match conn.execute_batch("COMMIT").await {
                Ok(()) => Ok(value),
                Err(error) => {
                    rollback(conn).await;
                    Err(error.into())
                }
            },
            Err(error) => {
                rollback(conn).await;
                Err(error)
            }
        };
        scoped.finish();
        result
    }

    /// Round-trip `SELECT 1` through a fresh connection.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if no host is reachable or the query fails.
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        self.with_connection(|conn| Box::pin(select_one(conn))).await
    }
}

async fn select_one<K: Connection>(conn: &mut K) -> Result<(), DatabaseError> {
    conn.query("SELECT 1", &[]).await.map(|_| ())
}

/// Owns an acquired connection and closes it when dropped.
///
/// Normal paths call [`Scoped::finish`]; reaching `Drop` without it means the
/// surrounding future was cancelled mid-body.
struct Scoped<K: Connection> {
    conn: Option<K>,
    finished: bool,
}

impl<K: Connection> Scoped<K> {
    fn new(conn: K) -> Self {
        Self {
            conn: Some(conn),
            finished: false,
        }
    }

    fn conn(&mut self) -> Result<&mut K, DatabaseError> {
        self.conn
            .as_mut()
            .ok_or_else(|| DatabaseError::InvalidState("connection already released".into()))
    }

    fn finish(mut self) {
        self.finished = true;
    }
}

impl<K: Connection> Drop for Scoped<K> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if !self.finished {
                tracing::debug!("connection released before its body finished");
            }
            conn.close();
        }
    }
}

async fn rollback<K: Connection>(conn: &mut K) {
    if let Err(error) = conn.execute_batch("ROLLBACK").await {
        tracing::warn!(%error, "rollback failed");
    }
}
