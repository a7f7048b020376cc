//! Startup schema initialization as a bounded state machine.
//!
//! ```text
//! Attempting(1) ──ok──────────────────────────▶ Succeeded
//!      │ connectivity, n < max ── sleep ──▶ Attempting(n + 1)
//!      │ connectivity, n == max ───────────────▶ Exhausted
//!      └ any other failure ────────────────────▶ Aborted
//! ```
//!
//! One attempt creates the table (idempotent DDL), counts its rows, and seeds
//! it with a single multi-row `INSERT` when it is empty, all inside one
//! transaction. Initialization never fails the caller: the terminal outcome is
//! returned for inspection and the service keeps running degraded.

use crate::driver::{Connection, Connector, Dialect, Value};
use crate::error::DatabaseError;
use crate::manager::ConnectionManager;
use crate::retry::RetryConfig;

/// What to create and how to seed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaPlan {
    pub ddl: String,
    pub table: String,
    pub seed_columns: Vec<String>,
    pub seed_rows: Vec<Vec<Value>>,
}

impl SchemaPlan {
    #[must_use]
    pub fn new(ddl: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            ddl: ddl.into(),
            table: table.into(),
            seed_columns: Vec::new(),
            seed_rows: Vec::new(),
        }
    }

    /// Seed the table with `rows`, one value per column.
    ///
    /// Rows whose width differs from `columns` are dropped with a warning.
    #[must_use]
    pub fn with_seeds(mut self, columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        let width = columns.len();
        self.seed_columns = columns.iter().map(ToString::to_string).collect();
        self.seed_rows = rows
            .into_iter()
            .filter(|row| {
                let fits = row.len() == width;
                if !fits {
                    tracing::warn!(
                        table = %self.table,
                        expected = width,
                        got = row.len(),
                        "dropping seed row with wrong column count"
                    );
                }
                fits
            })
            .collect();
        self
    }

    /// One bulk `INSERT` covering every seed row, or `None` when there is
    /// nothing to seed.
    #[must_use]
    pub fn seed_statement(&self, dialect: Dialect) -> Option<(String, Vec<Value>)> {
        if self.seed_rows.is_empty() || self.seed_columns.is_empty() {
            return None;
        }
        let width = self.seed_columns.len();
        let mut params = Vec::with_capacity(self.seed_rows.len() * width);
        let mut tuples = Vec::with_capacity(self.seed_rows.len());
        for row in &self.seed_rows {
            let start = params.len();
            let placeholders: Vec<String> = (1..=width)
                .map(|i| dialect.placeholder(start + i))
                .collect();
            tuples.push(format!("({})", placeholders.join(", ")));
            params.extend(row.iter().cloned());
        }
        let sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.table,
            self.seed_columns.join(", "),
            tuples.join(", ")
        );
        Some((sql, params))
    }
}

/// Terminal result of [`ConnectionManager::ensure_schema`].
#[derive(Debug)]
pub enum InitOutcome {
    /// The schema exists; `seeded` rows were inserted by this run.
    Succeeded { attempts: u32, seeded: usize },
    /// A failure that waiting cannot fix (bad SQL, constraint, credentials).
    Aborted { attempt: u32, error: DatabaseError },
    /// The database stayed unreachable for every allowed attempt.
    Exhausted {
        attempts: u32,
        hosts: Vec<String>,
        last_error: DatabaseError,
    },
}

impl InitOutcome {
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

#[derive(Debug)]
pub enum InitState {
    Attempting(u32),
    Done(InitOutcome),
}

/// Next state after attempt `attempt` of `max_attempts` finished with `result`.
#[must_use]
pub fn transition(
    attempt: u32,
    max_attempts: u32,
    result: Result<usize, DatabaseError>,
    hosts: &[String],
) -> InitState {
    match result {
        Ok(seeded) => InitState::Done(InitOutcome::Succeeded {
            attempts: attempt,
            seeded,
        }),
        Err(error) if !error.is_connectivity() => {
            InitState::Done(InitOutcome::Aborted { attempt, error })
        }
        Err(_) if attempt < max_attempts => InitState::Attempting(attempt + 1),
        Err(last_error) => InitState::Done(InitOutcome::Exhausted {
            attempts: attempt,
            hosts: hosts.to_vec(),
            last_error,
        }),
    }
}

impl<C: Connector> ConnectionManager<C> {
    /// Create and seed the schema, retrying connectivity failures.
    ///
    /// Never returns an error and never panics; see [`InitOutcome`].
    pub async fn ensure_schema(&self, plan: &SchemaPlan, retry: RetryConfig) -> InitOutcome {
        let max_attempts = retry.max_attempts.max(1);
        let mut state = InitState::Attempting(1);
        loop {
            match state {
                InitState::Attempting(attempt) => {
                    let tried = self.trial_order();
                    let result = self.attempt_schema(plan).await;
                    if let Err(error) = &result
                        && error.is_connectivity()
                        && attempt < max_attempts
                    {
                        tracing::warn!(
                            attempt,
                            max_attempts,
                            %error,
                            "database not reachable yet; retrying in {:?}",
                            retry.retry_delay
                        );
                    }
                    state = transition(attempt, max_attempts, result, &tried);
                    if matches!(state, InitState::Attempting(_)) {
                        tokio::time::sleep(retry.retry_delay).await;
                    }
                }
                InitState::Done(outcome) => {
                    log_outcome(&outcome);
                    return outcome;
                }
            }
        }
    }

    /// One initialization attempt, no retry. Returns the number of rows seeded.
    ///
    /// # Errors
    ///
    /// Returns the first failure; the transaction is rolled back.
    pub async fn attempt_schema(&self, plan: &SchemaPlan) -> Result<usize, DatabaseError> {
        let ddl = plan.ddl.clone();
        let count_sql = format!("SELECT COUNT(*) FROM {}", plan.table);
        let seed = plan.seed_statement(self.dialect());
        self.with_transaction(move |conn| Box::pin(create_and_seed(conn, ddl, count_sql, seed)))
            .await
    }
}

async fn create_and_seed<K: Connection>(
    conn: &mut K,
    ddl: String,
    count_sql: String,
    seed: Option<(String, Vec<Value>)>,
) -> Result<usize, DatabaseError> {
    conn.execute_batch(&ddl).await?;

    let rows = conn.query(&count_sql, &[]).await?;
    let existing = rows.first().ok_or(DatabaseError::NoResult)?.get_i64(0)?;
    if existing > 0 {
        return Ok(0);
    }

    match seed {
        Some((sql, params)) => {
            let inserted = conn.execute(&sql, &params).await?;
            Ok(usize::try_from(inserted).unwrap_or(usize::MAX))
        }
        None => Ok(0),
    }
}

fn log_outcome(outcome: &InitOutcome) {
    match outcome {
        InitOutcome::Succeeded { attempts, seeded } => {
            tracing::info!(attempts, seeded, "database schema ready");
        }
        InitOutcome::Aborted { attempt, error } => {
            tracing::error!(attempt, %error, "database initialization aborted");
        }
        InitOutcome::Exhausted {
            attempts,
            hosts,
            last_error,
        } => {
            tracing::error!(
                attempts,
                hosts = %hosts.join(", "),
                error = %last_error,
                "could not reach the database; starting without it"
            );
        }
    }
}
