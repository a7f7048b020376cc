//! Task storage over a [`ConnectionManager`].
//!
//! `TaskStore` pairs the connection manager with the task schema plan and
//! remembers whether initialization has completed. CRUD methods live in
//! [`crate::repos::task`] as `impl TaskStore` blocks.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;

use crate::driver::Connector;
use crate::error::DatabaseError;
use crate::manager::ConnectionManager;
use crate::migrations::task_schema_plan;
use crate::retry::RetryConfig;
use crate::schema::{InitOutcome, SchemaPlan};

/// Task persistence shared by every request handler.
///
/// Each operation opens its own connection through the manager and closes it
/// before returning; the store itself holds no connection.
pub struct TaskStore<C: Connector> {
    manager: ConnectionManager<C>,
    plan: SchemaPlan,
    ready: AtomicBool,
    init_lock: Mutex<()>,
}

impl<C: Connector> TaskStore<C> {
    /// Wrap `manager`, seeding an empty table with `seed_titles`.
    #[must_use]
    pub fn new(manager: ConnectionManager<C>, seed_titles: &[String]) -> Self {
        let plan = task_schema_plan(manager.dialect(), seed_titles);
        Self {
            manager,
            plan,
            ready: AtomicBool::new(false),
            init_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub const fn manager(&self) -> &ConnectionManager<C> {
        &self.manager
    }

    /// Whether the schema is known to exist.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Startup initialization with retries. See [`ConnectionManager::ensure_schema`].
    pub async fn ensure_schema(&self, retry: RetryConfig) -> InitOutcome {
        let _guard = self.init_lock.lock().await;
        let outcome = self.manager.ensure_schema(&self.plan, retry).await;
        if outcome.is_ready() {
            self.ready.store(true, Ordering::Release);
        }
        outcome
    }

    /// Finish initialization on demand if startup could not.
    ///
    /// A single attempt with no sleep. Callers that arrive while an attempt
    /// is in flight share its result rather than queueing attempts of their
    /// own, so a burst of requests against a dead database costs one attempt.
    ///
    /// # Errors
    ///
    /// Returns the attempt's failure, or `DatabaseError::Unreachable` to
    /// callers that waited on a failed attempt; the next call tries again.
    pub async fn ensure_ready(&self) -> Result<(), DatabaseError> {
        if self.is_ready() {
            return Ok(());
        }
        let Ok(_guard) = self.init_lock.try_lock() else {
            drop(self.init_lock.lock().await);
            if self.is_ready() {
                return Ok(());
            }
            return Err(DatabaseError::Unreachable {
                hosts: self.manager.trial_order(),
            });
        };
        if self.is_ready() {
            return Ok(());
        }
        let seeded = self.manager.attempt_schema(&self.plan).await?;
        self.ready.store(true, Ordering::Release);
        tracing::info!(seeded, "database schema initialized on demand");
        Ok(())
    }

    /// Readiness probe: initialize if needed, then round-trip `SELECT 1`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if no host is reachable or initialization fails.
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        self.ensure_ready().await?;
        self.manager.ping().await
    }
}
