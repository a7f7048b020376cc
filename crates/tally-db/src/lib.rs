//! # tally-db
//!
//! Database connection lifecycle and task storage for Tally.
//!
//! The connection core is backend-neutral:
//!
//! - [`host`] turns configuration and environment hints into an ordered list
//!   of candidate hosts.
//! - [`ConnectionManager`] opens a fresh connection per operation, trying the
//!   last working host first and falling back through the candidates. Bodies
//!   run inside [`ConnectionManager::with_connection`] or
//!   [`ConnectionManager::with_transaction`], which always close.
//! - [`schema`] creates and seeds the task table with bounded retries so the
//!   service can start before its database does.
//!
//! Drivers for PostgreSQL (`tokio-postgres`) and local SQLite (`libsql`)
//! implement the narrow [`driver::Connector`] seam.

pub mod driver;
pub mod error;
pub mod helpers;
pub mod host;
pub mod manager;
pub mod migrations;
pub mod repos;
pub mod resolved;
pub mod retry;
pub mod schema;
pub mod store;

mod test_support;

pub use driver::{Connection, Connector, Dialect, PostgresConnector, SqliteConnector};
pub use error::DatabaseError;
pub use host::resolve_candidates;
pub use manager::ConnectionManager;
pub use resolved::ResolvedHost;
pub use retry::RetryConfig;
pub use schema::{InitOutcome, SchemaPlan};
pub use store::TaskStore;
