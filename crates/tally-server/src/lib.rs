//! # tally-server
//!
//! HTTP surface for Tally: a JSON task API under `/api`, a small HTML page,
//! and liveness/readiness probes. The router is generic over the storage
//! driver so tests can run it against a temporary SQLite file.

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
