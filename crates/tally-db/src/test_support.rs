//! Shared test utilities for tally-db.
