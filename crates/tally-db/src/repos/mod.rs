//! Repository modules implementing CRUD operations.
//!
//! Each module adds methods to `TaskStore` via `impl TaskStore` blocks.

pub mod task;
