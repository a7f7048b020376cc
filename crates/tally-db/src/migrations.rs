//! Embedded task schema.
//!
//! One idempotent DDL file per dialect, compiled into the binary and run on
//! every initialization attempt. There is no versioned migration history:
//! every statement uses `IF NOT EXISTS`.

use tally_core::input::NewTask;

use crate::driver::{Dialect, Value};
use crate::schema::SchemaPlan;

pub const TASKS_TABLE: &str = "tasks";

const POSTGRES_001: &str = include_str!("../migrations/postgres/001_tasks.sql");
const SQLITE_001: &str = include_str!("../migrations/sqlite/001_tasks.sql");

/// The DDL batch for `dialect`.
#[must_use]
pub const fn tasks_ddl(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Postgres => POSTGRES_001,
        Dialect::Sqlite => SQLITE_001,
    }
}

/// Schema plan for the task table, seeded with one open task per title.
///
/// Blank titles are skipped so a seed can never violate the title check.
#[must_use]
pub fn task_schema_plan(dialect: Dialect, seed_titles: &[String]) -> SchemaPlan {
    let rows = seed_titles
        .iter()
        .filter_map(|title| NewTask::new(title).ok())
        .map(|task| vec![Value::Text(task.title), Value::Bool(task.completed)])
        .collect();
    SchemaPlan::new(tasks_ddl(dialect), TASKS_TABLE).with_seeds(&["title", "completed"], rows)
}
