//! Task repository: CRUD and completion toggling.
//!
//! Reads run through `with_connection`, writes through `with_transaction`.
//! Every statement is parameterized; only placeholders vary by dialect.

use tally_core::entities::Task;
use tally_core::input::{NewTask, TaskPatch};

use crate::driver::{Connection, Connector, Row, Value};
use crate::error::DatabaseError;
use crate::helpers::parse_datetime;
use crate::migrations::TASKS_TABLE;
use crate::store::TaskStore;

const SELECT_COLS: &str = "id, title, completed, CAST(created_at AS TEXT)";

fn row_to_task(row: &Row) -> Result<Task, DatabaseError> {
    Ok(Task {
        id: row.get_i64(0)?,
        title: row.get_string(1)?,
        completed: row.get_bool(2)?,
        created_at: parse_datetime(&row.get_string(3)?)?,
    })
}

async fn fetch_all<K: Connection>(
    conn: &mut K,
    sql: String,
    params: Vec<Value>,
) -> Result<Vec<Task>, DatabaseError> {
    conn.query(&sql, &params).await?.iter().map(row_to_task).collect()
}

async fn fetch_one<K: Connection>(
    conn: &mut K,
    sql: String,
    params: Vec<Value>,
) -> Result<Option<Task>, DatabaseError> {
    let rows = conn.query(&sql, &params).await?;
    rows.first().map(row_to_task).transpose()
}

async fn affected<K: Connection>(
    conn: &mut K,
    sql: String,
    params: Vec<Value>,
) -> Result<u64, DatabaseError> {
    conn.execute(&sql, &params).await
}

impl<C: Connector> TaskStore<C> {
    /// All tasks, oldest first.
    pub async fn list_tasks(&self) -> Result<Vec<Task>, DatabaseError> {
        self.ensure_ready().await?;
        let sql = format!("SELECT {SELECT_COLS} FROM {TASKS_TABLE} ORDER BY id");
        self.manager()
            .with_connection(move |conn| Box::pin(fetch_all(conn, sql, Vec::new())))
            .await
    }

    /// Tasks not yet completed, oldest first.
    pub async fn list_open_tasks(&self) -> Result<Vec<Task>, DatabaseError> {
        self.ensure_ready().await?;
        let sql = format!("SELECT {SELECT_COLS} FROM {TASKS_TABLE} WHERE NOT completed ORDER BY id");
        self.manager()
            .with_connection(move |conn| Box::pin(fetch_all(conn, sql, Vec::new())))
            .await
    }

    pub async fn get_task(&self, id: i64) -> Result<Option<Task>, DatabaseError> {
        self.ensure_ready().await?;
        let p = self.manager().dialect().placeholder(1);
        let sql = format!("SELECT {SELECT_COLS} FROM {TASKS_TABLE} WHERE id = {p}");
        self.manager()
            .with_connection(move |conn| Box::pin(fetch_one(conn, sql, vec![Value::Integer(id)])))
            .await
    }

    pub async fn create_task(&self, task: &NewTask) -> Result<Task, DatabaseError> {
        self.ensure_ready().await?;
        let dialect = self.manager().dialect();
        let sql = format!(
            "INSERT INTO {TASKS_TABLE} (title, completed) VALUES ({}, {}) RETURNING {SELECT_COLS}",
            dialect.placeholder(1),
            dialect.placeholder(2),
        );
        let params = vec![Value::Text(task.title.clone()), Value::Bool(task.completed)];
        let created = self
            .manager()
            .with_transaction(move |conn| Box::pin(fetch_one(conn, sql, params)))
            .await?
            .ok_or(DatabaseError::NoResult)?;
        tracing::debug!(task = %created.label(), "created");
        Ok(created)
    }

    /// Apply the fields set in `patch`. Returns `None` if `id` does not exist.
    pub async fn update_task(
        &self,
        id: i64,
        patch: &TaskPatch,
    ) -> Result<Option<Task>, DatabaseError> {
        if patch.is_empty() {
            return self.get_task(id).await;
        }
        self.ensure_ready().await?;
        let dialect = self.manager().dialect();

        let mut sets = Vec::new();
        let mut params: Vec<Value> = Vec::new();
        if let Some(ref title) = patch.title {
            params.push(title.clone().into());
            sets.push(format!("title = {}", dialect.placeholder(params.len())));
        }
        if let Some(completed) = patch.completed {
            params.push(completed.into());
            sets.push(format!("completed = {}", dialect.placeholder(params.len())));
        }
        params.push(id.into());
        let sql = format!(
            "UPDATE {TASKS_TABLE} SET {} WHERE id = {} RETURNING {SELECT_COLS}",
            sets.join(", "),
            dialect.placeholder(params.len()),
        );

        self.manager()
            .with_transaction(move |conn| Box::pin(fetch_one(conn, sql, params)))
            .await
    }

    /// Flip completion. Returns `None` if `id` does not exist.
    pub async fn toggle_task(&self, id: i64) -> Result<Option<Task>, DatabaseError> {
        self.ensure_ready().await?;
        let p = self.manager().dialect().placeholder(1);
        let sql = format!(
            "UPDATE {TASKS_TABLE} SET completed = NOT completed WHERE id = {p} RETURNING {SELECT_COLS}"
        );
        self.manager()
            .with_transaction(move |conn| Box::pin(fetch_one(conn, sql, vec![Value::Integer(id)])))
            .await
    }

    /// Returns whether a task was deleted.
    pub async fn delete_task(&self, id: i64) -> Result<bool, DatabaseError> {
        self.ensure_ready().await?;
        let p = self.manager().dialect().placeholder(1);
        let sql = format!("DELETE FROM {TASKS_TABLE} WHERE id = {p}");
        let deleted = self
            .manager()
            .with_transaction(move |conn| Box::pin(affected(conn, sql, vec![Value::Integer(id)])))
            .await?;
        Ok(deleted > 0)
    }
}
