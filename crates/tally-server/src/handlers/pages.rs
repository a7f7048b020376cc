//! Server-rendered HTML page: open tasks, an add form, and complete buttons.

use axum::Form;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::response::{Html, Redirect};
use serde::Deserialize;

use tally_core::entities::Task;
use tally_core::input::NewTask;
use tally_db::Connector;

use crate::error::ApiError;
use crate::handlers::tasks::task_id;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddTaskForm {
    #[serde(default)]
    pub title: String,
}

pub async fn index<C: Connector>(State(state): State<AppState<C>>) -> Result<Html<String>, ApiError> {
    let tasks = state.store.list_open_tasks().await?;
    Ok(Html(render_index(&tasks)))
}

pub async fn add_task<C: Connector>(
    State(state): State<AppState<C>>,
    Form(form): Form<AddTaskForm>,
) -> Result<Redirect, ApiError> {
    let input = NewTask::new(&form.title)?;
    let task = state.store.create_task(&input).await?;
    tracing::info!(task = %task.label(), "task added from page");
    Ok(Redirect::to("/"))
}

pub async fn complete_task<C: Connector>(
    State(state): State<AppState<C>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Redirect, ApiError> {
    let id = task_id(path)?;
    state
        .store
        .toggle_task(id)
        .await?
        .ok_or_else(|| ApiError::task_not_found(id))?;
    Ok(Redirect::to("/"))
}

fn render_index(tasks: &[Task]) -> String {
    let mut items = String::new();
    for task in tasks {
        items.push_str(&format!(
            r#"      <li>
        <span>{title}</span>
        <form method="post" action="/tasks/{id}/complete"><button type="submit">Done</button></form>
      </li>
"#,
            title = escape_html(&task.title),
            id = task.id,
        ));
    }
    if items.is_empty() {
        items.push_str("      <li><em>Nothing to do.</em></li>\n");
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>Tally</title>
  </head>
  <body>
    <h1>Tasks</h1>
    <form method="post" action="/tasks">
      <input type="text" name="title" maxlength="100" placeholder="New task" required>
      <button type="submit">Add</button>
    </form>
    <ul>
{items}    </ul>
  </body>
</html>
"#
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
