//! JSON task API under `/api/tasks`.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::Value;

use tally_core::entities::Task;
use tally_core::input::{NewTask, TaskPatch};
use tally_db::Connector;

use crate::error::ApiError;
use crate::state::AppState;

pub(crate) fn task_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| ApiError::validation(rejection.body_text()))
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::validation(rejection.body_text()))
}

pub async fn list_tasks<C: Connector>(
    State(state): State<AppState<C>>,
) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.store.list_tasks().await?))
}

pub async fn create_task<C: Connector>(
    State(state): State<AppState<C>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let input = NewTask::from_json(&json_body(body)?)?;
    let task = state.store.create_task(&input).await?;
    tracing::info!(task = %task.label(), "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task<C: Connector>(
    State(state): State<AppState<C>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Task>, ApiError> {
    let id = task_id(path)?;
    state
        .store
        .get_task(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::task_not_found(id))
}

/// Handles both `PUT` and `PATCH`; either may carry any subset of fields.
pub async fn update_task<C: Connector>(
    State(state): State<AppState<C>>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let id = task_id(path)?;
    let patch = TaskPatch::from_json(&json_body(body)?)?;
    state
        .store
        .update_task(id, &patch)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::task_not_found(id))
}

pub async fn toggle_task<C: Connector>(
    State(state): State<AppState<C>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Task>, ApiError> {
    let id = task_id(path)?;
    state
        .store
        .toggle_task(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::task_not_found(id))
}

pub async fn delete_task<C: Connector>(
    State(state): State<AppState<C>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = task_id(path)?;
    if state.store.delete_task(id).await? {
        tracing::info!(id, "task deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::task_not_found(id))
    }
}
