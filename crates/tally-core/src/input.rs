//! Validated caller input for task mutations.
//!
//! Everything here runs before a database connection is acquired: a request
//! that fails validation never reaches storage.

use serde_json::{Map, Value};

use crate::errors::CoreError;

/// Longest accepted title, in characters.
pub const MAX_TITLE_LEN: usize = 100;

/// Input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub completed: bool,
}

impl NewTask {
    /// Build from a raw title, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the title is empty, whitespace-only,
    /// or longer than [`MAX_TITLE_LEN`].
    pub fn new(title: &str) -> Result<Self, CoreError> {
        Ok(Self {
            title: validate_title(title)?,
            completed: false,
        })
    }

    /// Build from a JSON request body: `{"title": "...", "completed": false}`.
    ///
    /// `completed` is optional and defaults to `false`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the body is not an object, the title
    /// is missing or invalid, or `completed` is present but not a boolean.
    pub fn from_json(body: &Value) -> Result<Self, CoreError> {
        let object = as_object(body)?;
        let title = match object.get("title") {
            Some(Value::String(title)) => validate_title(title)?,
            Some(_) => return Err(CoreError::Validation("title must be a string".into())),
            None => return Err(CoreError::Validation("Title is required".into())),
        };
        let completed = optional_bool(object, "completed")?.unwrap_or(false);
        Ok(Self { title, completed })
    }
}

/// Partial update for an existing task. At least one field is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// Build from a JSON request body with optional `title` and `completed`.
    ///
    /// Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the body is not an object, a present
    /// field has the wrong type or an invalid value, or neither field is set.
    pub fn from_json(body: &Value) -> Result<Self, CoreError> {
        let object = as_object(body)?;
        let title = match object.get("title") {
            Some(Value::String(title)) => Some(validate_title(title)?),
            Some(Value::Null) | None => None,
            Some(_) => return Err(CoreError::Validation("title must be a string".into())),
        };
        let patch = Self {
            title,
            completed: optional_bool(object, "completed")?,
        };
        if patch.is_empty() {
            return Err(CoreError::Validation(
                "nothing to update: provide title and/or completed".into(),
            ));
        }
        Ok(patch)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.completed.is_none()
    }
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, CoreError> {
    body.as_object()
        .ok_or_else(|| CoreError::Validation("request body must be a JSON object".into()))
}

fn optional_bool(object: &Map<String, Value>, key: &str) -> Result<Option<bool>, CoreError> {
    match object.get(key) {
        Some(Value::Bool(flag)) => Ok(Some(*flag)),
        Some(Value::Null) | None => Ok(None),
        Some(other) => Err(CoreError::Validation(format!(
            "{key} must be a boolean, got {other}"
        ))),
    }
}

fn validate_title(raw: &str) -> Result<String, CoreError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(CoreError::Validation("Title is required".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(title.to_string())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn new_task_trims_title() {
        let task = NewTask::new("  Buy milk \n").unwrap();
        assert_eq!(
            task,
            NewTask {
                title: "Buy milk".into(),
                completed: false,
            }
        );
    }

    #[test]
    fn new_task_rejects_blank_titles() {
        for raw in ["", "   ", "\t\n"] {
            assert_eq!(
                NewTask::new(raw),
                Err(CoreError::Validation("Title is required".into())),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn new_task_rejects_overlong_title() {
        let raw = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(NewTask::new(&raw).is_err());
        assert!(NewTask::new(&raw[..MAX_TITLE_LEN]).is_ok());
    }

    #[test]
    fn new_task_from_json_defaults_completed() {
        let task = NewTask::from_json(&json!({"title": "Deploy"})).unwrap();
        assert!(!task.completed);

        let done = NewTask::from_json(&json!({"title": "Deploy", "completed": true})).unwrap();
        assert!(done.completed);
    }

    #[test]
    fn new_task_from_json_requires_title() {
        assert!(NewTask::from_json(&json!({})).is_err());
        assert!(NewTask::from_json(&json!({"title": 7})).is_err());
        assert!(NewTask::from_json(&json!({"title": " "})).is_err());
        assert!(NewTask::from_json(&json!(["title"])).is_err());
    }

    #[test]
    fn completed_must_be_a_real_boolean() {
        for bad in [json!("true"), json!(1), json!([true])] {
            let body = json!({"title": "x", "completed": bad});
            assert!(NewTask::from_json(&body).is_err(), "{body} should fail");
            let patch = json!({"completed": bad});
            assert!(TaskPatch::from_json(&patch).is_err(), "{patch} should fail");
        }
    }

    #[test]
    fn patch_accepts_either_field() {
        assert_eq!(
            TaskPatch::from_json(&json!({"title": " New "})).unwrap(),
            TaskPatch {
                title: Some("New".into()),
                completed: None,
            }
        );
        assert_eq!(
            TaskPatch::from_json(&json!({"completed": true})).unwrap(),
            TaskPatch {
                title: None,
                completed: Some(true),
            }
        );
    }

    #[test]
    fn patch_rejects_empty_update_and_blank_title() {
        assert!(TaskPatch::from_json(&json!({})).is_err());
        assert!(TaskPatch::from_json(&json!({"title": null})).is_err());
        assert!(TaskPatch::from_json(&json!({"title": ""})).is_err());
    }
}
