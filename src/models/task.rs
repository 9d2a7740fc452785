use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Store-assigned task identifier.
///
/// Ids are opaque here: whatever the store sends back is echoed unchanged, and
/// a path segment is handed to the store's filter as text. Which ids are valid
/// (bigint, uuid, ...) is the store's call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    Number(i64),
    Text(String),
}

impl TaskId {
    /// The numeric form, when the id is a number or a numeric string.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TaskId::Number(n) => Some(*n),
            TaskId::Text(s) => s.parse().ok(),
        }
    }
}

impl From<i64> for TaskId {
    fn from(id: i64) -> Self {
        TaskId::Number(id)
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        TaskId::Text(id)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskId::Number(n) => write!(f, "{}", n),
            TaskId::Text(s) => f.write_str(s),
        }
    }
}

/// Represents a task row as stored by the data service and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Identifier assigned by the store.
    pub id: TaskId,
    /// The title of the task.
    pub title: String,
    /// Free-form description; empty unless the creator supplied one.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the task is done.
    pub completed: bool,
    /// Identity of the user who created (and owns) the task.
    pub user_id: Uuid,
    /// Timestamp assigned by the store on insert.
    pub created_at: DateTime<Utc>,
}

/// Request body for creating a task.
///
/// Any other field in the body, `user_id` included, is ignored.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// Required, non-empty.
    #[validate(length(min = 1))]
    pub title: Option<String>,

    /// Optional; stored as an empty string when absent.
    pub description: Option<String>,
}

/// The row sent to the store on insert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub user_id: Uuid,
}

impl NewTask {
    /// Builds the insert row for `owner`. Returns `None` when the input carries no usable title.
    pub fn from_input(input: TaskInput, owner: Uuid) -> Option<Self> {
        if input.validate().is_err() {
            return None;
        }
        Some(Self {
            title: input.title?,
            description: input.description.unwrap_or_default(),
            completed: false,
            user_id: owner,
        })
    }
}

/// Request body for a partial update.
///
/// Fields that are absent (or `null`) are left untouched by the store. A
/// request without a body is an empty patch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// Decodes a raw update body. An empty (or all-whitespace) body yields the empty patch.
    pub fn from_body(body: &[u8]) -> Result<Self, serde_json::Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
    }

    /// Applies the present fields to `task`.
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = Some(description.clone());
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_task_defaults() {
        let owner = Uuid::new_v4();
        let input = TaskInput {
            title: Some("buy milk".into()),
            description: None,
        };

        let row = NewTask::from_input(input, owner).unwrap();
        assert_eq!(row.title, "buy milk");
        assert_eq!(row.description, "");
        assert!(!row.completed);
        assert_eq!(row.user_id, owner);
    }

    #[test]
    fn test_new_task_requires_title() {
        let owner = Uuid::new_v4();
        assert!(NewTask::from_input(TaskInput::default(), owner).is_none());

        let empty = TaskInput {
            title: Some(String::new()),
            description: Some("Test Description".into()),
        };
        assert!(empty.validate().is_err());
        assert!(NewTask::from_input(empty, owner).is_none());
    }

    #[test]
    fn test_input_ignores_user_id() {
        let owner = Uuid::new_v4();
        let input: TaskInput = serde_json::from_value(json!({
            "title": "T",
            "user_id": Uuid::new_v4()
        }))
        .unwrap();

        let row = NewTask::from_input(input, owner).unwrap();
        assert_eq!(row.user_id, owner);
    }

    #[test]
    fn test_patch_only_applies_present_fields() {
        let mut task = Task {
            id: TaskId::from(1),
            title: "Original".into(),
            description: Some("keep me".into()),
            completed: false,
            user_id: Uuid::new_v4(),
            created_at: Utc::now(),
        };

        let patch: TaskPatch =
            serde_json::from_value(json!({ "completed": true, "description": null })).unwrap();
        patch.apply(&mut task);

        assert_eq!(task.title, "Original");
        assert_eq!(task.description.as_deref(), Some("keep me"));
        assert!(task.completed);
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "completed": true }));
    }

    #[test]
    fn test_patch_from_empty_body() {
        assert_eq!(TaskPatch::from_body(b"").unwrap(), TaskPatch::default());
        assert_eq!(TaskPatch::from_body(b" \n").unwrap(), TaskPatch::default());
        assert_eq!(
            TaskPatch::from_body(br#"{"title":"x"}"#).unwrap().title.as_deref(),
            Some("x")
        );
        assert!(TaskPatch::from_body(b"{ not json").is_err());
    }

    #[test]
    fn test_task_id_keeps_store_form() {
        let numeric: TaskId = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(numeric, TaskId::Number(42));
        assert_eq!(serde_json::to_value(&numeric).unwrap(), json!(42));

        let uuid = Uuid::new_v4().to_string();
        let text: TaskId = serde_json::from_value(json!(uuid)).unwrap();
        assert_eq!(text.to_string(), uuid);
        assert_eq!(text.as_i64(), None);

        assert_eq!(TaskId::from("17".to_string()).as_i64(), Some(17));
    }
}
