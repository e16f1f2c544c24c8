//! Task-service seam and the Todoist REST client behind it.
//!
//! The sync pipeline only ever talks to [`TaskService`]; tests swap in an
//! in-memory implementation.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod todoist;

pub use todoist::TodoistClient;

/// A task already present in the target project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingTask {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub description: String,
}

/// A task to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub content: String,
    pub due_string: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub project_id: String,
}

#[derive(Debug, Error)]
pub enum TaskServiceError {
    /// The service answered with an error status, or could not be reached
    /// (`status` is `None` then).
    #[error("task service request failed ({}): {message}", status_label(.status))]
    Request {
        status: Option<u16>,
        message: String,
        body: String,
    },
    /// Anything that is not a plain request failure: bad URLs, undecodable
    /// responses, client construction.
    #[error("unexpected task service failure: {0}")]
    Unexpected(String),
}

impl TaskServiceError {
    pub fn is_authentication_error(&self) -> bool {
        matches!(
            self,
            TaskServiceError::Request {
                status: Some(401 | 403),
                ..
            }
        )
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TaskServiceError::Request { status, .. } => *status,
            TaskServiceError::Unexpected(_) => None,
        }
    }
}

fn status_label(status: &Option<u16>) -> String {
    status.map_or_else(|| "no response".to_string(), |s| s.to_string())
}

#[async_trait]
pub trait TaskService: Send + Sync {
    /// Every open task in `project_id`.
    async fn list_tasks(&self, project_id: &str) -> Result<Vec<ExistingTask>, TaskServiceError>;

    async fn create_task(&self, task: &NewTask) -> Result<ExistingTask, TaskServiceError>;
}

/// Task ids arrive as strings from the REST API but as numbers from older
/// payloads; accept both.
fn id_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Num(u64),
    }
    Ok(match Id::deserialize(de)? {
        Id::Str(s) => s,
        Id::Num(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_are_401_and_403_only() {
        let req = |status| TaskServiceError::Request {
            status,
            message: "x".into(),
            body: String::new(),
        };
        assert!(req(Some(401)).is_authentication_error());
        assert!(req(Some(403)).is_authentication_error());
        assert!(!req(Some(500)).is_authentication_error());
        assert!(!req(None).is_authentication_error());
        assert!(!TaskServiceError::Unexpected("x".into()).is_authentication_error());
    }

    #[test]
    fn display_names_the_status() {
        let err = TaskServiceError::Request {
            status: None,
            message: "connection refused".into(),
            body: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "task service request failed (no response): connection refused"
        );
    }

    #[test]
    fn tasks_decode_with_numeric_or_string_ids() {
        let tasks: Vec<ExistingTask> = serde_json::from_str(
            r#"[{"id":"8","content":"a","description":"d"},{"id":9,"content":"b"}]"#,
        )
        .unwrap();
        assert_eq!(tasks[0].id, "8");
        assert_eq!(tasks[1].id, "9");
        assert_eq!(tasks[1].description, "");
    }

    #[test]
    fn new_task_omits_missing_description() {
        let task = NewTask {
            content: "c".into(),
            due_string: "today".into(),
            description: None,
            project_id: "42".into(),
        };
        let json = serde_json::to_value(&task).unwrap();
        assert!(json.get("description").is_none());
        assert_eq!(json["due_string"], "today");
    }
}
