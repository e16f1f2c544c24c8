use std::borrow::Cow;
use std::fmt;

use async_trait::async_trait;
use onair_http::{Auth, HttpClient, HttpError, RequestOpts};

use crate::{ExistingTask, NewTask, TaskService, TaskServiceError};

/// Todoist REST client (`/tasks` endpoints only).
#[derive(Clone)]
pub struct TodoistClient {
    http: HttpClient,
    token: String,
}

impl fmt::Debug for TodoistClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TodoistClient")
            .field("base", &self.http.base().as_str())
            .field("token", &"<redacted>")
            .finish()
    }
}

impl TodoistClient {
    /// `base_url` should end in `/` so relative endpoint paths join under it.
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, TaskServiceError> {
        let http = HttpClient::new(base_url).map_err(map_http_error)?;
        Ok(Self::with_http(http, token))
    }

    pub fn with_http(http: HttpClient, token: impl Into<String>) -> Self {
        Self {
            http,
            token: token.into(),
        }
    }

    fn opts<'a>(&'a self, query: Option<Vec<(&'a str, Cow<'a, str>)>>) -> RequestOpts<'a> {
        RequestOpts {
            auth: Some(Auth::Bearer(&self.token)),
            query,
            ..Default::default()
        }
    }
}

#[async_trait]
impl TaskService for TodoistClient {
    async fn list_tasks(&self, project_id: &str) -> Result<Vec<ExistingTask>, TaskServiceError> {
        let opts = self.opts(Some(vec![("project_id", Cow::Borrowed(project_id))]));
        let tasks: Vec<ExistingTask> = self
            .http
            .get_json("tasks", opts)
            .await
            .map_err(map_http_error)?;
        tracing::debug!(project_id, count = tasks.len(), "todoist.tasks.listed");
        Ok(tasks)
    }

    async fn create_task(&self, task: &NewTask) -> Result<ExistingTask, TaskServiceError> {
        let created: ExistingTask = self
            .http
            .post_json("tasks", task, self.opts(None))
            .await
            .map_err(map_http_error)?;
        tracing::debug!(task_id = %created.id, "todoist.task.created");
        Ok(created)
    }
}

/// Status and transport failures are request errors; everything else
/// (URL, client build, decode) is unexpected.
fn map_http_error(err: HttpError) -> TaskServiceError {
    match err {
        HttpError::Api {
            status,
            message,
            body,
        } => TaskServiceError::Request {
            status: Some(status.as_u16()),
            message,
            body,
        },
        HttpError::Network(message) => TaskServiceError::Request {
            status: None,
            message,
            body: String::new(),
        },
        other => TaskServiceError::Unexpected(other.to_string()),
    }
}
