#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::FixedOffset;
use onair_common::observability::{LogConfig, LogFormat};
use onair_config::SourceConfig;
use onair_http::{HttpError, StatusCode};
use onair_schedule::{FilterOptions, PageFetcher};
use onair_sync::PipelineSettings;
use onair_tasks::{ExistingTask, NewTask, TaskService, TaskServiceError};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub const PAGE_URL: &str = "https://hanshintigers.jp/news/media/live.html";

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "onair-tests",
            log_dir: Some(std::env::temp_dir().join("onair-test-logs")),
            emit_stderr: true,
            format: if std::env::var("ONAIR_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "debug",
        };

        onair_common::observability::init_logging(config).unwrap_or_default()
    });
}

pub fn settings() -> PipelineSettings {
    PipelineSettings {
        project_id: "42".into(),
        sources: vec![SourceConfig {
            url: PAGE_URL.into(),
            division: None,
        }],
        detail_url_prefix: "https:".into(),
        pacing: Duration::from_secs(1),
        utc_offset: FixedOffset::east_opt(9 * 3600).unwrap(),
        filter: FilterOptions::default(),
        enabled: true,
        only_today: false,
        reconcile: true,
        placeholder: true,
    }
}

pub fn row(kind: &str, broadcaster: &str, label: &str, time: &str, detail_id: u32) -> String {
    format!(
        r#"<tr><td>{kind}</td><td>{broadcaster}</td><td class="timetable"><img src="/img/i.png" alt="{label}">{time}</td><td><a href="//hanshintigers.jp/news/media/detail/{detail_id}.html">詳細</a></td></tr>"#
    )
}

pub fn section(title: &str, date: &str, rows: &[String]) -> String {
    format!(
        r#"<div class="media-list clearfix"><h3 class="media-list-title">{title}</h3><div class="air-date">{date}</div><table class="basic-table"><tbody>{}</tbody></table></div>"#,
        rows.concat()
    )
}

pub fn page(sections: &[String]) -> String {
    format!(
        "<html><body><div id=\"contents\">{}</div></body></html>",
        sections.concat()
    )
}

pub fn detail_url(detail_id: u32) -> String {
    format!("https://hanshintigers.jp/news/media/detail/{detail_id}.html")
}

pub fn detail_page(note: &str) -> String {
    format!(r#"<html><body><div class="media-detail"><p class="media-detail-note">{note}</p></div></body></html>"#)
}

/// Pages served from memory; unknown URLs fail like a dead host.
#[derive(Default)]
pub struct FakeSite {
    pages: Mutex<HashMap<String, Result<String, u16>>>,
    pub requests: Mutex<Vec<String>>,
}

impl FakeSite {
    pub fn serve(&self, url: &str, body: String) {
        self.pages.lock().unwrap().insert(url.to_string(), Ok(body));
    }

    pub fn fail(&self, url: &str, status: u16) {
        self.pages.lock().unwrap().insert(url.to_string(), Err(status));
    }

    pub fn requested(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for FakeSite {
    async fn fetch_page(&self, url: &str) -> Result<String, HttpError> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.pages.lock().unwrap().get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(code)) => Err(HttpError::Api {
                status: StatusCode::from_u16(*code).unwrap(),
                message: "server error".into(),
                body: String::new(),
            }),
            None => Err(HttpError::Network(format!("connection refused: {url}"))),
        }
    }
}

/// What the fake task service should do on the next create calls.
#[derive(Debug, Clone)]
pub enum CreateFailure {
    Status(u16),
    Unexpected,
}

/// In-memory project; created tasks show up in later listings.
#[derive(Default)]
pub struct FakeProject {
    pub tasks: Mutex<Vec<ExistingTask>>,
    pub created: Mutex<Vec<NewTask>>,
    pub list_calls: Mutex<usize>,
    pub fail_list: Mutex<Option<u16>>,
    /// Failures consumed in order, one per create call, before creates succeed.
    pub create_failures: Mutex<Vec<CreateFailure>>,
}

impl FakeProject {
    pub fn created(&self) -> Vec<NewTask> {
        self.created.lock().unwrap().clone()
    }

    pub fn fail_creates(&self, failures: Vec<CreateFailure>) {
        *self.create_failures.lock().unwrap() = failures;
    }
}

#[async_trait]
impl TaskService for FakeProject {
    async fn list_tasks(&self, _project_id: &str) -> Result<Vec<ExistingTask>, TaskServiceError> {
        *self.list_calls.lock().unwrap() += 1;
        if let Some(status) = *self.fail_list.lock().unwrap() {
            return Err(TaskServiceError::Request {
                status: Some(status),
                message: "list failed".into(),
                body: String::new(),
            });
        }
        Ok(self.tasks.lock().unwrap().clone())
    }

    async fn create_task(&self, task: &NewTask) -> Result<ExistingTask, TaskServiceError> {
        let failure = {
            let mut failures = self.create_failures.lock().unwrap();
            if failures.is_empty() {
                None
            } else {
                Some(failures.remove(0))
            }
        };
        match failure {
            Some(CreateFailure::Status(status)) => {
                return Err(TaskServiceError::Request {
                    status: Some(status),
                    message: "rejected".into(),
                    body: "{}".into(),
                });
            }
            Some(CreateFailure::Unexpected) => {
                return Err(TaskServiceError::Unexpected("decode error".into()));
            }
            None => {}
        }

        self.created.lock().unwrap().push(task.clone());
        let mut tasks = self.tasks.lock().unwrap();
        let stored = ExistingTask {
            id: (tasks.len() + 1).to_string(),
            content: task.content.clone(),
            description: task.description.clone().unwrap_or_default(),
        };
        tasks.push(stored.clone());
        Ok(stored)
    }
}
