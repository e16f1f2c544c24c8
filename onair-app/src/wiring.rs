use anyhow::{Context, Result};
use onair_common::observability::LogConfig;
use onair_config::{LogSettings, OnairConfig};
use onair_http::HttpClient;
use onair_schedule::HttpPageFetcher;
use onair_sync::Pipeline;
use onair_tasks::TodoistClient;
use std::sync::Arc;
use std::time::Duration;

pub fn log_config(settings: &LogSettings) -> LogConfig {
    LogConfig {
        log_dir: settings.dir.clone(),
        emit_stderr: settings.stderr,
        format: settings.format,
        ..LogConfig::default()
    }
}

/// One HTTP client for the schedule site, one for the task service; both
/// share the configured request timeout.
pub fn build_pipeline(cfg: &OnairConfig) -> Result<Pipeline> {
    let timeout = Duration::from_secs(cfg.schedule.http_timeout_secs);

    let first_source = cfg
        .schedule
        .sources
        .first()
        .context("schedule.sources is empty")?;
    let site = HttpClient::new(&first_source.url)
        .context("building schedule-site client")?
        .with_timeout(timeout);
    let fetcher = Arc::new(HttpPageFetcher::new(site));

    let api = HttpClient::new(&cfg.todoist.base_url)
        .context("building task-service client")?
        .with_timeout(timeout);
    let tasks = Arc::new(TodoistClient::with_http(api, cfg.todoist.api_token.clone()));

    Pipeline::from_config(cfg, fetcher, tasks).context("assembling pipeline")
}

#[cfg(test)]
mod tests {
    use super::*;
    use onair_common::observability::LogFormat;
    use onair_config::OnairConfigLoader;

    #[test]
    fn builds_from_defaults_plus_file() {
        let cfg = OnairConfigLoader::new()
            .with_yaml_str(
                r#"
todoist:
  api_token: "tok"
  project_id: "42"
run:
  enabled: true
log:
  format: json
  stderr: false
"#,
            )
            .load()
            .unwrap();
        let pipeline = build_pipeline(&cfg).unwrap();
        assert_eq!(pipeline.settings().project_id, "42");
        assert_eq!(pipeline.settings().pacing, Duration::from_millis(1000));

        let log = log_config(&cfg.log);
        assert_eq!(log.format, LogFormat::Json);
        assert!(!log.emit_stderr);
        assert_eq!(log.app_name, "onair");
    }
}
