//! The run driver: fetch, extract, filter, reconcile, enrich, create.
//!
//! Detail pages are fetched only for records that still need a task.
//!
//! Every network call is awaited in strict sequence. Parsed pages are
//! confined to synchronous helpers and dropped before the next `.await`.
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use onair_common::{BroadcastRecord, Division};
use onair_config::{OnairConfig, SourceConfig};
use onair_schedule::{
    DateGate, DetailEnricher, Document, Extractor, FilterOptions, InclusionFilter, PageFetcher,
    ScheduleError,
};
use onair_tasks::{NewTask, TaskService, TaskServiceError};
use thiserror::Error;

use crate::format;
use crate::reconcile::{Reconciler, dedup_by_url, reconcile};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("could not read existing tasks: {0}")]
    TaskList(#[source] TaskServiceError),
    #[error("task creation aborted: {0}")]
    TaskCreate(#[source] TaskServiceError),
    #[error("invalid pipeline configuration: {0}")]
    Config(String),
}

impl From<onair_config::ConfigError> for PipelineError {
    fn from(err: onair_config::ConfigError) -> Self {
        PipelineError::Config(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Fetching,
    Extracting,
    Filtering,
    Reconciling,
    Enriching,
    Creating,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Idle => "idle",
            RunState::Fetching => "fetching",
            RunState::Extracting => "extracting",
            RunState::Filtering => "filtering",
            RunState::Reconciling => "reconciling",
            RunState::Enriching => "enriching",
            RunState::Creating => "creating",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunOutcome {
    #[default]
    Completed,
    /// Kill switch off; nothing was fetched or created.
    Disabled,
}

/// Counters for one run, logged when the run ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub sections: usize,
    /// Sections skipped by the date gate.
    pub sections_gated: usize,
    pub extracted: usize,
    /// Rows rejected by the inclusion filter.
    pub skipped: usize,
    pub surfaced: usize,
    pub duplicates: usize,
    pub synopsis_missing: usize,
    pub already_synced: usize,
    pub created: usize,
    /// Non-authentication create failures.
    pub failed: usize,
    pub auth_failures: usize,
    pub placeholder_created: bool,
}

impl RunReport {
    fn disabled() -> Self {
        Self {
            outcome: RunOutcome::Disabled,
            ..Default::default()
        }
    }
}

/// Everything a run needs, resolved from [`OnairConfig`].
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub project_id: String,
    pub sources: Vec<SourceConfig>,
    pub detail_url_prefix: String,
    pub pacing: Duration,
    pub utc_offset: FixedOffset,
    pub filter: FilterOptions,
    pub enabled: bool,
    pub only_today: bool,
    pub reconcile: bool,
    pub placeholder: bool,
}

impl PipelineSettings {
    pub fn from_config(config: &OnairConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            project_id: config.todoist.project_id.clone(),
            sources: config.schedule.sources.clone(),
            detail_url_prefix: config.schedule.detail_url_prefix.clone(),
            pacing: Duration::from_millis(config.schedule.pacing_ms),
            utc_offset: config.schedule.offset()?,
            filter: FilterOptions {
                include_team_channel: config.filters.include_team_channel,
                include_region_locked: config.filters.include_region_locked,
                excluded_broadcasters: config.filters.excluded_broadcasters.clone(),
            },
            enabled: config.run.enabled,
            only_today: config.run.only_today,
            reconcile: config.run.reconcile,
            placeholder: config.run.placeholder,
        })
    }
}

/// Records of one schedule section that passed the date gate and filters.
struct SectionBatch {
    division: Option<Division>,
    records: Vec<BroadcastRecord>,
}

pub struct Pipeline {
    settings: PipelineSettings,
    fetcher: Arc<dyn PageFetcher>,
    tasks: Arc<dyn TaskService>,
    extractor: Extractor,
    gate: DateGate,
    filter: InclusionFilter,
    enricher: DetailEnricher,
    reconciler: Reconciler,
}

impl Pipeline {
    pub fn new(
        settings: PipelineSettings,
        fetcher: Arc<dyn PageFetcher>,
        tasks: Arc<dyn TaskService>,
    ) -> Result<Self, PipelineError> {
        let extractor = Extractor::new(settings.detail_url_prefix.clone())?;
        let gate = DateGate::new(settings.only_today, settings.utc_offset);
        let filter = InclusionFilter::new(&settings.filter)?;
        let enricher = DetailEnricher::new(fetcher.clone(), settings.pacing)?;
        let reconciler = Reconciler::new().map_err(|e| PipelineError::Config(e.to_string()))?;
        Ok(Self {
            settings,
            fetcher,
            tasks,
            extractor,
            gate,
            filter,
            enricher,
            reconciler,
        })
    }

    pub fn from_config(
        config: &OnairConfig,
        fetcher: Arc<dyn PageFetcher>,
        tasks: Arc<dyn TaskService>,
    ) -> Result<Self, PipelineError> {
        Self::new(PipelineSettings::from_config(config)?, fetcher, tasks)
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run once against the wall clock.
    pub async fn run_once(&self) -> Result<RunReport, PipelineError> {
        self.run_at(Utc::now()).await
    }

    /// Run once as if the current instant were `now` (only the date gate
    /// looks at the clock).
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RunReport, PipelineError> {
        if !self.settings.enabled {
            tracing::info!("pipeline.disabled");
            return Ok(RunReport::disabled());
        }

        let mut state = RunState::Idle;
        let mut report = RunReport::default();
        match self.drive(&mut state, &mut report, now).await {
            Ok(()) => {
                transition(&mut state, RunState::Done);
                log_report(&report);
                Ok(report)
            }
            Err(err) => {
                let failed_in = state;
                transition(&mut state, RunState::Failed);
                tracing::error!(state = %failed_in, error = %err, "pipeline.failed");
                log_report(&report);
                Err(err)
            }
        }
    }

    async fn drive(
        &self,
        state: &mut RunState,
        report: &mut RunReport,
        now: DateTime<Utc>,
    ) -> Result<(), PipelineError> {
        let mut batches = Vec::new();
        for source in &self.settings.sources {
            transition(state, RunState::Fetching);
            let html = self
                .fetcher
                .fetch_page(&source.url)
                .await
                .map_err(|source_err| ScheduleError::Fetch {
                    url: source.url.clone(),
                    source: source_err,
                })?;

            transition(state, RunState::Extracting);
            let extracted = self.extract_page(&html, source, now, report)?;
            batches.extend(extracted);
        }

        transition(state, RunState::Filtering);
        let surfaced = self.filter_batches(batches, report);

        if surfaced.is_empty() {
            tracing::info!("pipeline.nothing_surfaced");
            if self.settings.placeholder {
                transition(state, RunState::Creating);
                let task = format::placeholder(&self.settings.project_id);
                if self.create(&task, report).await? {
                    report.placeholder_created = true;
                }
            }
            return Ok(());
        }

        let mut fresh = if self.settings.reconcile {
            transition(state, RunState::Reconciling);
            let existing = self
                .tasks
                .list_tasks(&self.settings.project_id)
                .await
                .map_err(PipelineError::TaskList)?;
            let digest = self.reconciler.digest(&existing);
            tracing::debug!(
                existing = existing.len(),
                tokens = digest.len(),
                "pipeline.reconcile.digest"
            );
            let out = reconcile(surfaced, &digest);
            for record in &out.already_synced {
                tracing::info!(
                    url = %record.description_url,
                    broadcaster = %record.broadcaster,
                    "pipeline.record.already_synced"
                );
            }
            report.already_synced = out.already_synced.len();
            out.fresh
        } else {
            surfaced
        };

        if fresh.is_empty() {
            return Ok(());
        }

        transition(state, RunState::Enriching);
        report.synopsis_missing = self.enricher.enrich_all(&mut fresh).await;

        transition(state, RunState::Creating);
        for record in &fresh {
            let task = format::task(record, &self.settings.project_id);
            self.create(&task, report).await?;
        }
        Ok(())
    }

    /// Parse one page and return its admitted sections. Synchronous so the
    /// parsed document never lives across an `.await`.
    fn extract_page(
        &self,
        html: &str,
        source: &SourceConfig,
        now: DateTime<Utc>,
        report: &mut RunReport,
    ) -> Result<Vec<SectionBatch>, ScheduleError> {
        let doc = Document::parse(html);
        let sections = self.extractor.sections(&doc, &source.url, source.division)?;
        let mut batches = Vec::with_capacity(sections.len());
        for section in &sections {
            report.sections += 1;
            if !self.gate.admits(&section.date, now) {
                report.sections_gated += 1;
                tracing::info!(
                    url = %source.url,
                    section = section.index,
                    date = %section.date,
                    "schedule.section.not_today"
                );
                continue;
            }
            let records: Vec<_> = section.records().collect();
            report.extracted += records.len();
            tracing::debug!(
                url = %source.url,
                section = section.index,
                date = %section.date,
                division = ?section.division,
                rows = records.len(),
                "schedule.section.extracted"
            );
            batches.push(SectionBatch {
                division: section.division,
                records,
            });
        }
        Ok(batches)
    }

    /// Apply the inclusion filter, order sections primary-first, and collapse
    /// repeated detail URLs.
    fn filter_batches(
        &self,
        mut batches: Vec<SectionBatch>,
        report: &mut RunReport,
    ) -> Vec<BroadcastRecord> {
        // Stable: None and primary sections keep page order ahead of farm.
        batches.sort_by_key(|b| b.division);

        let mut surfaced = Vec::new();
        for batch in batches {
            for record in batch.records {
                match self.filter.check(&record) {
                    Ok(()) => surfaced.push(record),
                    Err(reason) => {
                        report.skipped += 1;
                        tracing::info!(
                            broadcaster = %record.broadcaster,
                            broadcast_type = %record.broadcast_type,
                            label = %record.label,
                            reason = %reason,
                            "schedule.row.skipped"
                        );
                    }
                }
            }
        }

        let (surfaced, duplicates) = dedup_by_url(surfaced);
        report.duplicates = duplicates;
        report.surfaced = surfaced.len();
        surfaced
    }

    /// Create one task. Request failures are logged and counted; only
    /// unexpected failures abort the run. Returns whether the task was created.
    async fn create(&self, task: &NewTask, report: &mut RunReport) -> Result<bool, PipelineError> {
        tracing::info!(
            content = %task.content,
            due = %task.due_string,
            "tasks.create"
        );
        match self.tasks.create_task(task).await {
            Ok(created) => {
                report.created += 1;
                tracing::info!(task_id = %created.id, content = %task.content, "tasks.created");
                Ok(true)
            }
            Err(err) if err.is_authentication_error() => {
                report.auth_failures += 1;
                if let TaskServiceError::Request {
                    status,
                    message,
                    body,
                } = &err
                {
                    tracing::error!(
                        status = ?status,
                        message = %message,
                        body = %body,
                        is_authentication_error = true,
                        content = %task.content,
                        "tasks.create.auth_failed"
                    );
                }
                Ok(false)
            }
            Err(TaskServiceError::Request {
                status,
                message,
                body,
            }) => {
                report.failed += 1;
                tracing::error!(
                    status = ?status,
                    message = %message,
                    body = %body,
                    is_authentication_error = false,
                    content = %task.content,
                    "tasks.create.failed"
                );
                Ok(false)
            }
            Err(err) => Err(PipelineError::TaskCreate(err)),
        }
    }
}

fn transition(state: &mut RunState, next: RunState) {
    if *state != next {
        tracing::debug!(from = %state, to = %next, "pipeline.state");
        *state = next;
    }
}

fn log_report(report: &RunReport) {
    tracing::info!(
        sections = report.sections,
        sections_gated = report.sections_gated,
        extracted = report.extracted,
        skipped = report.skipped,
        surfaced = report.surfaced,
        duplicates = report.duplicates,
        synopsis_missing = report.synopsis_missing,
        already_synced = report.already_synced,
        created = report.created,
        failed = report.failed,
        auth_failures = report.auth_failures,
        placeholder = report.placeholder_created,
        "pipeline.report"
    );
}

