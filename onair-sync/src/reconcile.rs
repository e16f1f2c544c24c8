//! Detail URLs as idempotency keys against the remote task list.
use std::collections::HashSet;

use onair_common::BroadcastRecord;
use onair_tasks::ExistingTask;
use regex::Regex;

/// URL tokens are matched up to the first whitespace, quote or angle bracket.
pub const URL_PATTERN: &str = r#"https?://[^\s<>"]+"#;

/// URL tokens found in the descriptions of existing tasks.
#[derive(Debug, Clone, Default)]
pub struct ExistingTaskDigest {
    tokens: HashSet<String>,
}

impl ExistingTaskDigest {
    pub fn contains(&self, url: &str) -> bool {
        self.tokens.contains(url)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    pattern: Regex,
}

impl Reconciler {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(URL_PATTERN)?,
        })
    }

    pub fn digest(&self, tasks: &[ExistingTask]) -> ExistingTaskDigest {
        let tokens = tasks
            .iter()
            .flat_map(|task| self.pattern.find_iter(&task.description))
            .map(|m| m.as_str().to_string())
            .collect();
        ExistingTaskDigest { tokens }
    }
}

/// Records split by whether a task already exists for them.
#[derive(Debug, Default)]
pub struct Reconciled {
    pub fresh: Vec<BroadcastRecord>,
    pub already_synced: Vec<BroadcastRecord>,
}

/// Keep the records whose detail URL no existing task mentions. Order is
/// preserved.
pub fn reconcile(records: Vec<BroadcastRecord>, digest: &ExistingTaskDigest) -> Reconciled {
    let (already_synced, fresh) = records
        .into_iter()
        .partition(|r| digest.contains(&r.description_url));
    Reconciled {
        fresh,
        already_synced,
    }
}

/// Drop later records repeating an earlier detail URL. Returns the kept
/// records and how many were dropped.
pub fn dedup_by_url(records: Vec<BroadcastRecord>) -> (Vec<BroadcastRecord>, usize) {
    let mut seen = HashSet::new();
    let before = records.len();
    let kept: Vec<_> = records
        .into_iter()
        .filter(|r| seen.insert(r.description_url.clone()))
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}
