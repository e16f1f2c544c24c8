//! Shared types and utilities for the onair workspace.
//!
//! This crate holds the broadcast data model that flows from the schedule
//! extractor into the sync pipeline, plus the observability helpers every
//! binary and integration test uses. It stays dependency-light so the other
//! crates can depend on it freely.
//!
//! # Overview
//!
//! - [`BroadcastRecord`]: one row of a schedule table, optionally enriched
//!   with its detail-page synopsis
//! - [`Division`]: which team tier a schedule section belongs to
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use onair_common::BroadcastRecord;
//!
//! let record = BroadcastRecord {
//!     date: "6/14 (Sat)".into(),
//!     broadcast_type: "地上波".into(),
//!     broadcaster: "NHK".into(),
//!     label: "生中継".into(),
//!     timetable: "18:00-21:00".into(),
//!     description_url: "https://example.com/detail/1".into(),
//!     description_detail: String::new(),
//!     division: None,
//! };
//! assert_eq!(record.date_component(), "6/14");
//! assert_eq!(record.start_time(), "18:00");
//! assert_eq!(record.month_day(), Some((6, 14)));
//! ```
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod observability;

/// Team tier a schedule section belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Division {
    /// Top-flight (first team) schedule.
    Primary,
    /// Minor-league ("farm") schedule.
    Farm,
}

impl Division {
    /// Short tag appended to task titles.
    pub fn tag(self) -> &'static str {
        match self {
            Division::Primary => "一軍",
            Division::Farm => "ファーム",
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Division::Primary => f.write_str("primary"),
            Division::Farm => f.write_str("farm"),
        }
    }
}

/// One live broadcast listed on the schedule page.
///
/// Records are rebuilt from the live page on every run; nothing here is
/// persisted locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastRecord {
    /// Section date as published, internal whitespace collapsed (e.g. `6/14 (Sat)`).
    pub date: String,
    /// Category from the first column (terrestrial, BS, CS, ...).
    pub broadcast_type: String,
    /// Channel or service name.
    pub broadcaster: String,
    /// Icon caption, live vs recorded.
    pub label: String,
    /// Raw time window, e.g. `18:00-21:00`.
    pub timetable: String,
    /// Absolute detail-page URL. Doubles as the idempotency key downstream.
    pub description_url: String,
    /// Synopsis from the detail page; empty when unavailable.
    pub description_detail: String,
    /// Tier of the section the row came from, when the schedule is tiered.
    pub division: Option<Division>,
}

impl BroadcastRecord {
    /// The date token before the first whitespace (`6/14 (Sat)` -> `6/14`).
    pub fn date_component(&self) -> &str {
        date_component(&self.date)
    }

    /// Start time: the time window's text before the first `-`.
    pub fn start_time(&self) -> &str {
        self.timetable
            .split('-')
            .next()
            .unwrap_or_default()
            .trim()
    }

    /// `(month, day)` parsed from the date header, if it is well-formed.
    pub fn month_day(&self) -> Option<(u32, u32)> {
        parse_month_day(&self.date)
    }

    pub fn is_farm(&self) -> bool {
        self.division == Some(Division::Farm)
    }
}

/// Collapse every run of whitespace (including full-width spaces) to one ASCII space.
pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First whitespace-separated token of a published date.
pub fn date_component(date: &str) -> &str {
    date.split_whitespace().next().unwrap_or_default()
}

/// Parse `M/D` from the first token of a published date string.
///
/// Only the leading digits of each part count, so a weekday suffix glued to
/// the day (`6/14（土）`) still parses.
///
/// ```
/// use onair_common::parse_month_day;
///
/// assert_eq!(parse_month_day("10/3 (Fri)"), Some((10, 3)));
/// assert_eq!(parse_month_day("6/14（土）"), Some((6, 14)));
/// assert_eq!(parse_month_day("not a date"), None);
/// ```
pub fn parse_month_day(date: &str) -> Option<(u32, u32)> {
    let (month, day) = date_component(date).split_once('/')?;
    let month = leading_number(month)?;
    let day = leading_number(day)?;
    if (1..=12).contains(&month) && (1..=31).contains(&day) {
        Some((month, day))
    } else {
        None
    }
}

fn leading_number(part: &str) -> Option<u32> {
    let part = part.trim_start();
    let end = part
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(part.len());
    part[..end].parse().ok()
}
