//! Broadcast record extraction from a parsed schedule page.
//!
//! A page holds one or more schedule sections. Each section carries a date
//! header and a table; every well-formed table row becomes one
//! [`BroadcastRecord`] stamped with the section's date and division.
use std::fmt;

use onair_common::{BroadcastRecord, Division, collapse_whitespace, parse_month_day};
use url::Url;

use crate::ScheduleError;
use crate::document::{Document, Node};
use crate::selectors::{FARM_MARKER, Selectors};

/// Why a row could not become a record. Rows like these are dropped, never
/// reported as run errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowDefect {
    MissingType,
    MissingBroadcaster,
    MissingTimetable,
    MissingDetailLink,
}

impl fmt::Display for RowDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RowDefect::MissingType => "missing broadcast type cell",
            RowDefect::MissingBroadcaster => "missing broadcaster cell",
            RowDefect::MissingTimetable => "missing time window",
            RowDefect::MissingDetailLink => "missing detail link",
        };
        f.write_str(s)
    }
}

/// Walks schedule pages. Build once per run and reuse across pages.
#[derive(Debug, Clone)]
pub struct Extractor {
    sel: Selectors,
    detail_url_prefix: String,
}

impl Extractor {
    /// `detail_url_prefix` is glued onto protocol-relative hrefs (`//host/...`).
    pub fn new(detail_url_prefix: impl Into<String>) -> Result<Self, ScheduleError> {
        Ok(Self {
            sel: Selectors::compile()?,
            detail_url_prefix: detail_url_prefix.into(),
        })
    }

    /// Locate every schedule section on the page, in document order.
    ///
    /// A page without any section container, or a section without a date
    /// header, means the layout changed: that is a [`ScheduleError::Structural`].
    pub fn sections<'d>(
        &'d self,
        doc: &'d Document,
        page_url: &str,
        source_division: Option<Division>,
    ) -> Result<Vec<Section<'d>>, ScheduleError> {
        let roots: Vec<Node<'d>> = doc.query(&self.sel.section).collect();
        if roots.is_empty() {
            return Err(ScheduleError::Structural(format!(
                "no schedule container ({}) on {page_url}",
                self.sel.section.css()
            )));
        }
        let tiered = roots.len() > 1;
        let base = Url::parse(page_url).ok();

        roots
            .into_iter()
            .enumerate()
            .map(|(index, root)| -> Result<Section<'d>, ScheduleError> {
                let date = root
                    .query_first(&self.sel.section_date)
                    .map(Node::text)
                    .filter(|d| !d.is_empty())
                    .ok_or_else(|| {
                        ScheduleError::Structural(format!(
                            "schedule section #{index} on {page_url} has no date header ({})",
                            self.sel.section_date.css()
                        ))
                    })?;

                let farm_heading = root
                    .query(&self.sel.section_title)
                    .any(|title| title.text_content().contains(FARM_MARKER));
                let division = if farm_heading {
                    Some(Division::Farm)
                } else if source_division.is_some() {
                    source_division
                } else if tiered {
                    Some(Division::Primary)
                } else {
                    None
                };

                Ok(Section {
                    index,
                    date,
                    division,
                    root,
                    base: base.clone(),
                    extractor: self,
                })
            })
            .collect()
    }

    fn parse_row(
        &self,
        row: Node<'_>,
        date: &str,
        division: Option<Division>,
        base: Option<&Url>,
    ) -> Result<BroadcastRecord, RowDefect> {
        let broadcast_type = row
            .query_first(&self.sel.cell_type)
            .map(Node::text)
            .ok_or(RowDefect::MissingType)?;

        let broadcaster = row
            .query_first(&self.sel.cell_broadcaster)
            .map(Node::text)
            .filter(|b| !b.is_empty())
            .ok_or(RowDefect::MissingBroadcaster)?;

        let timetable = row
            .query_first(&self.sel.cell_timetable)
            .map(Node::text)
            .filter(|t| !t.is_empty())
            .ok_or(RowDefect::MissingTimetable)?;

        let label = row
            .query_first(&self.sel.label_icon)
            .and_then(|img| img.attr("alt"))
            .map(collapse_whitespace)
            .unwrap_or_default();

        let description_url = row
            .query_first(&self.sel.detail_link)
            .and_then(|a| a.attr("href"))
            .and_then(|href| resolve_detail_url(&self.detail_url_prefix, base, href))
            .ok_or(RowDefect::MissingDetailLink)?;

        Ok(BroadcastRecord {
            date: date.to_string(),
            broadcast_type,
            broadcaster,
            label,
            timetable,
            description_url,
            description_detail: String::new(),
            division,
        })
    }
}

/// One schedule block of a page.
pub struct Section<'d> {
    pub index: usize,
    /// Date header, whitespace-collapsed.
    pub date: String,
    pub division: Option<Division>,
    root: Node<'d>,
    base: Option<Url>,
    extractor: &'d Extractor,
}

impl<'d> Section<'d> {
    pub fn month_day(&self) -> Option<(u32, u32)> {
        parse_month_day(&self.date)
    }

    /// Every table row in document order, parsed or rejected.
    pub fn rows(&self) -> impl Iterator<Item = Result<BroadcastRecord, RowDefect>> + '_ {
        self.root.query(&self.extractor.sel.rows).map(move |row| {
            self.extractor
                .parse_row(row, &self.date, self.division, self.base.as_ref())
        })
    }

    /// Well-formed records only; malformed rows are dropped with a debug event.
    pub fn records(&self) -> impl Iterator<Item = BroadcastRecord> + '_ {
        self.rows().enumerate().filter_map(move |(row, parsed)| match parsed {
            Ok(record) => Some(record),
            Err(defect) => {
                tracing::debug!(
                    section = self.index,
                    row,
                    defect = %defect,
                    "schedule.row.malformed"
                );
                None
            }
        })
    }
}

/// Turn a row's href into an absolute URL.
///
/// Protocol-relative hrefs get the configured scheme prefix; absolute ones
/// pass through; anything else resolves against the page URL.
pub fn resolve_detail_url(prefix: &str, base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with("//") {
        return Some(format!("{prefix}{href}"));
    }
    if let Ok(abs) = Url::parse(href) {
        return Some(abs.to_string());
    }
    base?.join(href).ok().map(|u| u.to_string())
}
