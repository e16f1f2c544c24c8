//! Every CSS selector the source site's layout is read through.
//!
//! Layout drift on the schedule site should only ever need edits here.
use crate::ScheduleError;
use crate::document::Query;

/// One schedule block (date header + table).
const SECTION: &str = "div.media-list";
const SECTION_DATE: &str = "div.air-date";
const SECTION_TITLE: &str = "h2, h3, .media-list-title";
const ROWS: &str = "table.basic-table > tbody > tr";
const CELL_TYPE: &str = "td:nth-child(1)";
const CELL_BROADCASTER: &str = "td:nth-child(2)";
const CELL_TIMETABLE: &str = "td.timetable";
const LABEL_ICON: &str = "td.timetable > img[alt]";
const DETAIL_LINK: &str = "td:nth-child(4) > a[href]";
/// Synopsis paragraph on the detail page.
const DETAIL_NOTE: &str = "p.media-detail-note";

/// Section headings containing this marker belong to the farm schedule.
pub(crate) const FARM_MARKER: &str = "ファーム";

#[derive(Debug, Clone)]
pub(crate) struct Selectors {
    pub section: Query,
    pub section_date: Query,
    pub section_title: Query,
    pub rows: Query,
    pub cell_type: Query,
    pub cell_broadcaster: Query,
    pub cell_timetable: Query,
    pub label_icon: Query,
    pub detail_link: Query,
}

impl Selectors {
    pub fn compile() -> Result<Self, ScheduleError> {
        Ok(Self {
            section: Query::new(SECTION)?,
            section_date: Query::new(SECTION_DATE)?,
            section_title: Query::new(SECTION_TITLE)?,
            rows: Query::new(ROWS)?,
            cell_type: Query::new(CELL_TYPE)?,
            cell_broadcaster: Query::new(CELL_BROADCASTER)?,
            cell_timetable: Query::new(CELL_TIMETABLE)?,
            label_icon: Query::new(LABEL_ICON)?,
            detail_link: Query::new(DETAIL_LINK)?,
        })
    }
}

pub(crate) fn detail_note() -> Result<Query, ScheduleError> {
    Query::new(DETAIL_NOTE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_selectors_compile() {
        Selectors::compile().expect("selectors compile");
        detail_note().expect("detail selector compiles");
    }
}
