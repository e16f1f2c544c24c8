//! Record to task-request mapping. No I/O.
use onair_common::BroadcastRecord;
use onair_tasks::NewTask;

/// Content of the task created when nothing is watchable.
pub const PLACEHOLDER_CONTENT: &str = "本日視聴可能な野球放送はありません。";
pub const PLACEHOLDER_DUE: &str = "today";

/// `"<broadcaster> <date>"`, with the tier tag when the page has tiers.
///
/// ```
/// use onair_common::{BroadcastRecord, Division};
/// use onair_sync::format::content;
///
/// let mut record = BroadcastRecord {
///     date: "6/14 (土)".into(),
///     broadcast_type: "地上波".into(),
///     broadcaster: "NHK".into(),
///     label: "生中継".into(),
///     timetable: "18:00-21:00".into(),
///     description_url: "https://hanshintigers.jp/news/media/detail/1.html".into(),
///     description_detail: String::new(),
///     division: None,
/// };
/// assert_eq!(content(&record), "NHK 6/14 (土)");
/// record.division = Some(Division::Farm);
/// assert_eq!(content(&record), "NHK 6/14 (土) [ファーム]");
/// ```
pub fn content(record: &BroadcastRecord) -> String {
    match record.division {
        Some(division) => format!("{} {} [{}]", record.broadcaster, record.date, division.tag()),
        None => format!("{} {}", record.broadcaster, record.date),
    }
}

/// `"<M/D>@<start>"`. The clock time is passed through as published; the
/// task service interprets it in the account's own time zone.
pub fn due_string(record: &BroadcastRecord) -> String {
    format!("{}@{}", record.date_component(), record.start_time())
}

/// Time window, synopsis and detail URL, one per line. The URL line is what
/// the reconciler later matches on.
pub fn description(record: &BroadcastRecord) -> String {
    let mut lines = vec![record.timetable.as_str()];
    let synopsis = record.description_detail.trim();
    if !synopsis.is_empty() {
        lines.push(synopsis);
    }
    lines.push(record.description_url.as_str());
    lines.join("\n")
}

pub fn task(record: &BroadcastRecord, project_id: &str) -> NewTask {
    NewTask {
        content: content(record),
        due_string: due_string(record),
        description: Some(description(record)),
        project_id: project_id.to_string(),
    }
}

pub fn placeholder(project_id: &str) -> NewTask {
    NewTask {
        content: PLACEHOLDER_CONTENT.to_string(),
        due_string: PLACEHOLDER_DUE.to_string(),
        description: None,
        project_id: project_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onair_common::Division;

    fn record() -> BroadcastRecord {
        BroadcastRecord {
            date: "6/14 (Sat)".into(),
            broadcast_type: "地上波".into(),
            broadcaster: "NHK".into(),
            label: "生中継".into(),
            timetable: "18:00-21:00".into(),
            description_url: "https://hanshintigers.jp/news/media/detail/1.html".into(),
            description_detail: "解説：掛布雅之".into(),
            division: None,
        }
    }

    #[test]
    fn due_string_joins_date_and_start_without_shifting() {
        assert_eq!(due_string(&record()), "6/14@18:00");

        let mut spaced = record();
        spaced.timetable = "13:00 - 16:00".into();
        assert_eq!(due_string(&spaced), "6/14@13:00");
    }

    #[test]
    fn content_tags_divisions() {
        let mut r = record();
        assert_eq!(content(&r), "NHK 6/14 (Sat)");
        r.division = Some(Division::Primary);
        assert_eq!(content(&r), "NHK 6/14 (Sat) [一軍]");
    }

    #[test]
    fn description_carries_url_last() {
        assert_eq!(
            description(&record()),
            "18:00-21:00\n解説：掛布雅之\nhttps://hanshintigers.jp/news/media/detail/1.html"
        );

        let mut bare = record();
        bare.description_detail.clear();
        assert_eq!(
            description(&bare),
            "18:00-21:00\nhttps://hanshintigers.jp/news/media/detail/1.html"
        );
    }

    #[test]
    fn placeholder_is_due_today() {
        let task = placeholder("42");
        assert_eq!(task.content, PLACEHOLDER_CONTENT);
        assert_eq!(task.due_string, "today");
        assert_eq!(task.description, None);
        assert_eq!(task.project_id, "42");
    }
}
