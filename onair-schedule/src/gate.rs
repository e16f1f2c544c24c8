//! "Only today" gate: a section is processed only when its published
//! month/day equals the current local date.
use chrono::{DateTime, Datelike, FixedOffset, Offset, Utc};
use onair_common::parse_month_day;

#[derive(Debug, Clone, Copy)]
pub struct DateGate {
    enabled: bool,
    offset: FixedOffset,
}

impl DateGate {
    pub fn new(enabled: bool, offset: FixedOffset) -> Self {
        Self { enabled, offset }
    }

    /// A gate that admits everything.
    pub fn open() -> Self {
        Self {
            enabled: false,
            offset: Utc.fix(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether a section dated `published` may be processed at `now`.
    ///
    /// Unparseable dates never match while the gate is on.
    pub fn admits(&self, published: &str, now: DateTime<Utc>) -> bool {
        if !self.enabled {
            return true;
        }
        let local = now.with_timezone(&self.offset);
        parse_month_day(published) == Some((local.month(), local.day()))
    }
}
