//! Schedule-page scraping for onair.
//!
//! - [`document`]: typed query layer over the HTML parser
//! - [`extract`]: sections and broadcast rows out of a schedule page
//! - [`gate`]: "only today" date gate
//! - [`filter`]: operator-preference inclusion filter
//! - [`enrich`]: paced detail-page synopsis fetches
//!
//! Parsed documents are not `Send`; callers fetch, then parse and extract
//! synchronously, then drop the document before the next `.await`.
use onair_http::HttpError;
use thiserror::Error;

pub mod document;
pub mod enrich;
pub mod extract;
pub mod filter;
pub mod gate;
mod selectors;

pub use document::{Document, Node, Query};
pub use enrich::{DetailEnricher, HttpPageFetcher, PageFetcher};
pub use extract::{Extractor, RowDefect, Section, resolve_detail_url};
pub use filter::{FilterOptions, InclusionFilter, SkipReason};
pub use gate::DateGate;

#[derive(Debug, Error)]
pub enum ScheduleError {
    /// The page no longer has the expected layout.
    #[error("schedule page structure changed: {0}")]
    Structural(String),
    #[error("invalid selector {selector:?}: {message}")]
    Selector {
        selector: &'static str,
        message: String,
    },
    #[error("invalid pattern {pattern:?}: {message}")]
    Pattern {
        pattern: &'static str,
        message: String,
    },
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: HttpError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_errors_name_the_pattern_not_a_selector() {
        let err = ScheduleError::Pattern {
            pattern: filter::NUMBERED_NETWORK_PATTERN,
            message: "unclosed group".into(),
        };
        let shown = err.to_string();
        assert!(shown.starts_with("invalid pattern"), "{shown}");
        assert!(shown.contains(r"J SPORTS \\d"), "{shown}");
        assert!(!shown.contains("selector"), "{shown}");
    }
}
