//! Detail-page enrichment: one sequential, paced fetch per record.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use onair_common::BroadcastRecord;
use onair_http::{HttpClient, HttpError, RequestOpts};

use crate::ScheduleError;
use crate::document::{Document, Query};
use crate::selectors;

/// Anything that can return the HTML body of an absolute URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String, HttpError>;
}

/// [`PageFetcher`] over the shared HTTP client.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: HttpClient,
}

impl HttpPageFetcher {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, HttpError> {
        self.client.get_text(url, RequestOpts::absolute()).await
    }
}

/// Fills `description_detail` from each record's detail page.
///
/// Fetches never overlap, and every fetch (successful or not) is followed
/// by the configured pause so the source site sees at most one request per
/// pacing interval.
pub struct DetailEnricher {
    fetcher: Arc<dyn PageFetcher>,
    pacing: Duration,
    note: Query,
}

impl DetailEnricher {
    pub fn new(fetcher: Arc<dyn PageFetcher>, pacing: Duration) -> Result<Self, ScheduleError> {
        Ok(Self {
            fetcher,
            pacing,
            note: selectors::detail_note()?,
        })
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Enrich one record. A failed fetch or a page without a synopsis leaves
    /// the detail empty; neither aborts the run.
    ///
    /// Returns whether a synopsis was found.
    pub async fn enrich(&self, record: &mut BroadcastRecord) -> bool {
        let url = record.description_url.clone();
        let fetched = self.fetcher.fetch_page(&url).await;
        let found = match fetched {
            Ok(html) => match extract_synopsis(&self.note, &html) {
                Some(synopsis) => {
                    record.description_detail = synopsis;
                    true
                }
                None => {
                    tracing::warn!(url = %url, "schedule.detail.no_synopsis");
                    record.description_detail.clear();
                    false
                }
            },
            Err(err) => {
                tracing::warn!(
                    url = %url,
                    status = ?err.status().map(|s| s.as_u16()),
                    error = %err,
                    "schedule.detail.fetch_failed"
                );
                record.description_detail.clear();
                false
            }
        };
        if !self.pacing.is_zero() {
            tokio::time::sleep(self.pacing).await;
        }
        found
    }

    /// Enrich every record in order. Returns how many fetches came back
    /// without a synopsis.
    pub async fn enrich_all(&self, records: &mut [BroadcastRecord]) -> usize {
        let mut missing = 0;
        for record in records.iter_mut() {
            if !self.enrich(record).await {
                missing += 1;
            }
        }
        missing
    }
}

/// Synopsis text of a detail page: the first note paragraph, line breaks
/// flattened to single spaces.
fn extract_synopsis(note: &Query, html: &str) -> Option<String> {
    let doc = Document::parse(html);
    let text = doc.query_first(note)?.rendered_text().replace('\n', " ");
    Some(text)
}
