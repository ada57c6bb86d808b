//! Lazy iteration over a remote result set
//!
//! Pages are fetched on demand. Once a page is loaded, later pages are
//! requested through the server's result set identifier; if that request
//! fails, the original query is resubmitted at the same offset. Two failed
//! attempts in a row, or a server report that the result set is gone, end
//! in a hard failure.

use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use super::cursor::Cursor;
use super::request::{request_url, SearchParams};
use super::response::{FacetField, SearchPage};
use super::transport::PageTransport;
use crate::compiler::{render_sort_keys, SortKey};
use crate::error::{Result, SearchError};
use crate::metrics::SearchMetrics;
use crate::schema::FieldSchema;

/// Total attempts for one page: the continuation request plus one retry
pub const MAX_FETCH_ATTEMPTS: u32 = 2;

/// One position of the result set
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordSlot {
    /// Raw XML payload of the record
    Record(String),
    /// The page had no payload at this 0-based position
    Missing { position: u64 },
}

impl RecordSlot {
    pub fn record(&self) -> Option<&str> {
        match self {
            RecordSlot::Record(xml) => Some(xml),
            RecordSlot::Missing { .. } => None,
        }
    }
}

/// Iterator lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IterState {
    Unstarted,
    PageLoaded,
    Exhausted,
    /// The last fetch failed hard
    Failed,
}

/// Pull-based reader over an SRU result set
///
/// Single-owner: every call may block on a page fetch.
pub struct SruResultIterator<T: PageTransport> {
    transport: T,
    params: SearchParams,
    /// Start of the loaded page and the result set it belongs to
    cursor: Cursor,
    page: Vec<Option<String>>,
    next_index: u64,
    /// Fixed by the first successful fetch
    total: Option<u64>,
    facets: Vec<FacetField>,
    state: IterState,
    metrics: Option<Arc<SearchMetrics>>,
}

impl<T: PageTransport> SruResultIterator<T> {
    pub fn new(transport: T, params: SearchParams) -> Self {
        let cursor = Cursor::start(params.config.page_size);
        Self {
            transport,
            params,
            cursor,
            page: Vec::new(),
            next_index: 0,
            total: None,
            facets: Vec::new(),
            state: IterState::Unstarted,
            metrics: None,
        }
    }

    /// Sort by logical keys, resolved to physical sort fields
    pub fn with_sort_keys(mut self, keys: &[SortKey], schema: &FieldSchema) -> Self {
        self.params = self.params.with_sort_keys(render_sort_keys(keys, schema));
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<SearchMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Total number of records, fetching the first page if needed
    pub fn size(&mut self) -> Result<u64> {
        self.ensure_started()?;
        Ok(self.total.unwrap_or(0))
    }

    /// Check for another record, fetching the first page if needed
    pub fn has_next(&mut self) -> Result<bool> {
        self.ensure_started()?;
        Ok(self.next_index < self.total.unwrap_or(0))
    }

    /// Return the next record slot and advance by one
    ///
    /// The cursor advances even when the slot has no payload.
    pub fn next_record(&mut self) -> Result<RecordSlot> {
        self.ensure_started()?;
        let total = self.total.unwrap_or(0);
        if self.next_index >= total {
            self.state = IterState::Exhausted;
            return Err(SearchError::Exhausted);
        }

        let page_start = self.cursor.offset;
        if self.next_index < page_start || self.next_index >= page_start + self.page.len() as u64 {
            self.fetch_page(self.next_index)?;
        }

        let position = self.next_index;
        let slot = self
            .page
            .get((position - self.cursor.offset) as usize)
            .cloned()
            .flatten();
        self.next_index += 1;
        if self.next_index >= total {
            self.state = IterState::Exhausted;
        }

        match slot {
            Some(xml) => Ok(RecordSlot::Record(xml)),
            None => {
                error!(position = position + 1, "Search result is not available");
                if let Some(metrics) = &self.metrics {
                    metrics.record_missing();
                }
                Ok(RecordSlot::Missing { position })
            }
        }
    }

    /// 0-based index of the record the next call returns
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Total, if a page has been fetched
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn state(&self) -> IterState {
        self.state
    }

    /// Facet counts reported with the first page
    pub fn facets(&self) -> &[FacetField] {
        &self.facets
    }

    fn ensure_started(&mut self) -> Result<()> {
        if self.total.is_none() {
            self.fetch_page(0)?;
        }
        Ok(())
    }

    fn fetch_page(&mut self, offset: u64) -> Result<()> {
        let continuing = self.state == IterState::PageLoaded;
        let cursor = self.cursor.at(offset);
        let mut last_error = String::new();
        let mut last_diagnostic: Option<String> = None;

        for attempt in 0..MAX_FETCH_ATTEMPTS {
            let use_result_set = attempt == 0 && continuing;
            let url = request_url(&self.params, &cursor, use_result_set);
            info!(url = %url, attempt = attempt + 1, "Fetching results page");

            let started = Instant::now();
            let result = match self.transport.fetch(&url) {
                Ok(body) => SearchPage::parse(&body).map_err(|err| {
                    if let Some(uri) = super::response::first_diagnostic(&body) {
                        last_diagnostic = Some(uri);
                    }
                    err
                }),
                Err(err) => Err(err),
            };

            match result {
                Ok(page) => {
                    if let Some(metrics) = &self.metrics {
                        metrics.record_page(started.elapsed().as_secs_f64());
                    }
                    self.apply_page(cursor, page);
                    return Ok(());
                }
                Err(err) if !err.is_retriable() => {
                    error!(error = %err, "Result page fetch failed, not retrying");
                    self.fail();
                    return Err(err);
                }
                Err(err) => {
                    warn!(
                        attempt = attempt + 1,
                        error = %err,
                        "Error fetching results"
                    );
                    if let Some(metrics) = &self.metrics {
                        metrics.record_failed_attempt();
                    }
                    last_error = err.to_string();
                }
            }
        }

        error!(attempts = MAX_FETCH_ATTEMPTS, error = %last_error, "Giving up on result page");
        self.fail();
        Err(SearchError::FetchFailed {
            attempts: MAX_FETCH_ATTEMPTS,
            last_error,
            last_diagnostic,
        })
    }

    fn apply_page(&mut self, cursor: Cursor, page: SearchPage) {
        for diagnostic in &page.diagnostics {
            warn!(
                uri = %diagnostic.uri,
                message = diagnostic.message.as_deref().unwrap_or(""),
                "Server reported a diagnostic"
            );
        }

        match self.total {
            None => {
                self.total = Some(page.total);
                self.facets = page.facets;
            }
            Some(total) if total != page.total => {
                warn!(
                    known = total,
                    reported = page.total,
                    "Result count changed while paging, keeping the first count"
                );
            }
            Some(_) => {}
        }

        let result_set_id = page.result_set_id.or_else(|| cursor.result_set_id.clone());
        self.cursor = cursor.with_result_set(result_set_id);
        self.page = page.records;
        self.state = if self.next_index >= self.total.unwrap_or(0) {
            IterState::Exhausted
        } else {
            IterState::PageLoaded
        };
    }

    fn fail(&mut self) {
        if let Some(metrics) = &self.metrics {
            metrics.record_hard_failure();
        }
        self.state = IterState::Failed;
    }
}

impl<T: PageTransport> Iterator for SruResultIterator<T> {
    type Item = Result<RecordSlot>;

    /// Yields each slot; stops after the first hard failure
    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.state, IterState::Failed | IterState::Exhausted) {
            return None;
        }
        match self.has_next() {
            Ok(true) => Some(self.next_record()),
            Ok(false) => {
                self.state = IterState::Exhausted;
                None
            }
            Err(err) => Some(Err(err)),
        }
    }
}
