//! Document store read interface.
use chrono::NaiveDate;

use crate::document::{RawDocument, SiteCode};
use crate::error::Error;

/// Restricts a fetch to a site and a publication date range.
///
/// Documents without a parseable date are always let through:
/// it's up to the filtering engine to decide on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreFilter {
    pub site: SiteCode,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl StoreFilter {
    pub fn new(site: SiteCode) -> Self {
        Self {
            site,
            start_date: None,
            end_date: None,
        }
    }

    pub fn with_dates(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// `true` if the document's date is within bounds, or if it has no date.
    pub fn admits(&self, doc: &RawDocument) -> bool {
        match doc.publication_date() {
            Some(date) => {
                self.start_date.map_or(true, |start| date >= start)
                    && self.end_date.map_or(true, |end| date <= end)
            }
            None => true,
        }
    }
}

/// Result of a [DocumentStore::fetch].
#[derive(Debug, Default)]
pub struct Page {
    pub documents: Vec<RawDocument>,
    /// Stored entries that could not be read as documents.
    pub load_errors: usize,
    /// Offset of the next page, `None` when the site is exhausted.
    pub next_offset: Option<usize>,
}

/// Read access to a document database.
///
/// Offsets are opaque to callers: they only pass back `next_offset` values (or 0).
/// Implementations have to be callable from several threads at once.
pub trait DocumentStore: Send + Sync {
    /// Fetch at most `limit` entries of `filter.site`, starting at `offset`.
    fn fetch(&self, filter: &StoreFilter, offset: usize, limit: usize) -> Result<Page, Error>;

    /// Sites present in the store, sorted.
    fn sites(&self) -> Result<Vec<SiteCode>, Error>;
}
