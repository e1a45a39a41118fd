/*! Document sources

Raw documents come either from a document database ([DocumentStore]) or from a directory of dumped files ([Filemap]).
Both are exposed as a [DocumentSource], that is split in shards (one per site),
each shard being read as a stream of [RawDocumentBatch] through a [BatchSource].

The batch size only changes how documents are grouped, never which documents are read.
!*/
mod batch;
mod filemap;
mod jsonl;
mod memory;
mod store;

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use log::info;

use crate::document::SiteCode;
use crate::error::Error;

pub use batch::{BatchSource, RawDocumentBatch};
pub use filemap::Filemap;
pub use jsonl::JsonlStore;
pub use memory::MemoryStore;
pub use store::{DocumentStore, Page, StoreFilter};

/// Where raw documents are read from.
pub enum DocumentSource {
    Database {
        store: Arc<dyn DocumentStore>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        timeout: Option<Duration>,
    },
    Files(Filemap),
}

impl DocumentSource {
    pub fn database(store: Arc<dyn DocumentStore>) -> Self {
        DocumentSource::Database {
            store,
            start_date: None,
            end_date: None,
            timeout: None,
        }
    }

    /// Set the date range pushed down to store queries. No effect on files.
    pub fn with_dates(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        if let DocumentSource::Database {
            start_date,
            end_date,
            ..
        } = &mut self
        {
            *start_date = start;
            *end_date = end;
        }
        self
    }

    /// Set the store query timeout. No effect on files.
    pub fn with_timeout(mut self, t: Option<Duration>) -> Self {
        if let DocumentSource::Database { timeout, .. } = &mut self {
            *timeout = t;
        }
        self
    }

    /// Shards (sites) of the source, sorted.
    pub fn shards(&self) -> Result<Vec<String>, Error> {
        let shards: Vec<String> = match self {
            DocumentSource::Database { store, .. } => {
                store.sites()?.iter().map(SiteCode::to_string).collect()
            }
            DocumentSource::Files(filemap) => filemap.sites().map(str::to_string).collect(),
        };
        info!("{} shards", shards.len());
        Ok(shards)
    }

    /// Read `shard` by batches of `batchsize`, starting at `cursor` (0 for a full pass).
    pub fn open(&self, shard: &str, batchsize: usize, cursor: usize) -> Result<BatchSource, Error> {
        if batchsize == 0 {
            return Err(Error::Config("batchsize must be at least 1".to_string()));
        }
        match self {
            DocumentSource::Database {
                store,
                start_date,
                end_date,
                timeout,
            } => {
                let site: SiteCode = shard.parse()?;
                Ok(BatchSource::Database {
                    store: Arc::clone(store),
                    filter: StoreFilter::new(site).with_dates(*start_date, *end_date),
                    batchsize,
                    timeout: *timeout,
                    cursor: Some(cursor),
                })
            }
            DocumentSource::Files(filemap) => Ok(BatchSource::Files {
                shard: shard.to_string(),
                paths: filemap.paths(shard).to_vec(),
                batchsize,
                cursor,
            }),
        }
    }
}
