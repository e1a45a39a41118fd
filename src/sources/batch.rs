//! Batched, resumable reading of a shard.
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{bounded, RecvTimeoutError};
use log::{debug, warn};

use super::{DocumentStore, Page, StoreFilter};
use crate::document::RawDocument;
use crate::error::Error;

/// A bounded, ordered run of documents of one shard.
#[derive(Debug)]
pub struct RawDocumentBatch {
    pub shard: String,
    pub documents: Vec<RawDocument>,
    /// Entries that couldn't be read as documents.
    pub load_errors: usize,
    /// Position right after this batch. Reopening the shard there resumes after it.
    pub cursor: usize,
}

/// Batches of one shard, from a database or from dumped files.
///
/// The cursor only moves forward when a fetch succeeds,
/// so that a failing [BatchSource::next_batch] can be retried (or the shard reopened at [BatchSource::cursor]).
pub enum BatchSource {
    Database {
        store: Arc<dyn DocumentStore>,
        filter: StoreFilter,
        batchsize: usize,
        timeout: Option<Duration>,
        cursor: Option<usize>,
    },
    Files {
        shard: String,
        paths: Vec<PathBuf>,
        batchsize: usize,
        cursor: usize,
    },
}

impl BatchSource {
    /// Current position, to be passed back when reopening the shard.
    pub fn cursor(&self) -> usize {
        match self {
            BatchSource::Database { cursor, .. } => cursor.unwrap_or(usize::MAX),
            BatchSource::Files { cursor, .. } => *cursor,
        }
    }

    /// Get the next non-empty batch, `None` when the shard is exhausted.
    pub fn next_batch(&mut self) -> Result<Option<RawDocumentBatch>, Error> {
        match self {
            BatchSource::Database {
                store,
                filter,
                batchsize,
                timeout,
                cursor,
            } => loop {
                let offset = match cursor {
                    Some(offset) => *offset,
                    None => return Ok(None),
                };
                let page = fetch(store, filter, offset, *batchsize, *timeout)?;
                *cursor = page.next_offset;

                if !page.documents.is_empty() || page.load_errors > 0 {
                    return Ok(Some(RawDocumentBatch {
                        shard: filter.site.to_string(),
                        documents: page.documents,
                        load_errors: page.load_errors,
                        cursor: page.next_offset.unwrap_or(usize::MAX),
                    }));
                }
            },
            BatchSource::Files {
                shard,
                paths,
                batchsize,
                cursor,
            } => {
                if *cursor >= paths.len() {
                    return Ok(None);
                }
                let end = (*cursor + *batchsize).min(paths.len());
                let mut documents = Vec::with_capacity(end - *cursor);
                let mut load_errors = 0;
                for path in &paths[*cursor..end] {
                    match read_document(path) {
                        Ok(doc) => documents.push(doc),
                        Err(e) => {
                            warn!("{}: could not load {:?}: {}", shard, path, e);
                            load_errors += 1;
                        }
                    }
                }
                *cursor = end;
                Ok(Some(RawDocumentBatch {
                    shard: shard.clone(),
                    documents,
                    load_errors,
                    cursor: end,
                }))
            }
        }
    }
}

/// Yields batches until the shard is exhausted or an error happens.
impl Iterator for BatchSource {
    type Item = Result<RawDocumentBatch, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_batch() {
            Ok(batch) => batch.map(Ok),
            Err(e) => {
                // don't loop forever on a failing shard
                match self {
                    BatchSource::Database { cursor, .. } => *cursor = None,
                    BatchSource::Files { cursor, paths, .. } => *cursor = paths.len(),
                }
                Some(Err(e))
            }
        }
    }
}

fn read_document(path: &Path) -> Result<RawDocument, Error> {
    let content = fs::read_to_string(path)?;
    let mut doc: RawDocument = serde_json::from_str(&content)?;
    doc.source_path = Some(path.to_path_buf());
    Ok(doc)
}

/// Fetch a page, giving up after `timeout`.
///
/// A timed out fetch keeps running in the background until the store returns, its result is dropped.
fn fetch(
    store: &Arc<dyn DocumentStore>,
    filter: &StoreFilter,
    offset: usize,
    limit: usize,
    timeout: Option<Duration>,
) -> Result<Page, Error> {
    let timeout = match timeout {
        Some(t) => t,
        None => return store.fetch(filter, offset, limit),
    };

    let (tx, rx) = bounded(1);
    let store = Arc::clone(store);
    let thread_filter = filter.clone();
    thread::spawn(move || {
        // receiver may be gone after a timeout
        let _ = tx.send(store.fetch(&thread_filter, offset, limit));
    });

    match rx.recv_timeout(timeout) {
        Ok(page) => page,
        Err(RecvTimeoutError::Timeout) => {
            debug!("{}: fetch at {} timed out", filter.site, offset);
            Err(Error::Timeout(format!(
                "{}: fetch at offset {} took more than {:?}",
                filter.site, offset, timeout
            )))
        }
        Err(RecvTimeoutError::Disconnected) => Err(Error::Store(format!(
            "{}: fetch at offset {} died",
            filter.site, offset
        ))),
    }
}
