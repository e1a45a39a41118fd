/*! Extraction pipeline

Drains a [DocumentSource] into a directory of normalized records.

```text
            shards                 batches (bounded)            records (bounded, one per writer)
[source] ---------> Q queriers ------------------> E extractors ---------------------------------> W writers -> dst/
```

- Queriers take shards (sites) from a shared list, and push their batches onto a bounded queue.
  When extractors fall behind, queriers block on that queue.
  Transient shard failures are retried from the last good cursor, then the shard is given up on.
- Extractors filter each document, normalize the accepted ones and route them to the writer owning
  their (site, content type).
- Writers are the only ones touching the filesystem.

The run ends when every shard is exhausted and every queue is drained.
A [CancelFlag] stops queriers between batches and extractors between documents.
!*/
mod stats;
mod writer;

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use log::{debug, error, info, warn};

use crate::config::ExtractionConfig;
use crate::document::SiteCode;
use crate::error::Error;
use crate::filtering::{DocumentFilter, FilterDecision, RejectReason};
use crate::pipelines::{CancelFlag, Pipeline};
use crate::segmentation::{SegmentationService, Segmenters};
use crate::sources::{DocumentSource, RawDocumentBatch};
use crate::transformers::{Normalizer, Transform};

pub use stats::{Stats, Summary, SUMMARY_FILENAME};
pub use writer::{route, RecordWriter, Written, WriterMessage, EMPTY_OUTPUT_FILENAME};

pub struct Extraction {
    source: DocumentSource,
    dst: PathBuf,
    config: ExtractionConfig,
    segmenters: Box<dyn SegmentationService>,
    cancel: CancelFlag,
}

impl Extraction {
    /// Date bounds and store timeout of `config` are pushed down to `source`.
    pub fn new(source: DocumentSource, dst: PathBuf, config: ExtractionConfig) -> Self {
        let source = source
            .with_dates(config.filter.start_date, config.filter.end_date)
            .with_timeout(config.store_timeout());
        Self {
            source,
            dst,
            config,
            segmenters: Box::new(Segmenters::with_defaults()),
            cancel: CancelFlag::new(),
        }
    }

    /// Replace the default segmentation models.
    pub fn with_segmenters(mut self, segmenters: Box<dyn SegmentationService>) -> Self {
        self.segmenters = segmenters;
        self
    }

    /// Use an externally controlled cancellation flag.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Flag that stops this run when cancelled.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    fn shards(&self) -> Result<Vec<String>, Error> {
        let shards: Vec<String> = self
            .source
            .shards()?
            .into_iter()
            .filter(|shard| match shard.parse::<SiteCode>() {
                Ok(site) => self.config.accepts_site(&site),
                // not a site code, can't check its language
                Err(_) => self.config.languages.is_none(),
            })
            .collect();
        Ok(shards)
    }

    /// Read every batch of `shard`, retrying transient failures from the last good cursor.
    fn query_shard(&self, shard: &str, batches: &Sender<RawDocumentBatch>) -> Result<(), Error> {
        let mut source = self.source.open(shard, self.config.batchsize, 0)?;
        let mut retries = 0;
        let mut nb_batches = 0;

        loop {
            if self.cancel.is_cancelled() {
                debug!("{}: cancelled after {} batches", shard, nb_batches);
                return Ok(());
            }

            match source.next_batch() {
                Ok(Some(batch)) => {
                    nb_batches += 1;
                    if batches.send(batch).is_err() {
                        return Err(Error::Custom("no extractor left".to_string()));
                    }
                }
                Ok(None) => {
                    info!("{}: done ({} batches)", shard, nb_batches);
                    return Ok(());
                }
                Err(e) if e.is_transient() && retries < self.config.max_shard_retries => {
                    retries += 1;
                    warn!(
                        "{}: {} (retry {}/{})",
                        shard, e, retries, self.config.max_shard_retries
                    );
                    thread::sleep(self.config.retry_backoff() * retries as u32);
                    source = self.source.open(shard, self.config.batchsize, source.cursor())?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn query(&self, shards: Receiver<String>, batches: Sender<RawDocumentBatch>, stats: &Stats) {
        for shard in shards.iter() {
            if self.cancel.is_cancelled() {
                break;
            }
            match self.query_shard(&shard, &batches) {
                Ok(()) => (),
                Err(e) if self.cancel.is_cancelled() => debug!("{}: stopped: {}", shard, e),
                Err(e) => {
                    error!("{}: shard failed: {}", shard, e);
                    stats.failed_shard(&shard);
                }
            }
        }
    }

    fn extract(
        &self,
        batches: Receiver<RawDocumentBatch>,
        writers: &[Sender<WriterMessage>],
        filter: &DocumentFilter,
        normalizer: &Normalizer,
        stats: &Stats,
    ) {
        let send = |message: WriterMessage| {
            let idx = message.route(writers.len());
            if writers[idx].send(message).is_err() {
                error!("writer {} is gone", idx);
                stats.write_error();
            }
        };

        for batch in batches.iter() {
            stats.load_errors(batch.load_errors);
            for doc in batch.documents.iter() {
                if self.cancel.is_cancelled() {
                    return;
                }
                stats.seen();

                match filter.decide(doc) {
                    FilterDecision::Accept => match normalizer.transform(doc) {
                        Ok(record) => {
                            stats.accepted(doc.publication_date().is_none());
                            send(WriterMessage::Record {
                                id: doc.id.clone(),
                                record,
                            });
                        }
                        Err(e) => {
                            warn!("{}: normalization failed: {}", doc.id, e);
                            stats.normalization_failure();
                        }
                    },
                    FilterDecision::Reject(reason) => {
                        debug!("{}: rejected ({})", doc.id, reason);
                        stats.rejected(reason);
                        if reason == RejectReason::EmptyOutput {
                            send(WriterMessage::EmptyOutput {
                                site: doc.site_code().to_string(),
                                content_type: doc.content_type,
                                marker: doc.marker().to_string(),
                            });
                        }
                    }
                }
            }
        }
    }

    fn prepare_dst(dst: &Path) -> Result<(), Error> {
        fs::create_dir_all(dst).map_err(|e| {
            Error::Config(format!("could not create output directory {:?}: {}", dst, e))
        })
    }
}

impl Pipeline<Summary> for Extraction {
    fn run(&self) -> Result<Summary, Error> {
        self.config.validate()?;
        Self::prepare_dst(&self.dst)?;

        let shards = self.shards()?;
        info!(
            "extracting {} shards with {} queriers, {} extractors, {} writers",
            shards.len(),
            self.config.n_queriers,
            self.config.n_extractors,
            self.config.n_writers
        );

        let stats = Stats::default();
        let filter = DocumentFilter::new(self.config.filter.clone());
        let normalizer = Normalizer::new(self.segmenters.as_ref());

        let (shard_tx, shard_rx) = unbounded();
        for shard in shards {
            // receiver is alive
            let _ = shard_tx.send(shard);
        }
        drop(shard_tx);

        let capacity = self.config.queue_capacity();
        let (batch_tx, batch_rx) = bounded(capacity);
        let (writer_txs, writer_rxs): (Vec<_>, Vec<_>) = (0..self.config.n_writers)
            .map(|_| bounded::<WriterMessage>(capacity))
            .unzip();

        let stats_ref = &stats;
        let filter = &filter;
        let normalizer = &normalizer;
        crossbeam::scope(|s| {
            for (id, rx) in writer_rxs.into_iter().enumerate() {
                let writer = RecordWriter::new(&self.dst);
                s.spawn(move |_| writer.run(id, rx, stats_ref));
            }

            for _ in 0..self.config.n_queriers {
                let shard_rx = shard_rx.clone();
                let batch_tx = batch_tx.clone();
                s.spawn(move |_| self.query(shard_rx, batch_tx, stats_ref));
            }

            for _ in 0..self.config.n_extractors {
                let batch_rx = batch_rx.clone();
                let writer_txs = writer_txs.clone();
                s.spawn(move |_| self.extract(batch_rx, &writer_txs, filter, normalizer, stats_ref));
            }

            // only workers hold channel ends now
            drop(batch_tx);
            drop(batch_rx);
            drop(writer_txs);
        })
        .map_err(|_| Error::Custom("an extraction worker panicked".to_string()))?;

        let summary = stats.summary(normalizer.soft_failures(), self.cancel.is_cancelled());
        summary.write_to(&self.dst)?;
        info!(
            "seen {}, accepted {}, rejected {}",
            summary.seen,
            summary.accepted,
            summary.rejected_total()
        );
        if summary.is_incomplete() {
            warn!("output in {:?} is incomplete", self.dst);
        }
        Ok(summary)
    }
}
