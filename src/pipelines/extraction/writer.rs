/*! Record writers

Each (site, content type) pair is owned by exactly one writer, chosen by hashing the pair ([route]).
Writers are the only ones touching the output directory, so no file locking is needed.

Layout:
```text
dst/
├── extraction_summary.json
└── swh_voaswahili/
    ├── article/
    │   ├── empty_output.txt
    │   └── <filename>.json
    └── video/
        └── <filename>.json
```
!*/
use std::collections::{HashMap, HashSet};
use std::fs::{File, OpenOptions};
use std::hash::Hasher;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crossbeam::channel::Receiver;
use log::{debug, error, info, warn};
use twox_hash::XxHash64;

use super::stats::Stats;
use crate::document::{ContentType, NormalizedRecord};
use crate::error::Error;

/// Lists the documents rejected for having no body.
pub const EMPTY_OUTPUT_FILENAME: &str = "empty_output.txt";

/// What extractors send to writers.
#[derive(Debug)]
pub enum WriterMessage {
    /// A record, with the id of the document it comes from.
    Record { id: String, record: NormalizedRecord },
    /// A document of this site/content type had nothing to write.
    EmptyOutput {
        site: String,
        content_type: ContentType,
        marker: String,
    },
}

impl WriterMessage {
    fn key(&self) -> (&str, ContentType) {
        match self {
            WriterMessage::Record { record, .. } => (record.site(), record.content_type()),
            WriterMessage::EmptyOutput {
                site, content_type, ..
            } => (site.as_str(), *content_type),
        }
    }

    /// Index of the writer owning this message's (site, content type).
    pub fn route(&self, nb_writers: usize) -> usize {
        let (site, content_type) = self.key();
        route(site, content_type, nb_writers)
    }
}

/// Deterministic writer index for a (site, content type).
pub fn route(site: &str, content_type: ContentType, nb_writers: usize) -> usize {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(site.as_bytes());
    hasher.write_u8(0xff);
    hasher.write(content_type.as_str().as_bytes());
    (hasher.finish() % nb_writers.max(1) as u64) as usize
}

fn hash_key(parts: &[&str]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    for part in parts {
        hasher.write(part.as_bytes());
        hasher.write_u8(0xff);
    }
    hasher.finish()
}

/// Outcome of [RecordWriter::write].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Written {
    New,
    Duplicate,
    /// Another document already got this filename.
    Collision,
}

/// Writes records under `root`.
pub struct RecordWriter {
    root: PathBuf,
    /// already written (site, content type, filename), with the hash of the document id.
    written: HashMap<u64, u64>,
    /// directories created during this run.
    dirs: HashSet<PathBuf>,
    /// empty output files opened during this run.
    markers: HashSet<PathBuf>,
}

impl RecordWriter {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            written: HashMap::new(),
            dirs: HashSet::new(),
            markers: HashSet::new(),
        }
    }

    fn dir(&mut self, site: &str, content_type: ContentType) -> Result<PathBuf, Error> {
        let dir = self.root.join(site).join(content_type.as_str());
        if !self.dirs.contains(&dir) {
            std::fs::create_dir_all(&dir)?;
            self.dirs.insert(dir.clone());
        }
        Ok(dir)
    }

    /// Write `record` of document `id`.
    ///
    /// Only the first record of a (site, content type, filename) is written.
    /// A later one is a duplicate if it comes from the same document, a collision otherwise.
    pub fn write(&mut self, id: &str, record: &NormalizedRecord) -> Result<Written, Error> {
        let key = hash_key(&[
            record.site(),
            record.content_type().as_str(),
            record.filename(),
        ]);
        let id_hash = hash_key(&[id]);
        match self.written.get(&key) {
            Some(first) if *first == id_hash => {
                debug!("{}: duplicate {}", record.site(), id);
                return Ok(Written::Duplicate);
            }
            Some(_) => {
                warn!(
                    "{}: {} maps to {}.json, already written by another document, skipping",
                    record.site(),
                    id,
                    record.filename()
                );
                return Ok(Written::Collision);
            }
            None => (),
        }

        let mut path = self.dir(record.site(), record.content_type())?;
        path.push(format!("{}.json", record.filename()));
        let mut w = BufWriter::new(File::create(&path)?);
        serde_json::to_writer(&mut w, record)?;
        w.flush()?;

        self.written.insert(key, id_hash);
        Ok(Written::New)
    }

    /// Append `marker` to the empty output list of (site, content type).
    ///
    /// The list is truncated the first time it's written to in a run, so that reruns don't accumulate markers.
    pub fn mark_empty(
        &mut self,
        site: &str,
        content_type: ContentType,
        marker: &str,
    ) -> Result<(), Error> {
        let path = self.dir(site, content_type)?.join(EMPTY_OUTPUT_FILENAME);
        let first = self.markers.insert(path.clone());
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(first)
            .append(!first)
            .open(&path)?;
        writeln!(f, "{}", marker)?;
        Ok(())
    }

    /// Consume messages until every sender is gone.
    pub fn run(mut self, id: usize, messages: Receiver<WriterMessage>, stats: &Stats) {
        for message in messages.iter() {
            let result = match &message {
                WriterMessage::Record { id, record } => {
                    self.write(id, record).map(|written| match written {
                        Written::New => stats.written(),
                        Written::Duplicate => stats.duplicate(),
                        Written::Collision => stats.filename_collision(),
                    })
                }
                WriterMessage::EmptyOutput {
                    site,
                    content_type,
                    marker,
                } => self.mark_empty(site, *content_type, marker),
            };

            if let Err(e) = result {
                let (site, content_type) = message.key();
                error!("[writer {}] {}/{}: {}", id, site, content_type, e);
                stats.write_error();
            }
        }
        info!("[writer {}] done ({} records)", id, self.written.len());
    }
}
