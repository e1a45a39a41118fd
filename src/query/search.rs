//! Keyword search.
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use rayon::prelude::*;

use super::corpus::{ensure_dir, CorpusEntry, Source};
use crate::document::ContentType;
use crate::error::Error;

/// Look for `keyword` in `source`, writing matching paths to `output_dir/filename.txt`.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub source: PathBuf,
    pub output_dir: PathBuf,
    pub filename: String,
    pub keyword: String,
    pub content_types: Vec<ContentType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport {
    pub manifest: PathBuf,
    pub files_scanned: usize,
    /// Matching files, in traversal order. Those are the lines of the manifest.
    pub matches: Vec<PathBuf>,
    pub unreadable: usize,
}

impl SearchQuery {
    /// Manifest location. The `.txt` extension is forced.
    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir
            .join(Path::new(&self.filename).with_extension("txt"))
    }
}

enum Outcome {
    Match(PathBuf),
    NoMatch,
    Unreadable,
}

/// Case-insensitive substring search over titles and paragraphs.
///
/// Files are scanned in parallel, the manifest keeps the traversal order.
/// Manifest paths are absolute.
pub fn search(query: &SearchQuery) -> Result<SearchReport, Error> {
    let source = Source::open(&query.source, &query.content_types)?;
    let files = source.files()?;
    let needle = query.keyword.to_lowercase();

    let outcomes: Vec<Outcome> = files
        .par_iter()
        .map(|path| match CorpusEntry::from_path(path) {
            Ok(entry) if entry.mentions(&needle) => {
                Outcome::Match(fs::canonicalize(path).unwrap_or_else(|_| path.clone()))
            }
            Ok(_) => Outcome::NoMatch,
            Err(e) => {
                warn!("could not read {:?}: {}", path, e);
                Outcome::Unreadable
            }
        })
        .collect();

    let mut matches = Vec::new();
    let mut unreadable = 0;
    for outcome in outcomes {
        match outcome {
            Outcome::Match(path) => matches.push(path),
            Outcome::NoMatch => (),
            Outcome::Unreadable => unreadable += 1,
        }
    }

    ensure_dir(&query.output_dir)?;
    let manifest = query.manifest_path();
    let mut w = BufWriter::new(File::create(&manifest)?);
    for path in &matches {
        writeln!(w, "{}", path.display())?;
    }
    w.flush()?;

    info!(
        "{:?}: {} matches out of {} files",
        query.keyword,
        matches.len(),
        files.len()
    );
    Ok(SearchReport {
        manifest,
        files_scanned: files.len(),
        matches,
        unreadable,
    })
}
