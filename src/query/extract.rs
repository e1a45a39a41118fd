/*! Unit extraction

Writes one text file per record, in `output_dir/<content type>/<filename>.txt`:

```text
Title                       (--include-title)
Author 1                    (--include-authors)
Author 2

unit 1
unit 2
...
```

Paragraphs are followed by a blank line. Sentences and tokens are one per line,
with a blank line between paragraphs when the record groups them by paragraph.
Records without sentences (or tokens) fall back to paragraphs.
!*/
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::corpus::{ensure_dir, parent_name, CorpusEntry, SentenceField, Source, TokenField};
use super::Unit;
use crate::document::ContentType;
use crate::error::Error;

/// Used when neither the record nor its location tell its content type.
const UNKNOWN_CONTENT_TYPE: &str = "unknown";

#[derive(Debug, Clone)]
pub struct ExtractJob {
    pub unit: Unit,
    pub source: PathBuf,
    pub output_dir: PathBuf,
    /// Number of input files to process.
    pub num_files: Option<usize>,
    /// Number of units kept per file, the first ones.
    pub max_per_file: Option<usize>,
    pub content_types: Vec<ContentType>,
    pub include_title: bool,
    pub include_authors: bool,
}

impl ExtractJob {
    pub fn new(unit: Unit, source: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            unit,
            source,
            output_dir,
            num_files: None,
            max_per_file: None,
            content_types: Vec::new(),
            include_title: false,
            include_authors: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractReport {
    pub files_read: usize,
    pub files_written: usize,
    pub units_written: usize,
    /// Files that had to fall back to paragraphs.
    pub degraded: usize,
    pub unreadable: usize,
}

/// Units of a record, grouped.
struct Units {
    groups: Vec<Vec<String>>,
    /// blank line after each group
    separated: bool,
    degraded: bool,
}

impl Units {
    fn paragraphs(entry: &CorpusEntry, degraded: bool) -> Self {
        Self {
            groups: entry.paragraphs.iter().map(|p| vec![p.clone()]).collect(),
            separated: true,
            degraded,
        }
    }

    fn of(entry: &CorpusEntry, unit: Unit) -> Self {
        match (unit, &entry.sentences, &entry.tokens) {
            (Unit::Sentences, Some(SentenceField::Flat(s)), _) => Self {
                groups: vec![s.clone()],
                separated: false,
                degraded: false,
            },
            (Unit::Sentences, Some(SentenceField::Nested(s)), _) => Self {
                groups: s.clone(),
                separated: true,
                degraded: false,
            },
            (Unit::Tokens, _, Some(TokenField::Flat(t))) => Self {
                groups: vec![t.iter().map(|s| s.join(" ")).collect()],
                separated: false,
                degraded: false,
            },
            (Unit::Tokens, _, Some(TokenField::Nested(t))) => Self {
                groups: t
                    .iter()
                    .map(|p| p.iter().map(|s| s.join(" ")).collect())
                    .collect(),
                separated: true,
                degraded: false,
            },
            (Unit::Paragraphs, _, _) => Self::paragraphs(entry, false),
            _ => Self::paragraphs(entry, true),
        }
    }
}

/// Write the header and at most `max` units of `entry` to `w`. Returns the number of units written.
fn write_entry<W: Write>(
    w: &mut W,
    entry: &CorpusEntry,
    units: &Units,
    job: &ExtractJob,
) -> Result<usize, Error> {
    let print_title = job.include_title && !entry.title().is_empty();
    let print_authors = job.include_authors && !entry.authors.is_empty();
    if print_title {
        writeln!(w, "{}", entry.title())?;
    }
    if print_authors {
        for author in &entry.authors {
            writeln!(w, "{}", author)?;
        }
    }
    if print_title || print_authors {
        writeln!(w)?;
    }

    let full = |written: usize| job.max_per_file.map_or(false, |max| written >= max);
    let mut written = 0;
    for group in &units.groups {
        for unit in group {
            if full(written) {
                return Ok(written);
            }
            writeln!(w, "{}", unit)?;
            written += 1;
        }
        // no trailing separator once the limit is reached
        if full(written) {
            return Ok(written);
        }
        if units.separated {
            writeln!(w)?;
        }
    }
    Ok(written)
}

fn output_path(output_dir: &Path, path: &Path, entry: &CorpusEntry) -> PathBuf {
    let content_type = entry
        .content_type
        .clone()
        .or_else(|| parent_name(path))
        .unwrap_or_else(|| UNKNOWN_CONTENT_TYPE.to_string());
    let filename = entry.filename.clone().unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    output_dir
        .join(content_type)
        .join(format!("{}.txt", filename))
}

/// Extract units of the first `num_files` records of the job's source.
///
/// Files beyond `num_files` are not opened.
pub fn extract(job: &ExtractJob) -> Result<ExtractReport, Error> {
    let source = Source::open(&job.source, &job.content_types)?;
    let mut files = source.files()?;
    if let Some(n) = job.num_files {
        files.truncate(n);
    }
    ensure_dir(&job.output_dir)?;

    let mut report = ExtractReport::default();
    for path in &files {
        report.files_read += 1;
        let entry = match CorpusEntry::from_path(path) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("could not read {:?}: {}", path, e);
                report.unreadable += 1;
                continue;
            }
        };

        let units = Units::of(&entry, job.unit);
        if units.degraded {
            debug!("{:?} has no {}, using paragraphs", path, job.unit);
            report.degraded += 1;
        }

        let dst = output_path(&job.output_dir, path, &entry);
        if let Some(parent) = dst.parent() {
            ensure_dir(parent)?;
        }
        let mut w = BufWriter::new(File::create(&dst)?);
        report.units_written += write_entry(&mut w, &entry, &units, job)?;
        w.flush()?;
        report.files_written += 1;
    }

    info!(
        "extracted {} {} from {} files into {:?}",
        report.units_written, job.unit, report.files_written, job.output_dir
    );
    Ok(report)
}
