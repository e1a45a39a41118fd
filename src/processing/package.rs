/*! Packaging (prepping for distribution) utilities

Packaging is in three steps:
- First, entries of the extracted corpus matching an [ExclusionRule] are set aside (and deleted with `prune`, empty directories included),
- Then, the remaining records of each site are bundled into `<site>.jsonl.gz`, one record per line,
- Finally, we compute a sha384sum for each bundle, and write them into `checksums_sha384.txt`, _usually_ compatible with `sha384sum -c` implementations.
!*/
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use flate2::{write::GzEncoder, Compression};
use itertools::Itertools;
use lazy_static::lazy_static;
use log::{debug, error, info, warn};
use rayon::prelude::*;
use sha2::{Digest, Sha384};

use crate::error::Error;
use crate::filtering::RejectReason;

/// Name of the checksum file, in the destination folder.
pub const CHECKSUM_FILENAME: &str = "checksums_sha384.txt";

/// What part of a path a pattern is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Any directory or file name of the path.
    Component,
    /// Start of the file name.
    FilePrefix,
    /// File name without extension.
    FileStem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionRule {
    pub kind: PatternKind,
    pub pattern: String,
    pub reason: RejectReason,
}

impl ExclusionRule {
    pub fn new(kind: PatternKind, pattern: &str, reason: RejectReason) -> Self {
        Self {
            kind,
            pattern: pattern.to_string(),
            reason,
        }
    }

    /// `true` if `path` (relative to the corpus root) matches.
    pub fn matches(&self, path: &Path) -> bool {
        match self.kind {
            PatternKind::Component => path
                .components()
                .any(|c| c.as_os_str().to_string_lossy() == self.pattern),
            PatternKind::FilePrefix => path
                .file_name()
                .map_or(false, |f| f.to_string_lossy().starts_with(&self.pattern)),
            PatternKind::FileStem => path
                .file_stem()
                .map_or(false, |f| f.to_string_lossy() == self.pattern),
        }
    }
}

lazy_static! {
    static ref DEFAULT_RULES: Vec<ExclusionRule> = {
        use PatternKind::*;
        use RejectReason::*;
        vec![
            ExclusionRule::new(Component, "404 error", ExcludedContentType),
            ExclusionRule::new(Component, "eng-filtered-paragraphs", ExcludedPathPattern),
            ExclusionRule::new(Component, "lang_id_filtered", ExcludedPathPattern),
            ExclusionRule::new(Component, "poll", ExcludedContentType),
            ExclusionRule::new(Component, "index", ExcludedContentType),
            ExclusionRule::new(Component, "quiz", ExcludedContentType),
            ExclusionRule::new(Component, "other", ExcludedContentType),
            ExclusionRule::new(FilePrefix, "empty_output", EmptyOutput),
            ExclusionRule::new(Component, "publication_date_too_early", BeforeStartDate),
        ]
    };
}

/// Exclusion rule table. The first matching rule gives the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusions {
    rules: Vec<ExclusionRule>,
}

impl Default for Exclusions {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES.clone(),
        }
    }
}

impl Exclusions {
    /// Also exclude records whose file is named after one of `ids`.
    pub fn with_ids<'a>(mut self, ids: impl IntoIterator<Item = &'a str>) -> Self {
        self.rules.extend(
            ids.into_iter()
                .map(|id| ExclusionRule::new(PatternKind::FileStem, id, RejectReason::DenylistedId)),
        );
        self
    }

    pub fn rules(&self) -> &[ExclusionRule] {
        &self.rules
    }

    pub fn reason(&self, path: &Path) -> Option<RejectReason> {
        self.rules.iter().find(|r| r.matches(path)).map(|r| r.reason)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageReport {
    /// Excluded files per reason.
    pub excluded: BTreeMap<String, usize>,
    pub pruned_dirs: usize,
    pub bundles: Vec<PathBuf>,
    pub records: usize,
}

/// Files under `src`, relative to it, sorted.
fn corpus_files(src: &Path) -> Result<Vec<PathBuf>, Error> {
    let src_str = src
        .to_str()
        .ok_or_else(|| Error::Custom(format!("invalid source folder: {:?}", src)))?;
    let pattern = format!("{}/**/*", glob::Pattern::escape(src_str));

    let mut files = Vec::new();
    for path in glob::glob(&pattern)? {
        let path = path?;
        if path.is_file() {
            if let Ok(relative) = path.strip_prefix(src) {
                files.push(relative.to_path_buf());
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Recursively remove empty directories under `dir` (`dir` is kept).
fn remove_empty_dirs(dir: &Path) -> Result<usize, Error> {
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            removed += remove_empty_dirs(&path)?;
            if std::fs::read_dir(&path)?.next().is_none() {
                debug!("removing empty folder {:?}", path);
                std::fs::remove_dir(&path)?;
                removed += 1;
            }
        }
    }
    Ok(removed)
}

/// Site of a record: its first-level folder. Files at the root have none.
fn site_of(relative: &Path) -> Option<String> {
    let mut components = relative.components();
    let site = components.next()?;
    components.next()?;
    Some(site.as_os_str().to_string_lossy().into_owned())
}

/// Write every record of `files` as a line of `dst/<site>.jsonl.gz`. Returns the number of records.
fn bundle_site(src: &Path, dst: &Path, site: &str, files: &[PathBuf]) -> Result<usize, Error> {
    let bundle = dst.join(format!("{}.jsonl.gz", site));
    info!("[{}] bundling {} records into {:?}", site, files.len(), bundle);

    let mut enc = GzEncoder::new(File::create(&bundle)?, Compression::default());
    for file in files {
        let path = src.join(file);
        let record: serde_json::Value = serde_json::from_reader(BufReader::new(File::open(&path)?))
            .map_err(|e| Error::Custom(format!("{:?}: {}", path, e)))?;
        serde_json::to_writer(&mut enc, &record)?;
        enc.write_all(b"\n")?;
    }
    enc.finish()?;
    Ok(files.len())
}

/// compute the hash of the file pointed by the filepath by using [io::copy] between a file handler and the hasher.
#[inline]
fn get_hash(filepath: &Path, hasher: &mut Sha384) -> Result<String, Error> {
    let mut f = File::open(filepath)?;
    io::copy(&mut f, hasher)?;
    let result = format!("{:x}", hasher.finalize_reset());
    Ok(result)
}

/// Create the checksum file of the bundles in `dst`.
pub fn gen_checksum_file(dst: &Path, bundles: &[PathBuf]) -> Result<PathBuf, Error> {
    let mut hasher = Sha384::new();
    let checksum_filepath = dst.join(CHECKSUM_FILENAME);
    debug!("writing hashes to: {:?}", checksum_filepath);
    let mut checksum_file = File::create(&checksum_filepath)?;

    // write filenames and hashes in sha384sum -c compatible format.
    for bundle in bundles {
        let filename = bundle
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!("hashing {}", filename);
        writeln!(&mut checksum_file, "{} {}", get_hash(bundle, &mut hasher)?, filename)?;
    }

    Ok(checksum_filepath)
}

/// Package the extracted corpus at `src` into per-site bundles in `dst`.
///
/// With `prune`, excluded files are deleted from `src`, along with the folders they leave empty.
pub fn package(
    src: &Path,
    dst: &Path,
    exclusions: &Exclusions,
    prune: bool,
) -> Result<PackageReport, Error> {
    if !src.is_dir() {
        return Err(Error::Config(format!("source corpus {:?} does not exist", src)));
    }
    std::fs::create_dir_all(dst)?;

    let mut report = PackageReport::default();
    let mut kept = Vec::new();
    for file in corpus_files(src)? {
        match exclusions.reason(&file) {
            Some(reason) => {
                debug!("excluding {:?} ({})", file, reason);
                *report.excluded.entry(reason.to_string()).or_default() += 1;
                if prune {
                    std::fs::remove_file(src.join(&file))?;
                }
            }
            None => kept.push(file),
        }
    }
    if prune {
        report.pruned_dirs = remove_empty_dirs(src)?;
    }

    let sites = kept
        .into_iter()
        .filter(|f| f.extension().map_or(false, |e| e == "json"))
        .filter_map(|f| site_of(&f).map(|site| (site, f)))
        .into_group_map();

    let results: Vec<(String, Result<usize, Error>)> = sites
        .into_par_iter()
        .map(|(site, files)| {
            let result = bundle_site(src, dst, &site, &files);
            (site, result)
        })
        .collect();

    let mut errors = Vec::new();
    for (site, result) in results.into_iter().sorted_by(|a, b| a.0.cmp(&b.0)) {
        match result {
            Ok(nb) => {
                report.records += nb;
                report.bundles.push(dst.join(format!("{}.jsonl.gz", site)));
            }
            Err(e) => errors.push((site, e)),
        }
    }

    if !errors.is_empty() {
        for (site, error) in errors {
            error!("[{}] {:?}", site, error);
        }
        return Err(Error::Custom(
            "Errors occurred during packaging: see previous messages.".to_string(),
        ));
    }

    if report.bundles.is_empty() {
        warn!("no records to package in {:?}", src);
    }
    gen_checksum_file(dst, &report.bundles)?;
    Ok(report)
}
