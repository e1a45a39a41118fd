//! Corpus records and their discovery.
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Deserialize;

use crate::document::ContentType;
use crate::error::Error;
use crate::pipelines::extraction::SUMMARY_FILENAME;

/// Sentences of a record: flat, or grouped by paragraph.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SentenceField {
    Flat(Vec<String>),
    Nested(Vec<Vec<String>>),
}

/// Tokens of a record: one list per sentence, possibly grouped by paragraph.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TokenField {
    Flat(Vec<Vec<String>>),
    Nested(Vec<Vec<Vec<String>>>),
}

/// A record as read back from the corpus.
///
/// More lenient than [crate::document::NormalizedRecord], so that older corpora can be read as well.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CorpusEntry {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default)]
    pub sentences: Option<SentenceField>,
    #[serde(default)]
    pub tokens: Option<TokenField>,
}

impl CorpusEntry {
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let f = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(f))?)
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    /// `true` if title or body contains `needle`, which has to be lowercase.
    pub fn mentions(&self, needle: &str) -> bool {
        self.title().to_lowercase().contains(needle)
            || self
                .paragraphs
                .iter()
                .any(|p| p.to_lowercase().contains(needle))
    }
}

/// Where records are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Every `*.json` file under a directory, optionally restricted to content type directories.
    Directory {
        root: PathBuf,
        content_types: Vec<ContentType>,
    },
    /// A text file listing record paths, one per line.
    Manifest(PathBuf),
}

impl Source {
    /// Directory or manifest, depending on what `path` is.
    pub fn open(path: &Path, content_types: &[ContentType]) -> Result<Self, Error> {
        if path.is_dir() {
            Ok(Source::Directory {
                root: path.to_path_buf(),
                content_types: content_types.to_vec(),
            })
        } else if path.is_file() {
            if !content_types.is_empty() {
                warn!("content types are ignored when reading from a manifest");
            }
            Ok(Source::Manifest(path.to_path_buf()))
        } else {
            Err(Error::Config(format!("source {:?} does not exist", path)))
        }
    }

    /// Record paths, in traversal (or manifest) order.
    pub fn files(&self) -> Result<Vec<PathBuf>, Error> {
        match self {
            Source::Directory {
                root,
                content_types,
            } => {
                let root_str = root
                    .to_str()
                    .ok_or_else(|| Error::Config(format!("invalid source: {:?}", root)))?;
                let pattern = format!("{}/**/*.json", glob::Pattern::escape(root_str));
                let mut files = glob::glob(&pattern)?.collect::<Result<Vec<_>, _>>()?;
                // run summaries are not records
                files.retain(|f| f.file_name().map_or(true, |n| n != SUMMARY_FILENAME));
                files.sort();
                if !content_types.is_empty() {
                    files.retain(|f| in_content_types(f, content_types));
                }
                debug!("{} files under {:?}", files.len(), root);
                Ok(files)
            }
            Source::Manifest(path) => {
                let f = File::open(path).map_err(|e| {
                    Error::Config(format!("could not read manifest {:?}: {}", path, e))
                })?;
                let mut files = Vec::new();
                for line in BufReader::new(f).lines() {
                    let line = line?;
                    let line = line.trim_end_matches(['\r', '\n']);
                    if !line.trim().is_empty() {
                        files.push(PathBuf::from(line));
                    }
                }
                Ok(files)
            }
        }
    }
}

/// `true` if the parent directory of `path` is named after one of `content_types`.
fn in_content_types(path: &Path, content_types: &[ContentType]) -> bool {
    path.parent()
        .and_then(Path::file_name)
        .map(|name| {
            let name = name.to_string_lossy();
            content_types.iter().any(|ct| ct.as_str() == name)
        })
        .unwrap_or(false)
}

/// Name of the parent directory, used when a record lacks its content type.
pub(crate) fn parent_name(path: &Path) -> Option<String> {
    path.parent()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
}

/// Create `dir` and its parents.
pub(crate) fn ensure_dir(dir: &Path) -> Result<(), Error> {
    fs::create_dir_all(dir).map_err(|e| {
        Error::Config(format!("could not create output directory {:?}: {}", dir, e))
    })
}
