/*! Run configuration

Every component gets its configuration explicitly, through [ExtractionConfig] or the [FilterConfig] it holds.
A configuration is built from defaults, an optional JSON file and command line flags (in that order of precedence),
and is validated before any worker starts.

```json
{
    "batchsize": 500,
    "n_queriers": 4,
    "n_extractors": 8,
    "filter": {
        "start_date": "2001-01-01",
        "date_policy": "reject",
        "denylisted_ids": ["5f1d0a"]
    }
}
```
!*/
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::document::{ContentType, SiteCode};
use crate::error::Error;

lazy_static! {
    /// Wire services whose content can't be redistributed.
    static ref RESTRICTED_BYLINES: Vec<&'static str> = vec![
        "AP",
        "Associated Press",
        "AFP",
        "Agence France-Presse",
        "Reuters",
    ];

    /// Directories left by earlier filtering passes over dumped documents.
    static ref EXCLUDED_PATH_PATTERNS: Vec<&'static str> = vec![
        "eng-filtered-paragraphs",
        "lang_id_filtered",
        "publication_date_too_early",
    ];
}

/// What to do with documents that have no usable publication date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePolicy {
    /// Reject as `malformed-date`.
    Reject,
    /// Accept, counting them separately in the run summary.
    Accept,
}

/// Filter engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub excluded_content_types: HashSet<ContentType>,
    /// Directory names that mark a dumped document as excluded.
    pub excluded_path_patterns: Vec<String>,
    pub denylisted_ids: HashSet<String>,
    pub restricted_bylines: Vec<String>,
    /// Bodies that can't be tokenized and have at most this many characters are empty.
    pub max_stub_chars: usize,
    /// A body made of a single sentence needs at least this many tokens.
    pub min_sentence_tokens: usize,
    pub date_policy: DatePolicy,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            excluded_content_types: [
                ContentType::NotFound,
                ContentType::Index,
                ContentType::Poll,
                ContentType::Quiz,
                ContentType::Other,
            ]
            .into_iter()
            .collect(),
            excluded_path_patterns: EXCLUDED_PATH_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            denylisted_ids: HashSet::new(),
            restricted_bylines: RESTRICTED_BYLINES.iter().map(|b| b.to_string()).collect(),
            max_stub_chars: 20,
            min_sentence_tokens: 10,
            date_policy: DatePolicy::Reject,
            start_date: None,
            end_date: None,
        }
    }
}

/// Extraction run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Number of documents per fetched batch. Has no effect on the output.
    pub batchsize: usize,
    pub n_queriers: usize,
    pub n_extractors: usize,
    pub n_writers: usize,
    /// Capacity of the batch queue. Defaults to twice the number of extractors.
    pub queue_capacity: Option<usize>,
    /// Only process sites whose language is in this list.
    pub languages: Option<Vec<String>>,
    pub store_timeout_secs: Option<u64>,
    pub max_shard_retries: usize,
    pub retry_backoff_ms: u64,
    pub filter: FilterConfig,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            batchsize: 100,
            n_queriers: 1,
            n_extractors: 1,
            n_writers: 2,
            queue_capacity: None,
            languages: None,
            store_timeout_secs: None,
            max_shard_retries: 3,
            retry_backoff_ms: 500,
            filter: FilterConfig::default(),
        }
    }
}

impl ExtractionConfig {
    /// Load a configuration from a JSON file. Missing keys keep their default value.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let f = File::open(path).map_err(|e| {
            Error::Config(format!("could not open configuration {:?}: {}", path, e))
        })?;
        Ok(serde_json::from_reader(BufReader::new(f))?)
    }

    /// Check that the configuration makes sense.
    pub fn validate(&self) -> Result<(), Error> {
        if self.batchsize == 0 {
            return Err(Error::Config("batchsize must be at least 1".to_string()));
        }
        if self.n_queriers == 0 || self.n_extractors == 0 || self.n_writers == 0 {
            return Err(Error::Config(
                "worker counts must be at least 1".to_string(),
            ));
        }
        if self.queue_capacity == Some(0) {
            return Err(Error::Config("queue capacity must be at least 1".to_string()));
        }
        if let (Some(start), Some(end)) = (self.filter.start_date, self.filter.end_date) {
            if start > end {
                return Err(Error::Config(format!(
                    "start date {start} is after end date {end}"
                )));
            }
        }
        Ok(())
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(2 * self.n_extractors)
    }

    pub fn store_timeout(&self) -> Option<Duration> {
        self.store_timeout_secs.map(Duration::from_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Whether `site` passes the language allowlist.
    pub fn accepts_site(&self, site: &SiteCode) -> bool {
        match &self.languages {
            Some(langs) => langs.iter().any(|l| l == site.iso()),
            None => true,
        }
    }
}
