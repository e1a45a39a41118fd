//! Command line arguments and parameters management/parsing.
use std::path::PathBuf;

use chrono::NaiveDate;
use structopt::StructOpt;

use motext::config::{DatePolicy, ExtractionConfig};
use motext::error::Error;

#[derive(Debug, StructOpt)]
#[structopt(name = "motext", about = "multilingual news corpus tool.")]
/// Holds every command that is callable by the `motext` command.
pub enum Motext {
    #[structopt(about = "Extract documents from a document store (dump directory of <site>.jsonl[.gz])")]
    Fromdb(FromDb),
    #[structopt(about = "Extract documents from a directory of dumped json files")]
    Fromfiles(FromFiles),
    #[structopt(about = "Extract paragraphs, sentences or tokens of a corpus into text files")]
    Extract(Extract),
    #[structopt(about = "Search a corpus for a keyword, writing matching paths to a file")]
    Search(Search),
    #[structopt(about = "Bundle a corpus by site and compute checksums")]
    Package(Package),
    #[structopt(about = "Compute per site/content type statistics of a corpus")]
    Stats(Stats),
    #[structopt(about = "Print the JSON schema of corpus records")]
    Schema,
}

/// Options common to extraction runs. Set options override the configuration file.
#[derive(Debug, StructOpt)]
pub struct RunOptions {
    #[structopt(long = "config", parse(from_os_str), help = "JSON configuration file")]
    pub config: Option<PathBuf>,
    #[structopt(long = "start-date", help = "reject documents published before (YYYY-MM-DD)")]
    pub start_date: Option<NaiveDate>,
    #[structopt(long = "end-date", help = "reject documents published after (YYYY-MM-DD)")]
    pub end_date: Option<NaiveDate>,
    #[structopt(long = "batchsize", help = "documents per fetched batch (default 100)")]
    pub batchsize: Option<usize>,
    #[structopt(long = "n-queriers", short = "q", help = "number of query workers (default 1)")]
    pub n_queriers: Option<usize>,
    #[structopt(long = "n-extractors", short = "e", help = "number of extraction workers (default 1)")]
    pub n_extractors: Option<usize>,
    #[structopt(
        long = "languages",
        use_delimiter = true,
        help = "only extract these languages (ISO 639-3, comma separated)"
    )]
    pub languages: Vec<String>,
    #[structopt(long = "timeout", help = "store query timeout, in seconds")]
    pub timeout: Option<u64>,
    #[structopt(long = "retries", help = "retries of a failing shard (default 3)")]
    pub retries: Option<usize>,
    #[structopt(
        long = "accept-undated",
        help = "accept documents without a usable publication date"
    )]
    pub accept_undated: bool,
}

impl RunOptions {
    /// Defaults, then configuration file, then command line.
    pub fn config(&self) -> Result<ExtractionConfig, Error> {
        let mut config = match &self.config {
            Some(path) => ExtractionConfig::from_path(path)?,
            None => ExtractionConfig::default(),
        };

        if self.start_date.is_some() {
            config.filter.start_date = self.start_date;
        }
        if self.end_date.is_some() {
            config.filter.end_date = self.end_date;
        }
        if let Some(b) = self.batchsize {
            config.batchsize = b;
        }
        if let Some(q) = self.n_queriers {
            config.n_queriers = q;
        }
        if let Some(e) = self.n_extractors {
            config.n_extractors = e;
        }
        if !self.languages.is_empty() {
            config.languages = Some(self.languages.clone());
        }
        if self.timeout.is_some() {
            config.store_timeout_secs = self.timeout;
        }
        if let Some(r) = self.retries {
            config.max_shard_retries = r;
        }
        if self.accept_undated {
            config.filter.date_policy = DatePolicy::Accept;
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, StructOpt)]
pub struct FromDb {
    #[structopt(parse(from_os_str), help = "document store location")]
    pub store_root: PathBuf,
    #[structopt(parse(from_os_str), help = "destination corpus location")]
    pub dst: PathBuf,
    #[structopt(flatten)]
    pub run: RunOptions,
}

#[derive(Debug, StructOpt)]
pub struct FromFiles {
    #[structopt(parse(from_os_str), help = "dumped documents location")]
    pub inputdir: PathBuf,
    #[structopt(parse(from_os_str), help = "destination corpus location")]
    pub dst: PathBuf,
    #[structopt(
        long = "filemap",
        parse(from_os_str),
        help = "tab separated site/path file. Defaults to every json file of inputdir."
    )]
    pub filemap: Option<PathBuf>,
    #[structopt(flatten)]
    pub run: RunOptions,
}

#[derive(Debug, StructOpt)]
pub struct Extract {
    #[structopt(help = "paragraph, sentence or token (case insensitive)")]
    pub units: String,
    #[structopt(parse(from_os_str), help = "corpus directory or manifest file")]
    pub source: PathBuf,
    #[structopt(parse(from_os_str), help = "destination of text files")]
    pub output_dir: PathBuf,
    #[structopt(long = "num-files", default_value = "0", help = "number of files to extract (0: all)")]
    pub num_files: usize,
    #[structopt(
        long = "max-per-file",
        default_value = "0",
        help = "number of units per file (0: all)"
    )]
    pub max_per_file: usize,
    #[structopt(long = "types", default_value = "", help = "content types, comma separated")]
    pub types: String,
    #[structopt(long = "include-title")]
    pub include_title: bool,
    #[structopt(long = "include-authors")]
    pub include_authors: bool,
}

#[derive(Debug, StructOpt)]
pub struct Search {
    #[structopt(parse(from_os_str), help = "corpus directory or manifest file")]
    pub source: PathBuf,
    #[structopt(parse(from_os_str), help = "destination folder of the manifest")]
    pub output_dir: PathBuf,
    #[structopt(help = "manifest name (.txt is appended)")]
    pub filename: String,
    #[structopt(help = "keyword, case insensitive")]
    pub keyword: String,
    #[structopt(long = "types", default_value = "", help = "content types, comma separated")]
    pub types: String,
}

#[derive(Debug, StructOpt)]
#[structopt(
    about = "Bundle each site of a corpus into <site>.jsonl.gz and compute checksums.
Using --prune will delete excluded files and empty folders from src."
)]
pub struct Package {
    #[structopt(parse(from_os_str), help = "source corpus location")]
    pub src: PathBuf,
    #[structopt(parse(from_os_str), help = "destination of bundles")]
    pub dst: PathBuf,
    #[structopt(long = "prune", help = "delete excluded files from src")]
    pub prune: bool,
    #[structopt(long = "exclude-id", help = "exclude records with this filename (repeatable)")]
    pub exclude_id: Vec<String>,
}

#[derive(Debug, StructOpt)]
pub struct Stats {
    #[structopt(parse(from_os_str), help = "source corpus location")]
    pub src: PathBuf,
    #[structopt(parse(from_os_str), help = "destination csv file")]
    pub dst: PathBuf,
}

/// `0` means no limit.
pub fn limit(n: usize) -> Option<usize> {
    (n > 0).then_some(n)
}
