//! # motext
//!
//! Builds a multilingual news text corpus from a document store or from dumped documents,
//! and queries the result.
//!
//! ## Getting started
//!
//! ```sh
//! motext 0.1.0
//! multilingual news corpus tool.
//!
//! USAGE:
//!     motext <SUBCOMMAND>
//!
//! SUBCOMMANDS:
//!     extract      Extract paragraphs, sentences or tokens of a corpus into text files
//!     fromdb       Extract documents from a document store
//!     fromfiles    Extract documents from a directory of dumped json files
//!     help         Prints this message or the help of the given subcommand(s)
//!     package      Bundle a corpus by site and compute checksums
//!     schema       Print the JSON schema of corpus records
//!     search       Search a corpus for a keyword, writing matching paths to a file
//!     stats        Compute per site/content type statistics of a corpus
//! ```
//!
//! Logging is configured with `RUST_LOG` (e.g. `RUST_LOG=motext=info`).
//!
//! Interrupting `fromdb` or `fromfiles` (Ctrl-C) stops the run after the documents in flight,
//! keeping what has been written and printing a summary of the cancelled run.
use std::path::PathBuf;
use std::sync::Arc;

use structopt::StructOpt;

use motext::config::ExtractionConfig;
use motext::document::{ContentType, NormalizedRecord};
use motext::error::Error;
use motext::pipelines::{Extraction, Pipeline};
use motext::processing::{self, Exclusions};
use motext::query::{self, ExtractJob, SearchQuery, Unit};
use motext::sources::{DocumentSource, Filemap, JsonlStore};

#[macro_use]
extern crate log;

mod cli;

fn run_extraction(
    source: DocumentSource,
    dst: PathBuf,
    config: ExtractionConfig,
) -> Result<(), Error> {
    let p = Extraction::new(source, dst, config);
    if let Err(e) = p.cancel_flag().cancel_on_interrupt() {
        warn!("{}, Ctrl-C will not stop the run cleanly", e);
    }
    let summary = p.run()?;
    print!("{}", summary);
    Ok(())
}

fn main() -> Result<(), Error> {
    env_logger::init();

    let opt = cli::Motext::from_args();
    debug!("cli args\n{:#?}", opt);

    match opt {
        cli::Motext::Fromdb(c) => {
            let config = c.run.config()?;
            let store = JsonlStore::open(&c.store_root)?;
            run_extraction(DocumentSource::database(Arc::new(store)), c.dst, config)?;
        }

        cli::Motext::Fromfiles(c) => {
            let config = c.run.config()?;
            let filemap = match &c.filemap {
                Some(path) => Filemap::from_path(path, &c.inputdir)?,
                None => Filemap::from_dir(&c.inputdir)?,
            };
            run_extraction(DocumentSource::Files(filemap), c.dst, config)?;
        }

        cli::Motext::Extract(e) => {
            let unit: Unit = e.units.parse()?;
            let mut job = ExtractJob::new(unit, e.source, e.output_dir);
            job.num_files = cli::limit(e.num_files);
            job.max_per_file = cli::limit(e.max_per_file);
            job.content_types = ContentType::parse_list(&e.types)?;
            job.include_title = e.include_title;
            job.include_authors = e.include_authors;

            let report = query::extract(&job)?;
            println!(
                "{} {} written to {} files ({} fell back to paragraphs, {} unreadable)",
                report.units_written,
                unit,
                report.files_written,
                report.degraded,
                report.unreadable
            );
        }

        cli::Motext::Search(s) => {
            let q = SearchQuery {
                source: s.source,
                output_dir: s.output_dir,
                filename: s.filename,
                keyword: s.keyword,
                content_types: ContentType::parse_list(&s.types)?,
            };
            let report = query::search(&q)?;
            println!(
                "{} matches out of {} files, written to {:?}",
                report.matches.len(),
                report.files_scanned,
                report.manifest
            );
        }

        cli::Motext::Package(p) => {
            let exclusions = Exclusions::default().with_ids(p.exclude_id.iter().map(String::as_str));
            let report = processing::package(&p.src, &p.dst, &exclusions, p.prune)?;
            for (reason, nb) in &report.excluded {
                info!("excluded {} files ({})", nb, reason);
            }
            println!(
                "{} records in {} bundles, {} folders pruned",
                report.records,
                report.bundles.len(),
                report.pruned_dirs
            );
        }

        cli::Motext::Stats(s) => {
            let rows = processing::stats(&s.src, &s.dst)?;
            println!("{} site/content type pairs written to {:?}", rows.len(), s.dst);
        }

        cli::Motext::Schema => {
            let schema = schemars::schema_for!(NormalizedRecord);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    };

    Ok(())
}
