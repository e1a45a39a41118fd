//! Run counters and summary.
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use log::error;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::filtering::RejectReason;

/// Name of the summary file, in the output root.
pub const SUMMARY_FILENAME: &str = "extraction_summary.json";

/// Counters shared by all the workers of a run.
#[derive(Debug, Default)]
pub struct Stats {
    seen: AtomicU64,
    accepted: AtomicU64,
    accepted_undated: AtomicU64,
    rejected: [AtomicU64; RejectReason::ALL.len()],
    load_errors: AtomicU64,
    normalization_failures: AtomicU64,
    written: AtomicU64,
    duplicates: AtomicU64,
    filename_collisions: AtomicU64,
    write_errors: AtomicU64,
    failed_shards: Mutex<Vec<String>>,
}

#[inline]
fn incr(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl Stats {
    pub fn seen(&self) {
        incr(&self.seen);
    }

    pub fn accepted(&self, undated: bool) {
        incr(&self.accepted);
        if undated {
            incr(&self.accepted_undated);
        }
    }

    pub fn rejected(&self, reason: RejectReason) {
        incr(&self.rejected[reason.index()]);
    }

    pub fn load_errors(&self, nb: usize) {
        self.load_errors.fetch_add(nb as u64, Ordering::Relaxed);
    }

    pub fn normalization_failure(&self) {
        incr(&self.normalization_failures);
    }

    pub fn written(&self) {
        incr(&self.written);
    }

    pub fn duplicate(&self) {
        incr(&self.duplicates);
    }

    pub fn filename_collision(&self) {
        incr(&self.filename_collisions);
    }

    pub fn write_error(&self) {
        incr(&self.write_errors);
    }

    pub fn failed_shard(&self, shard: &str) {
        match self.failed_shards.lock() {
            Ok(mut shards) => shards.push(shard.to_string()),
            Err(e) => error!("could not record failed shard {}: {}", shard, e),
        }
    }

    /// Snapshot of the counters.
    pub fn summary(&self, segmentation_soft_failures: u64, cancelled: bool) -> Summary {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        let mut failed_shards = match self.failed_shards.lock() {
            Ok(shards) => shards.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        failed_shards.sort();

        Summary {
            seen: load(&self.seen),
            accepted: load(&self.accepted),
            accepted_undated: load(&self.accepted_undated),
            rejected: RejectReason::ALL
                .iter()
                .map(|r| (r.as_str().to_string(), load(&self.rejected[r.index()])))
                .collect(),
            load_errors: load(&self.load_errors),
            normalization_failures: load(&self.normalization_failures),
            segmentation_soft_failures,
            written: load(&self.written),
            duplicates: load(&self.duplicates),
            filename_collisions: load(&self.filename_collisions),
            write_errors: load(&self.write_errors),
            failed_shards,
            cancelled,
        }
    }
}

/// What an extraction run did.
///
/// `seen == accepted + rejected + normalization_failures` for a run that went to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub seen: u64,
    pub accepted: u64,
    /// Accepted documents without a usable publication date (only when they are let through).
    pub accepted_undated: u64,
    /// Rejections per reason. Every reason is present, even with a zero count.
    pub rejected: BTreeMap<String, u64>,
    pub load_errors: u64,
    pub normalization_failures: u64,
    pub segmentation_soft_failures: u64,
    pub written: u64,
    pub duplicates: u64,
    /// Records not written because a different document had the same filename.
    #[serde(default)]
    pub filename_collisions: u64,
    pub write_errors: u64,
    pub failed_shards: Vec<String>,
    pub cancelled: bool,
}

impl Summary {
    pub fn rejected(&self, reason: RejectReason) -> u64 {
        self.rejected.get(reason.as_str()).copied().unwrap_or(0)
    }

    pub fn rejected_total(&self) -> u64 {
        self.rejected.values().sum()
    }

    /// `true` if some of the corpus may be missing.
    pub fn is_incomplete(&self) -> bool {
        self.cancelled || !self.failed_shards.is_empty() || self.write_errors > 0
    }

    /// Write as pretty JSON into `dir`.
    pub fn write_to(&self, dir: &Path) -> Result<(), Error> {
        let f = File::create(dir.join(SUMMARY_FILENAME))?;
        self.write_json(f)
    }

    fn write_json<W: Write>(&self, w: W) -> Result<(), Error> {
        let mut writer = BufWriter::new(w);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "seen:\t{}", self.seen)?;
        writeln!(f, "accepted:\t{} ({} undated)", self.accepted, self.accepted_undated)?;
        writeln!(f, "rejected:\t{}", self.rejected_total())?;
        for (reason, count) in self.rejected.iter().filter(|(_, c)| **c > 0) {
            writeln!(f, "  {}:\t{}", reason, count)?;
        }
        writeln!(f, "load errors:\t{}", self.load_errors)?;
        writeln!(f, "normalization failures:\t{}", self.normalization_failures)?;
        writeln!(f, "segmentation soft failures:\t{}", self.segmentation_soft_failures)?;
        writeln!(f, "written:\t{} ({} duplicates)", self.written, self.duplicates)?;
        if self.filename_collisions > 0 {
            writeln!(f, "filename collisions:\t{}", self.filename_collisions)?;
        }
        writeln!(f, "write errors:\t{}", self.write_errors)?;
        if !self.failed_shards.is_empty() {
            writeln!(f, "failed shards:\t{}", self.failed_shards.join(", "))?;
        }
        if self.cancelled {
            writeln!(f, "run was cancelled, output is incomplete")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_reason_reported() {
        let stats = Stats::default();
        stats.seen();
        stats.seen();
        stats.rejected(RejectReason::ExcludedContentType);
        stats.accepted(true);
        stats.failed_shard("swh_voaswahili");

        let summary = stats.summary(3, false);
        assert_eq!(summary.rejected.len(), RejectReason::ALL.len());
        assert_eq!(summary.rejected(RejectReason::ExcludedContentType), 1);
        assert_eq!(summary.rejected(RejectReason::MalformedDate), 0);
        assert_eq!(summary.accepted_undated, 1);
        assert_eq!(summary.segmentation_soft_failures, 3);
        assert!(summary.is_incomplete());
        assert!(summary.to_string().contains("excluded-content-type:\t1"));
    }

    #[test]
    fn written_summary() {
        let dir = tempfile::tempdir().unwrap();
        let summary = Stats::default().summary(0, true);
        summary.write_to(dir.path()).unwrap();

        let f = File::open(dir.path().join(SUMMARY_FILENAME)).unwrap();
        let read: Summary = serde_json::from_reader(f).unwrap();
        assert_eq!(read, summary);
    }

    struct Full;
    impl Write for Full {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "no space left"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_errors_are_reported() {
        let summary = Stats::default().summary(0, false);
        assert!(matches!(summary.write_json(Full), Err(Error::Io(_))));
    }
}
