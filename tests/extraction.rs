use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use motext::config::ExtractionConfig;
use motext::document::{ContentType, NormalizedRecord, RawDocument, SiteCode};
use motext::error::Error;
use motext::filtering::RejectReason;
use motext::pipelines::{CancelFlag, Extraction, Pipeline, Summary};
use motext::sources::{DocumentSource, DocumentStore, Filemap, JsonlStore, MemoryStore, Page, StoreFilter};

const SITES: [(&str, &str); 4] = [
    ("swh", "voaswahili"),
    ("eng", "voanews"),
    ("fra", "voafrique"),
    ("amh", "amharic"),
];

fn doc(i: usize) -> RawDocument {
    let (iso, domain) = SITES[i % SITES.len()];
    let content_type = match i % 7 {
        0 => ContentType::Poll,
        1 | 2 => ContentType::Video,
        _ => ContentType::Article,
    };
    let date_published = match i % 11 {
        0 => None,
        1 => Some("not a date".to_string()),
        n => Some(format!("{}-03-15T08:00:00", 2010 + n)),
    };
    let paragraphs = if i % 13 == 0 {
        vec!["Embed".to_string()]
    } else {
        vec![
            format!("Habari ya {i}. Rais alizungumza jana."),
            "Waziri alikubali mapendekezo.".to_string(),
        ]
    };
    RawDocument {
        id: format!("{domain}-{i}"),
        iso: iso.to_string(),
        domain: Some(domain.to_string()),
        url: Some(format!("https://www.{domain}.com/a/{i}.html")),
        content_type,
        date_published,
        title: format!("Kichwa {i}"),
        authors: vec!["Mwandishi".to_string()],
        paragraphs,
        ..Default::default()
    }
}

fn store(n: usize) -> MemoryStore {
    (0..n).map(doc).collect()
}

/// Record files under `dst`, relative to it.
fn records(dst: &Path) -> BTreeSet<PathBuf> {
    let pattern = format!("{}/*/*/*.json", glob::Pattern::escape(dst.to_str().unwrap()));
    glob::glob(&pattern)
        .unwrap()
        .map(|p| p.unwrap().strip_prefix(dst).unwrap().to_path_buf())
        .collect()
}

fn run(store: Arc<dyn DocumentStore>, dst: &Path, config: ExtractionConfig) -> Summary {
    Extraction::new(DocumentSource::database(store), dst.to_path_buf(), config)
        .run()
        .unwrap()
}

fn config(n_queriers: usize, n_extractors: usize, batchsize: usize) -> ExtractionConfig {
    ExtractionConfig {
        n_queriers,
        n_extractors,
        batchsize,
        retry_backoff_ms: 0,
        ..Default::default()
    }
}

#[test_log::test]
fn worker_counts_do_not_change_output() {
    let store: Arc<dyn DocumentStore> = Arc::new(store(10_000));
    let single = tempfile::tempdir().unwrap();
    let many = tempfile::tempdir().unwrap();

    let a = run(store.clone(), single.path(), config(1, 1, 100));
    let mut c = config(8, 8, 100);
    c.n_writers = 4;
    let b = run(store, many.path(), c);

    assert_eq!(a, b);
    assert_eq!(a.seen, 10_000);
    assert_eq!(a.seen, a.accepted + a.rejected_total() + a.normalization_failures);
    assert_eq!(a.written, a.accepted);
    assert!(a.rejected(RejectReason::ExcludedContentType) > 0);
    assert!(a.rejected(RejectReason::MalformedDate) > 0);
    assert!(a.rejected(RejectReason::EmptyOutput) > 0);

    let written = records(single.path());
    assert_eq!(written.len() as u64, a.written);
    assert_eq!(written, records(many.path()));
}

#[test_log::test]
fn batchsize_does_not_change_output() {
    let store: Arc<dyn DocumentStore> = Arc::new(store(2_000));
    let small = tempfile::tempdir().unwrap();
    let large = tempfile::tempdir().unwrap();

    let a = run(store.clone(), small.path(), config(2, 2, 1));
    let b = run(store, large.path(), config(2, 2, 1000));

    assert_eq!(a, b);
    assert_eq!(records(small.path()), records(large.path()));
}

#[test_log::test]
fn rerun_is_idempotent() {
    let store: Arc<dyn DocumentStore> = Arc::new(store(500));
    let dst = tempfile::tempdir().unwrap();

    let a = run(store.clone(), dst.path(), config(2, 4, 50));
    let before = records(dst.path());
    let b = run(store, dst.path(), config(2, 4, 50));

    assert_eq!(a, b);
    assert_eq!(before, records(dst.path()));
}

#[test_log::test]
fn date_range() {
    let store: Arc<dyn DocumentStore> = Arc::new(store(1_000));
    let dst = tempfile::tempdir().unwrap();

    let mut c = config(1, 2, 100);
    c.filter.start_date = chrono::NaiveDate::from_ymd_opt(2015, 1, 1);
    c.filter.end_date = chrono::NaiveDate::from_ymd_opt(2017, 12, 31);
    run(store, dst.path(), c);

    for path in records(dst.path()) {
        let record: NormalizedRecord =
            serde_json::from_str(&fs::read_to_string(dst.path().join(&path)).unwrap()).unwrap();
        let i: usize = record.filename().rsplit('-').next().unwrap().parse().unwrap();
        assert!((5..=7).contains(&(i % 11)), "{:?} is out of range", path);
    }
}

/// Cancels the run once `after` fetches went through.
struct CancellingStore {
    inner: MemoryStore,
    cancel: CancelFlag,
    after: usize,
    fetches: AtomicUsize,
}

impl DocumentStore for CancellingStore {
    fn fetch(&self, filter: &StoreFilter, offset: usize, limit: usize) -> Result<Page, Error> {
        if self.fetches.fetch_add(1, Ordering::SeqCst) + 1 >= self.after {
            self.cancel.cancel();
        }
        self.inner.fetch(filter, offset, limit)
    }

    fn sites(&self) -> Result<Vec<SiteCode>, Error> {
        self.inner.sites()
    }
}

#[test_log::test]
fn cancellation_stops_the_run() {
    let cancel = CancelFlag::new();
    let store = Arc::new(CancellingStore {
        inner: store(1_000),
        cancel: cancel.clone(),
        after: 3,
        fetches: AtomicUsize::new(0),
    });
    let dst = tempfile::tempdir().unwrap();

    let summary = Extraction::new(
        DocumentSource::database(store),
        dst.path().to_path_buf(),
        config(2, 2, 10),
    )
    .with_cancel_flag(cancel)
    .run()
    .unwrap();

    assert!(summary.cancelled);
    assert!(summary.is_incomplete());
    assert!(summary.seen < 1_000);
    assert!(summary.failed_shards.is_empty());

    // whatever got written is complete
    for path in records(dst.path()) {
        let content = fs::read_to_string(dst.path().join(path)).unwrap();
        let record: NormalizedRecord = serde_json::from_str(&content).unwrap();
        assert!(record.is_consistent());
    }
}

/// Fails every other fetch, `failures` times in total.
struct FlakyStore {
    inner: MemoryStore,
    failures: AtomicUsize,
    fetches: AtomicUsize,
}

impl DocumentStore for FlakyStore {
    fn fetch(&self, filter: &StoreFilter, offset: usize, limit: usize) -> Result<Page, Error> {
        let nb = self.fetches.fetch_add(1, Ordering::SeqCst);
        if nb % 2 == 1
            && self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |f| f.checked_sub(1))
                .is_ok()
        {
            return Err(Error::Store("connection reset".to_string()));
        }
        self.inner.fetch(filter, offset, limit)
    }

    fn sites(&self) -> Result<Vec<SiteCode>, Error> {
        self.inner.sites()
    }
}

#[test_log::test]
fn transient_failures_are_retried() {
    let flaky = Arc::new(FlakyStore {
        inner: store(400),
        failures: AtomicUsize::new(2),
        fetches: AtomicUsize::new(0),
    });
    let flaky_dst = tempfile::tempdir().unwrap();
    let clean_dst = tempfile::tempdir().unwrap();

    let a = run(flaky.clone(), flaky_dst.path(), config(1, 2, 10));
    let b = run(Arc::new(store(400)), clean_dst.path(), config(1, 2, 10));

    assert_eq!(flaky.failures.load(Ordering::SeqCst), 0);
    assert!(a.failed_shards.is_empty());
    assert_eq!(a, b);
    assert_eq!(records(flaky_dst.path()), records(clean_dst.path()));
}

/// Never answers in time for one site.
struct SlowStore {
    inner: MemoryStore,
    slow: SiteCode,
}

impl DocumentStore for SlowStore {
    fn fetch(&self, filter: &StoreFilter, offset: usize, limit: usize) -> Result<Page, Error> {
        if filter.site == self.slow {
            thread::sleep(Duration::from_secs(3));
        }
        self.inner.fetch(filter, offset, limit)
    }

    fn sites(&self) -> Result<Vec<SiteCode>, Error> {
        self.inner.sites()
    }
}

#[test_log::test]
fn stuck_shard_fails_alone() {
    let slow = SiteCode::new("eng", "voanews");
    let store = Arc::new(SlowStore {
        inner: store(200),
        slow: slow.clone(),
    });
    let dst = tempfile::tempdir().unwrap();

    let mut c = config(2, 2, 1000);
    c.store_timeout_secs = Some(1);
    c.max_shard_retries = 1;
    let summary = run(store, dst.path(), c);

    assert_eq!(summary.failed_shards, vec![slow.to_string()]);
    assert!(summary.is_incomplete());
    assert!(!summary.cancelled);
    // 3 other sites of 50 documents each
    assert_eq!(summary.seen, 150);
    assert!(!dst.path().join(slow.to_string()).exists());
    assert!(dst.path().join("swh_voaswahili/article").is_dir());
}

#[test_log::test]
fn from_dumped_files() {
    let input = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    for i in 3..10 {
        let d = doc(i);
        let dir = input
            .path()
            .join(d.site_code().to_string())
            .join(d.content_type.as_str());
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(format!("{}.json", d.id)),
            serde_json::to_string(&d).unwrap(),
        )
        .unwrap();
    }
    // left over by an earlier language identification pass
    let filtered = input.path().join("swh_voaswahili/lang_id_filtered");
    fs::create_dir_all(&filtered).unwrap();
    fs::write(
        filtered.join("x.json"),
        serde_json::to_string(&doc(4)).unwrap(),
    )
    .unwrap();
    fs::write(input.path().join("swh_voaswahili/broken.json"), "{").unwrap();

    let filemap = Filemap::from_dir(input.path()).unwrap();
    let summary = Extraction::new(
        DocumentSource::Files(filemap),
        dst.path().to_path_buf(),
        config(2, 2, 3),
    )
    .run()
    .unwrap();

    assert_eq!(summary.load_errors, 1);
    assert_eq!(summary.seen, 8);
    assert_eq!(summary.rejected(RejectReason::ExcludedPathPattern), 1);
    assert_eq!(summary.written as usize, records(dst.path()).len());
    assert!(dst.path().join("fra_voafrique/article/voafrique-6.json").exists());
}

#[test_log::test]
fn from_jsonl_store() {
    let root = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    let mut lines = (0..40)
        .map(|i| doc(i * 4))
        .map(|d| serde_json::to_string(&d).unwrap())
        .collect::<Vec<_>>();
    lines.insert(5, "not json".to_string());
    fs::write(root.path().join("swh_voaswahili.jsonl"), lines.join("\n")).unwrap();

    let store = JsonlStore::open(root.path()).unwrap();
    let summary = run(Arc::new(store), dst.path(), config(1, 2, 7));

    assert_eq!(summary.seen, 40);
    assert_eq!(summary.load_errors, 1);
    assert_eq!(summary.written as usize, records(dst.path()).len());
    assert!(dst.path().join("swh_voaswahili/article/voaswahili-20.json").exists());
}

#[test_log::test]
fn invalid_utf8_line_in_dump() {
    let root = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    let mut dump = Vec::new();
    for (nb, i) in (0..10).map(|i| i * 4).enumerate() {
        if nb == 3 {
            dump.extend(b"{\"_id\": \"voaswahili-\xff\xfe\"}\n");
        }
        dump.extend(serde_json::to_vec(&doc(i)).unwrap());
        dump.push(b'\n');
    }
    fs::write(root.path().join("swh_voaswahili.jsonl"), dump).unwrap();

    let store = JsonlStore::open(root.path()).unwrap();
    let summary = run(Arc::new(store), dst.path(), config(1, 2, 2));

    assert!(summary.failed_shards.is_empty());
    assert_eq!(summary.seen, 10);
    assert_eq!(summary.load_errors, 1);
    assert_eq!(summary.written as usize, records(dst.path()).len());
}
