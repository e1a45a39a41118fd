use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use sha2::{Digest, Sha384};

use motext::error::Error;
use motext::processing::{corpus_stats, package, Exclusions};

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn corpus(root: &Path) {
    let record = |name: &str| format!(r#"{{"filename": "{name}", "paragraphs": ["Habari za {name}."]}}"#);
    write(root, "swh_voaswahili/article/a.json", &record("a"));
    write(root, "swh_voaswahili/article/b.json", &record("b"));
    write(root, "swh_voaswahili/article/5f1d.json", &record("5f1d"));
    write(root, "swh_voaswahili/article/empty_output.txt", "https://www.voaswahili.com/a/1.html\n");
    write(root, "swh_voaswahili/poll/p.json", &record("p"));
    write(root, "eng_voanews/article/c.json", &record("c"));
    write(root, "eng_voanews/lang_id_filtered/article/d.json", &record("d"));
    write(root, "extraction_summary.json", "{}");
}

fn bundle_filenames(path: &Path) -> Vec<String> {
    BufReader::new(GzDecoder::new(File::open(path).unwrap()))
        .lines()
        .map(|line| {
            let record: serde_json::Value = serde_json::from_str(&line.unwrap()).unwrap();
            record["filename"].as_str().unwrap().to_string()
        })
        .collect()
}

#[test_log::test]
fn package_and_prune() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    corpus(src.path());

    let exclusions = Exclusions::default().with_ids(["5f1d"]);
    let report = package(src.path(), dst.path(), &exclusions, true).unwrap();

    let expected: BTreeMap<String, usize> = [
        ("denylisted-id", 1),
        ("empty-output", 1),
        ("excluded-content-type", 1),
        ("excluded-path-pattern", 1),
    ]
    .into_iter()
    .map(|(r, n)| (r.to_string(), n))
    .collect();
    assert_eq!(report.excluded, expected);
    assert_eq!(report.records, 3);
    assert_eq!(report.pruned_dirs, 3);
    assert_eq!(
        report.bundles,
        vec![
            dst.path().join("eng_voanews.jsonl.gz"),
            dst.path().join("swh_voaswahili.jsonl.gz"),
        ]
    );

    assert_eq!(bundle_filenames(&report.bundles[0]), vec!["c"]);
    assert_eq!(bundle_filenames(&report.bundles[1]), vec!["a", "b"]);

    // excluded files and the folders they leave are gone
    assert!(!src.path().join("swh_voaswahili/poll").exists());
    assert!(!src.path().join("eng_voanews/lang_id_filtered").exists());
    assert!(!src.path().join("swh_voaswahili/article/5f1d.json").exists());
    assert!(!src.path().join("swh_voaswahili/article/empty_output.txt").exists());
    assert!(src.path().join("swh_voaswahili/article/a.json").exists());
    assert!(src.path().join("extraction_summary.json").exists());
}

#[test_log::test]
fn checksums() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    corpus(src.path());

    let report = package(src.path(), dst.path(), &Exclusions::default(), false).unwrap();
    assert_eq!(report.pruned_dirs, 0);
    // nothing is deleted without prune
    assert!(src.path().join("swh_voaswahili/poll/p.json").exists());

    let checksums = fs::read_to_string(dst.path().join("checksums_sha384.txt")).unwrap();
    let lines: Vec<&str> = checksums.lines().collect();
    assert_eq!(lines.len(), 2);
    for (line, bundle) in lines.iter().zip(&report.bundles) {
        let expected = format!("{:x}", Sha384::digest(fs::read(bundle).unwrap()));
        let filename = bundle.file_name().unwrap().to_str().unwrap();
        assert_eq!(*line, format!("{} {}", expected, filename));
    }
    // without the id rule, the denylisted record is bundled
    assert_eq!(bundle_filenames(&report.bundles[1]), vec!["5f1d", "a", "b"]);
}

#[test_log::test]
fn missing_source() {
    let dst = tempfile::tempdir().unwrap();
    assert!(matches!(
        package(Path::new("/nonexistent/corpus"), dst.path(), &Exclusions::default(), false),
        Err(Error::Config(_))
    ));
}

#[test_log::test]
fn stats_skip_run_summary() {
    let src = tempfile::tempdir().unwrap();
    corpus(src.path());

    let rows = corpus_stats(src.path()).unwrap();
    assert_eq!(rows.iter().map(|r| r.documents).sum::<u64>(), 6);
    let swh = rows
        .iter()
        .find(|r| r.site == "swh_voaswahili" && r.content_type == "article")
        .unwrap();
    assert_eq!(swh.documents, 3);
    assert_eq!(swh.paragraphs, 3);
    assert_eq!(swh.sentences, 0);
}
