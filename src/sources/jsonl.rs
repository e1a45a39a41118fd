/*! JSON lines dump store

A directory holding one dump file per site, `<site>.jsonl` or `<site>.jsonl.gz`,
with one raw document per line.

```text
store/
├── swh_voaswahili.jsonl.gz
└── eng_voanews.jsonl
```

Offsets are byte offsets in the (decompressed) dump.
The reader of a site is kept open between two fetches, so reading a dump batch after batch goes through it once.
When a fetch starts elsewhere (a retry, after an error), plain files are seeked into and gzipped ones are decompressed up to the offset.
!*/
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use flate2::read::MultiGzDecoder;
use log::{debug, warn};

use super::{DocumentStore, Page, StoreFilter};
use crate::document::{RawDocument, SiteCode};
use crate::error::Error;

const PLAIN_EXT: &str = ".jsonl";
const GZIP_EXT: &str = ".jsonl.gz";

/// A dump left open where the last fetch stopped.
struct OpenDump {
    path: PathBuf,
    position: usize,
    reader: Box<dyn BufRead + Send>,
}

pub struct JsonlStore {
    root: PathBuf,
    /// One open dump per site being read. Dropped at the end of the dump or on error.
    open: Mutex<HashMap<SiteCode, OpenDump>>,
}

impl JsonlStore {
    /// Open the store at `root`. Fails if `root` is not a directory.
    pub fn open(root: &Path) -> Result<Self, Error> {
        if !root.is_dir() {
            return Err(Error::Config(format!(
                "document store {:?} is not a directory",
                root
            )));
        }
        Ok(Self {
            root: root.to_path_buf(),
            open: Mutex::new(HashMap::new()),
        })
    }

    /// Dump file of `site`, preferring the plain one.
    fn dump_path(&self, site: &SiteCode) -> Result<PathBuf, Error> {
        [PLAIN_EXT, GZIP_EXT]
            .iter()
            .map(|ext| self.root.join(format!("{site}{ext}")))
            .find(|path| path.is_file())
            .ok_or_else(|| Error::Store(format!("no dump for site {site} in {:?}", self.root)))
    }

    /// Reader positioned at `offset`.
    fn reader_at(path: &Path, offset: usize) -> Result<Box<dyn BufRead + Send>, Error> {
        let mut f = File::open(path)?;
        if path.to_string_lossy().ends_with(GZIP_EXT) {
            let mut r = BufReader::new(MultiGzDecoder::new(f));
            io::copy(&mut (&mut r).take(offset as u64), &mut io::sink())?;
            Ok(Box::new(r))
        } else {
            f.seek(SeekFrom::Start(offset as u64))?;
            Ok(Box::new(BufReader::new(f)))
        }
    }

    /// The dump of `site` at `offset`, reusing the one left open by the previous fetch if it stopped there.
    fn dump_at(&self, site: &SiteCode, offset: usize) -> Result<OpenDump, Error> {
        let path = self.dump_path(site)?;
        let cached = self
            .open
            .lock()
            .map_err(|e| Error::Store(format!("{site}: {e}")))?
            .remove(site);
        match cached {
            Some(dump) if dump.path == path && dump.position == offset => Ok(dump),
            _ => {
                debug!("{}: opening {:?} at offset {}", site, path, offset);
                let reader = Self::reader_at(&path, offset)?;
                Ok(OpenDump {
                    path,
                    position: offset,
                    reader,
                })
            }
        }
    }

    fn keep_open(&self, site: &SiteCode, dump: OpenDump) {
        match self.open.lock() {
            Ok(mut open) => {
                open.insert(site.clone(), dump);
            }
            Err(e) => warn!("{}: could not keep dump open: {}", site, e),
        }
    }
}

impl DocumentStore for JsonlStore {
    fn fetch(&self, filter: &StoreFilter, offset: usize, limit: usize) -> Result<Page, Error> {
        let site = &filter.site;
        let mut dump = self.dump_at(site, offset)?;

        let mut page = Page::default();
        let mut buf = Vec::new();
        let mut read = 0;
        while read < limit {
            buf.clear();
            let nb_bytes = dump.reader.read_until(b'\n', &mut buf)?;
            if nb_bytes == 0 {
                return Ok(page);
            }
            let line_start = dump.position;
            dump.position += nb_bytes;
            read += 1;

            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line,
                Err(e) => {
                    warn!("{}: invalid utf-8 at byte {}: {}", site, line_start, e);
                    page.load_errors += 1;
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RawDocument>(line) {
                Ok(doc) if filter.admits(&doc) => page.documents.push(doc),
                Ok(_) => (),
                Err(e) => {
                    warn!("{}: unreadable document at byte {}: {}", site, line_start, e);
                    page.load_errors += 1;
                }
            }
        }

        // stop here only if there's something left
        if dump.reader.fill_buf()?.is_empty() {
            Ok(page)
        } else {
            page.next_offset = Some(dump.position);
            self.keep_open(site, dump);
            Ok(page)
        }
    }

    fn sites(&self) -> Result<Vec<SiteCode>, Error> {
        let mut sites = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            let stem = name
                .strip_suffix(GZIP_EXT)
                .or_else(|| name.strip_suffix(PLAIN_EXT));
            match stem.map(SiteCode::from_str) {
                Some(Ok(site)) => sites.push(site),
                Some(Err(e)) => warn!("skipping dump {:?}: {}", name, e),
                None => debug!("skipping {:?}", name),
            }
        }
        sites.sort();
        sites.dedup();
        Ok(sites)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::{write::GzEncoder, Compression};

    use super::*;

    fn line(id: usize, date: &str) -> String {
        format!(
            r#"{{"_id": "{id}", "iso": "swh", "domain": "voaswahili", "content_type": "article", "date_published": "{date}", "title": "t", "authors": [], "paragraphs": ["p"]}}"#
        )
    }

    fn dump(n: usize) -> String {
        let mut s: Vec<String> = (0..n).map(|i| line(i, "2020-01-01")).collect();
        s.insert(2, "{not json".to_string());
        s.join("\n") + "\n"
    }

    fn drain(store: &JsonlStore, site: &SiteCode, limit: usize) -> (Vec<String>, usize) {
        let filter = StoreFilter::new(site.clone());
        let mut ids = Vec::new();
        let mut errors = 0;
        let mut offset = Some(0);
        while let Some(o) = offset {
            let page = store.fetch(&filter, o, limit).unwrap();
            ids.extend(page.documents.into_iter().map(|d| d.id));
            errors += page.load_errors;
            offset = page.next_offset;
        }
        (ids, errors)
    }

    #[test]
    fn plain_and_gzipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("swh_voaswahili.jsonl"), dump(7)).unwrap();

        gzip(&dir.path().join("swh_voaswahili_2.jsonl.gz"), dump(7).as_bytes());
        std::fs::write(dir.path().join("README"), "not a dump").unwrap();

        let store = JsonlStore::open(dir.path()).unwrap();
        let sites = store.sites().unwrap();
        assert_eq!(
            sites,
            vec![
                SiteCode::new("swh", "voaswahili"),
                SiteCode::new("swh", "voaswahili_2")
            ]
        );

        let expected: Vec<String> = (0..7).map(|i| i.to_string()).collect();
        for site in &sites {
            for limit in [1, 3, 100] {
                let (ids, errors) = drain(&store, site, limit);
                assert_eq!(ids, expected);
                assert_eq!(errors, 1);
            }
        }
    }

    fn gzip(path: &Path, content: &[u8]) {
        let mut enc = GzEncoder::new(File::create(path).unwrap(), Compression::default());
        enc.write_all(content).unwrap();
        enc.finish().unwrap();
    }

    #[test]
    fn invalid_utf8_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut content = Vec::new();
        for i in 0..3 {
            content.extend(line(i, "2020-01-01").bytes());
            content.push(b'\n');
        }
        content.extend(b"{\"_id\": \"\xff\xfe\"}\n");
        for i in 3..10 {
            content.extend(line(i, "2020-01-01").bytes());
            content.push(b'\n');
        }
        gzip(&dir.path().join("swh_voaswahili.jsonl.gz"), &content);

        let store = JsonlStore::open(dir.path()).unwrap();
        let (ids, errors) = drain(&store, &SiteCode::new("swh", "voaswahili"), 2);
        assert_eq!(ids.len(), 10);
        assert_eq!(errors, 1);
    }

    #[test]
    fn reopens_when_offset_moves() {
        let dir = tempfile::tempdir().unwrap();
        gzip(&dir.path().join("swh_voaswahili.jsonl.gz"), dump(5).as_bytes());
        let store = JsonlStore::open(dir.path()).unwrap();
        let filter = StoreFilter::new(SiteCode::new("swh", "voaswahili"));

        let first = store.fetch(&filter, 0, 2).unwrap();
        let next = first.next_offset.unwrap();
        store.fetch(&filter, next, 2).unwrap();

        // a retry of the first batch reads the same documents again
        let again = store.fetch(&filter, 0, 2).unwrap();
        assert_eq!(again.documents, first.documents);
        assert_eq!(again.next_offset, Some(next));
        assert_eq!(store.fetch(&filter, next, 100).unwrap().next_offset, None);
        assert!(store.open.lock().unwrap().is_empty());
    }

    #[test]
    fn missing_root() {
        assert!(JsonlStore::open(Path::new("/nonexistent/store")).is_err());
    }
}
