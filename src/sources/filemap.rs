/*! Filemaps

A filemap lists the dumped document files of each site.
It is a tab-separated file with a header:

```text
site	path
swh_voaswahili	swh_voaswahili/article/habari-123.json
eng_voanews	/data/dump/eng_voanews/video/456.json
```

Relative paths are resolved against the input directory.
When no filemap is given, one is built by walking the input directory for `*.json` files,
and using their first-level directory as site.
!*/
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::{debug, info, warn};
use serde::Deserialize;

use crate::error::Error;

#[derive(Debug, Deserialize)]
struct Row {
    site: String,
    path: PathBuf,
}

/// Site → document files. Sites and files are kept sorted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Filemap {
    sites: BTreeMap<String, Vec<PathBuf>>,
}

impl Filemap {
    /// Read a filemap file. Relative paths are resolved against `inputdir`.
    pub fn from_path(path: &Path, inputdir: &Path) -> Result<Self, Error> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_path(path)
            .map_err(|e| Error::Config(format!("could not read filemap {:?}: {}", path, e)))?;

        let mut sites: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        for row in reader.deserialize() {
            let row: Row = row?;
            let path = if row.path.is_absolute() {
                row.path
            } else {
                inputdir.join(row.path)
            };
            sites.entry(row.site).or_default().push(path);
        }

        Ok(Self::sorted(sites))
    }

    /// Build a filemap from the `*.json` files under `inputdir`.
    pub fn from_dir(inputdir: &Path) -> Result<Self, Error> {
        if !inputdir.is_dir() {
            return Err(Error::Config(format!(
                "input directory {:?} does not exist",
                inputdir
            )));
        }
        let root = inputdir
            .to_str()
            .ok_or_else(|| Error::Custom(format!("invalid input directory: {:?}", inputdir)))?;
        let pattern = format!("{}/**/*.json", glob::Pattern::escape(root));

        let paths = glob::glob(&pattern)?.collect::<Result<Vec<_>, _>>()?;
        let sites = paths
            .into_iter()
            .filter_map(|path| match site_of(inputdir, &path) {
                Some(site) => Some((site, path)),
                None => {
                    warn!("{:?} is not in a site directory, skipping", path);
                    None
                }
            })
            .into_group_map();

        let filemap = Self::sorted(sites.into_iter().collect());
        info!(
            "found {} files in {} sites under {:?}",
            filemap.len(),
            filemap.sites.len(),
            inputdir
        );
        Ok(filemap)
    }

    fn sorted(mut sites: BTreeMap<String, Vec<PathBuf>>) -> Self {
        for paths in sites.values_mut() {
            paths.sort();
            paths.dedup();
        }
        Self { sites }
    }

    pub fn sites(&self) -> impl Iterator<Item = &str> {
        self.sites.keys().map(String::as_str)
    }

    /// Files of `site`, empty if the site is unknown.
    pub fn paths(&self, site: &str) -> &[PathBuf] {
        self.sites.get(site).map(Vec::as_slice).unwrap_or_default()
    }

    /// Total number of files.
    pub fn len(&self) -> usize {
        self.sites.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// First-level directory of `path` relative to `root`, if `path` is not directly in `root`.
fn site_of(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut components = relative.components();
    let first = components.next()?;
    // a file directly under root has no site
    components.next()?;
    let site = first.as_os_str().to_string_lossy().into_owned();
    debug!("{:?} -> {}", path, site);
    Some(site)
}
