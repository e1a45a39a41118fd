//! Corpus statistics.
//!
//! Counts documents, paragraphs, sentences, tokens, words and characters per site and content type,
//! and writes them as a csv file.
use std::collections::BTreeMap;
use std::path::Path;

use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::Error;
use crate::query::{CorpusEntry, SentenceField, Source, TokenField};

/// One csv row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SiteStats {
    pub site: String,
    pub content_type: String,
    pub documents: u64,
    pub paragraphs: u64,
    pub sentences: u64,
    pub tokens: u64,
    pub words: u64,
    pub chars: u64,
}

impl SiteStats {
    fn add(&mut self, entry: &CorpusEntry) {
        self.documents += 1;
        self.paragraphs += entry.paragraphs.len() as u64;
        let sentences: usize = match &entry.sentences {
            Some(SentenceField::Flat(s)) => s.len(),
            Some(SentenceField::Nested(s)) => s.iter().map(Vec::len).sum(),
            None => 0,
        };
        let tokens: usize = match &entry.tokens {
            Some(TokenField::Flat(t)) => t.iter().map(Vec::len).sum(),
            Some(TokenField::Nested(t)) => t.iter().flatten().map(Vec::len).sum(),
            None => 0,
        };
        self.sentences += sentences as u64;
        self.tokens += tokens as u64;
        for paragraph in &entry.paragraphs {
            self.words += paragraph.unicode_words().count() as u64;
            self.chars += paragraph.chars().count() as u64;
        }
    }
}

fn dir_name(path: Option<&Path>) -> String {
    path.and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Compute statistics of the records under `src`, sorted by site and content type.
///
/// Records are expected at `<site>/<content type>/<filename>.json`.
pub fn corpus_stats(src: &Path) -> Result<Vec<SiteStats>, Error> {
    let files = Source::open(src, &[])?.files()?;

    let entries: Vec<_> = files
        .par_iter()
        .filter_map(|path| match CorpusEntry::from_path(path) {
            Ok(entry) => {
                let parent = path.parent();
                let key = (dir_name(parent.and_then(Path::parent)), dir_name(parent));
                Some((key, entry))
            }
            Err(e) => {
                warn!("could not read {:?}: {}", path, e);
                None
            }
        })
        .collect();

    let mut stats: BTreeMap<(String, String), SiteStats> = BTreeMap::new();
    for ((site, content_type), entry) in entries {
        stats
            .entry((site.clone(), content_type.clone()))
            .or_insert_with(|| SiteStats {
                site,
                content_type,
                ..Default::default()
            })
            .add(&entry);
    }

    Ok(stats.into_values().collect())
}

/// Compute statistics of `src` and write them to the csv file `dst`.
pub fn stats(src: &Path, dst: &Path) -> Result<Vec<SiteStats>, Error> {
    let rows = corpus_stats(src)?;

    let mut out = csv::WriterBuilder::new().from_path(dst)?;
    for row in &rows {
        out.serialize(row)?;
    }
    out.flush()?;

    info!("wrote statistics of {} site/content type pairs to {:?}", rows.len(), dst);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn counts() {
        let dir = tempfile::tempdir().unwrap();
        let article = dir.path().join("swh_voaswahili/article");
        fs::create_dir_all(&article).unwrap();
        fs::write(
            article.join("a.json"),
            r#"{"paragraphs": ["Habari za leo.", "Asante."], "sentences": ["Habari za leo.", "Asante."], "tokens": [["Habari", "za", "leo", "."], ["Asante", "."]]}"#,
        )
        .unwrap();
        fs::write(article.join("b.json"), r#"{"paragraphs": ["Ndiyo"]}"#).unwrap();
        fs::write(article.join("broken.json"), "{").unwrap();

        let csv_path = dir.path().join("stats.csv");
        let rows = stats(dir.path(), &csv_path).unwrap();
        assert_eq!(
            rows,
            vec![SiteStats {
                site: "swh_voaswahili".to_string(),
                content_type: "article".to_string(),
                documents: 2,
                paragraphs: 3,
                sentences: 2,
                tokens: 6,
                words: 5,
                chars: 14 + 7 + 5,
            }]
        );

        let csv = fs::read_to_string(csv_path).unwrap();
        assert!(csv.starts_with("site,content_type,documents,paragraphs,sentences,tokens,words,chars\n"));
    }
}
