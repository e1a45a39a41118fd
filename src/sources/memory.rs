//! In-memory document store.
use std::collections::BTreeMap;

use super::{DocumentStore, Page, StoreFilter};
use crate::document::{RawDocument, SiteCode};
use crate::error::Error;

/// Documents grouped by site, in insertion order.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    sites: BTreeMap<SiteCode, Vec<RawDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, doc: RawDocument) -> &mut Self {
        self.sites.entry(doc.site_code()).or_default().push(doc);
        self
    }

    /// Total number of documents.
    pub fn len(&self) -> usize {
        self.sites.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<RawDocument> for MemoryStore {
    fn from_iter<T: IntoIterator<Item = RawDocument>>(iter: T) -> Self {
        let mut store = MemoryStore::new();
        for doc in iter {
            store.insert(doc);
        }
        store
    }
}

impl DocumentStore for MemoryStore {
    fn fetch(&self, filter: &StoreFilter, offset: usize, limit: usize) -> Result<Page, Error> {
        let docs = match self.sites.get(&filter.site) {
            Some(docs) => docs,
            None => return Err(Error::Store(format!("unknown site {}", filter.site))),
        };

        let end = offset.saturating_add(limit).min(docs.len());
        let documents = docs
            .get(offset..end)
            .unwrap_or_default()
            .iter()
            .filter(|doc| filter.admits(doc))
            .cloned()
            .collect();

        Ok(Page {
            documents,
            load_errors: 0,
            next_offset: (end < docs.len()).then_some(end),
        })
    }

    fn sites(&self) -> Result<Vec<SiteCode>, Error> {
        Ok(self.sites.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn doc(id: usize, date: Option<&str>) -> RawDocument {
        RawDocument {
            id: id.to_string(),
            iso: "swh".to_string(),
            domain: Some("voaswahili".to_string()),
            date_published: date.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn pages() {
        let store: MemoryStore = (0..5).map(|i| doc(i, None)).collect();
        let filter = StoreFilter::new(SiteCode::new("swh", "voaswahili"));

        let page = store.fetch(&filter, 0, 2).unwrap();
        assert_eq!(page.documents.len(), 2);
        assert_eq!(page.next_offset, Some(2));

        let page = store.fetch(&filter, 4, 2).unwrap();
        assert_eq!(page.documents[0].id, "4");
        assert_eq!(page.next_offset, None);

        let page = store.fetch(&filter, 10, 2).unwrap();
        assert!(page.documents.is_empty());
        assert_eq!(page.next_offset, None);
    }

    #[test]
    fn date_bounds_let_undated_through() {
        let store: MemoryStore = vec![
            doc(0, Some("1999-01-01")),
            doc(1, Some("2005-01-01")),
            doc(2, None),
            doc(3, Some("not a date")),
        ]
        .into_iter()
        .collect();
        let filter = StoreFilter::new(SiteCode::new("swh", "voaswahili"))
            .with_dates(NaiveDate::from_ymd_opt(2001, 1, 1), None);

        let ids: Vec<_> = store
            .fetch(&filter, 0, 10)
            .unwrap()
            .documents
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn unknown_site() {
        let store = MemoryStore::new();
        let filter = StoreFilter::new(SiteCode::new("eng", "voanews"));
        assert!(matches!(store.fetch(&filter, 0, 1), Err(Error::Store(_))));
    }
}
