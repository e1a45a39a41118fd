//! Raw documents, as stored by the scraper.
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::debug;
use serde::{Deserialize, Deserializer, Serialize};

use super::{ContentType, SiteCode};
use crate::error::Error;

/// Domain used when neither a domain nor a parseable url is available.
const UNKNOWN_DOMAIN: &str = "unknown";

/// Maximum filename length (bytes) before truncation.
const MAX_FILENAME_LEN: usize = 200;
/// Number of trailing characters kept when truncating.
const TRUNCATED_FILENAME_LEN: usize = 100;

/// A scraped document.
///
/// Fields that can be missing or `null` in the store are defaulted,
/// except for the publication date, whose absence is meaningful.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub iso: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub content_type: ContentType,
    #[serde(default)]
    pub date_published: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub authors: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub paragraphs: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
    /// File the document was read from, if it comes from a dump directory.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

/// Treat `null` as the default value.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse a publication date.
///
/// Accepts RFC 3339 timestamps, naive ISO 8601 timestamps (`2016-03-15T00:00:00`)
/// and plain dates (`2016-03-15`).
pub fn parse_date(s: &str) -> Result<NaiveDate, Error> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?)
}

impl RawDocument {
    /// Site code of the document.
    ///
    /// Uses the `domain` field when present, derives it from the url otherwise.
    pub fn site_code(&self) -> SiteCode {
        let domain = match (&self.domain, &self.url) {
            (Some(d), _) if !d.is_empty() => d.clone(),
            (_, Some(url)) => SiteCode::domain_from_url(url).unwrap_or_else(|e| {
                debug!("{}: could not derive domain: {}", self.id, e);
                UNKNOWN_DOMAIN.to_string()
            }),
            _ => UNKNOWN_DOMAIN.to_string(),
        };
        SiteCode::new(&self.iso, &domain)
    }

    /// Language code, used to pick a segmentation model.
    pub fn language(&self) -> &str {
        &self.iso
    }

    /// Parsed publication date. `None` if absent or unparseable.
    pub fn publication_date(&self) -> Option<NaiveDate> {
        self.date_published
            .as_deref()
            .and_then(|d| parse_date(d).ok())
    }

    /// Name of the output file (without extension).
    ///
    /// Slashes are replaced by underscores and a trailing `.html` is dropped.
    /// Names that are too long for most filesystems are truncated to their last characters.
    pub fn filename(&self) -> String {
        let name = self.id.replace(['/', '\\'], "_");
        let name = name.strip_suffix(".html").unwrap_or(&name);
        if name.len() > MAX_FILENAME_LEN {
            let count = name.chars().count();
            name.chars()
                .skip(count.saturating_sub(TRUNCATED_FILENAME_LEN))
                .collect()
        } else {
            name.to_string()
        }
    }

    /// Line written into empty output markers.
    pub fn marker(&self) -> &str {
        self.url.as_deref().unwrap_or(&self.id)
    }
}
