//! Content types of scraped units.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Category of a scraped unit.
///
/// Unknown values are folded into [ContentType::Other] when deserializing,
/// since they can't be reliably used as directory names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentType {
    Article,
    Video,
    Photo,
    Audio,
    Index,
    Poll,
    Quiz,
    Other,
    NotFound,
}

impl ContentType {
    pub const ALL: [ContentType; 9] = [
        ContentType::Article,
        ContentType::Video,
        ContentType::Photo,
        ContentType::Audio,
        ContentType::Index,
        ContentType::Poll,
        ContentType::Quiz,
        ContentType::Other,
        ContentType::NotFound,
    ];

    /// Name as found in the store, also used as the output directory name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Article => "article",
            ContentType::Video => "video",
            ContentType::Photo => "photo",
            ContentType::Audio => "audio",
            ContentType::Index => "index",
            ContentType::Poll => "poll",
            ContentType::Quiz => "quiz",
            ContentType::Other => "other",
            ContentType::NotFound => "404 error",
        }
    }

    /// Parse a comma-separated list (`article,video`). Empty input yields an empty list.
    pub fn parse_list(s: &str) -> Result<Vec<ContentType>, Error> {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(ContentType::from_str)
            .collect()
    }
}

impl Default for ContentType {
    fn default() -> Self {
        ContentType::Other
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = Error;

    /// Strict parsing, used for user input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentType::ALL
            .iter()
            .find(|ct| ct.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| Error::UnknownContentType(s.to_string()))
    }
}

impl From<String> for ContentType {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl From<ContentType> for String {
    fn from(ct: ContentType) -> Self {
        ct.as_str().to_string()
    }
}
