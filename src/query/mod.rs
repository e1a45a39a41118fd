/*! Corpus query layer

Read-only access to an extracted corpus (directories of normalized records):

- [search] lists the records mentioning a keyword into a path manifest,
- [extract] writes paragraphs, sentences or tokens of records into plain text files.

Both take a [Source]: a corpus directory, or a manifest listing record paths.
!*/
mod corpus;
mod extract;
mod search;

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

pub use corpus::{CorpusEntry, SentenceField, Source, TokenField};
pub use extract::{extract, ExtractJob, ExtractReport};
pub use search::{search, SearchQuery, SearchReport};

/// Extraction granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Paragraphs,
    Sentences,
    /// One sentence per line, tokens separated by a space.
    Tokens,
}

impl FromStr for Unit {
    type Err = Error;

    /// Accepts singular and plural forms, case insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "paragraph" | "paragraphs" => Ok(Unit::Paragraphs),
            "sentence" | "sentences" => Ok(Unit::Sentences),
            "token" | "tokens" => Ok(Unit::Tokens),
            _ => Err(Error::UnknownUnit(s.to_string())),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Unit::Paragraphs => "paragraphs",
            Unit::Sentences => "sentences",
            Unit::Tokens => "tokens",
        };
        f.write_str(s)
    }
}
