//! Error enum
use std::fmt;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Serde(serde_json::Error),
    Csv(csv::Error),
    Glob(glob::GlobError),
    GlobPattern(glob::PatternError),
    Date(chrono::ParseError),
    Url(url::ParseError),
    /// Invalid or inconsistent configuration, detected before any work starts.
    Config(String),
    UnknownUnit(String),
    UnknownContentType(String),
    /// Raised by a segmentation model. Never fatal for a run.
    Segmentation(String),
    /// Document store failure (connection, corrupted dump, ...).
    Store(String),
    Timeout(String),
    Custom(String),
}

impl Error {
    /// Errors that are worth retrying a shard for.
    ///
    /// Corrupted data reads the same on every attempt, so it is not.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Timeout(_) | Error::Store(_) => true,
            Error::Io(e) => e.kind() != std::io::ErrorKind::InvalidData,
            _ => false,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {e}"),
            Error::Serde(e) => write!(f, "json error: {e}"),
            Error::Csv(e) => write!(f, "csv error: {e}"),
            Error::Glob(e) => write!(f, "glob error: {e}"),
            Error::GlobPattern(e) => write!(f, "glob pattern error: {e}"),
            Error::Date(e) => write!(f, "date error: {e}"),
            Error::Url(e) => write!(f, "url error: {e}"),
            Error::Config(s) => write!(f, "configuration error: {s}"),
            Error::UnknownUnit(s) => write!(
                f,
                "unknown unit {s:?}, please choose from [paragraph | sentence | token]"
            ),
            Error::UnknownContentType(s) => write!(f, "unknown content type {s:?}"),
            Error::Segmentation(s) => write!(f, "segmentation error: {s}"),
            Error::Store(s) => write!(f, "store error: {s}"),
            Error::Timeout(s) => write!(f, "timeout: {s}"),
            Error::Custom(s) => write!(f, "{s}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Serde(e)
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Error {
        Error::Csv(e)
    }
}

impl From<glob::GlobError> for Error {
    fn from(e: glob::GlobError) -> Error {
        Error::Glob(e)
    }
}

impl From<glob::PatternError> for Error {
    fn from(e: glob::PatternError) -> Error {
        Error::GlobPattern(e)
    }
}

impl From<chrono::ParseError> for Error {
    fn from(e: chrono::ParseError) -> Error {
        Error::Date(e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Error {
        Error::Url(e)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Custom(s)
    }
}
