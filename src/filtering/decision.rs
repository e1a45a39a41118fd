//! Filter decisions.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a document was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectReason {
    ExcludedContentType,
    ExcludedPathPattern,
    DenylistedId,
    RestrictedByline,
    EmptyOutput,
    MalformedDate,
    BeforeStartDate,
    AfterEndDate,
}

impl RejectReason {
    pub const ALL: [RejectReason; 8] = [
        RejectReason::ExcludedContentType,
        RejectReason::ExcludedPathPattern,
        RejectReason::DenylistedId,
        RejectReason::RestrictedByline,
        RejectReason::EmptyOutput,
        RejectReason::MalformedDate,
        RejectReason::BeforeStartDate,
        RejectReason::AfterEndDate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::ExcludedContentType => "excluded-content-type",
            RejectReason::ExcludedPathPattern => "excluded-path-pattern",
            RejectReason::DenylistedId => "denylisted-id",
            RejectReason::RestrictedByline => "restricted-byline",
            RejectReason::EmptyOutput => "empty-output",
            RejectReason::MalformedDate => "malformed-date",
            RejectReason::BeforeStartDate => "before-start-date",
            RejectReason::AfterEndDate => "after-end-date",
        }
    }

    /// Position in [RejectReason::ALL].
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    Accept,
    Reject(RejectReason),
}

impl FilterDecision {
    pub fn is_accept(&self) -> bool {
        matches!(self, FilterDecision::Accept)
    }
}
