//! Document-level filtering.
//!
//! Rules are a table of predicates evaluated in precedence order, the first matching rule giving the rejection reason.
//! Adding a rule means adding a [RejectReason] and a row in [RULES].
use unicode_segmentation::UnicodeSegmentation;

use crate::config::{DatePolicy, FilterConfig};
use crate::document::RawDocument;
use crate::segmentation::UNICODE_SEGMENTABLE;

use super::paragraph::clean_paragraphs;
use super::{Filter, FilterDecision, RejectReason};

/// Title prefixes of wire service content.
const RESTRICTED_TITLE_PREFIXES: [&str; 2] = ["AP ", "AFP "];

/// A rejection rule: `rejects` returns `true` when the document has to be rejected for `reason`.
struct Rule {
    reason: RejectReason,
    rejects: fn(&RawDocument, &FilterConfig) -> bool,
}

const RULES: [Rule; 8] = [
    Rule {
        reason: RejectReason::ExcludedContentType,
        rejects: excluded_content_type,
    },
    Rule {
        reason: RejectReason::ExcludedPathPattern,
        rejects: excluded_path_pattern,
    },
    Rule {
        reason: RejectReason::DenylistedId,
        rejects: denylisted_id,
    },
    Rule {
        reason: RejectReason::RestrictedByline,
        rejects: restricted_byline,
    },
    Rule {
        reason: RejectReason::EmptyOutput,
        rejects: empty_output,
    },
    Rule {
        reason: RejectReason::MalformedDate,
        rejects: malformed_date,
    },
    Rule {
        reason: RejectReason::BeforeStartDate,
        rejects: before_start_date,
    },
    Rule {
        reason: RejectReason::AfterEndDate,
        rejects: after_end_date,
    },
];

fn excluded_content_type(doc: &RawDocument, config: &FilterConfig) -> bool {
    config.excluded_content_types.contains(&doc.content_type)
}

fn excluded_path_pattern(doc: &RawDocument, config: &FilterConfig) -> bool {
    doc.source_path.as_ref().map_or(false, |path| {
        path.components().any(|c| {
            let c = c.as_os_str().to_string_lossy();
            config.excluded_path_patterns.iter().any(|p| *p == c)
        })
    })
}

fn denylisted_id(doc: &RawDocument, config: &FilterConfig) -> bool {
    config.denylisted_ids.contains(&doc.id)
        || doc
            .url
            .as_ref()
            .map_or(false, |url| config.denylisted_ids.contains(url))
}

/// Words of `text`, split on anything that is not alphanumeric.
fn words(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

/// `true` if the words of `phrase` appear contiguously in `text`.
fn contains_phrase(text: &str, phrase: &str) -> bool {
    let text = words(text);
    let phrase = words(phrase);
    !phrase.is_empty() && text.windows(phrase.len()).any(|w| w == phrase.as_slice())
}

fn restricted_byline(doc: &RawDocument, config: &FilterConfig) -> bool {
    let by_author = doc.authors.iter().any(|author| {
        config
            .restricted_bylines
            .iter()
            .any(|byline| contains_phrase(author, byline))
    });

    by_author
        || RESTRICTED_TITLE_PREFIXES
            .iter()
            .any(|prefix| doc.title.starts_with(prefix))
}

/// Stub bodies.
///
/// When the language can be segmented, a body made of a single paragraph is empty
/// if it has no sentence, or a single sentence of fewer than `min_sentence_tokens` tokens.
/// Otherwise, a body is empty if it has at most `max_stub_chars` characters.
fn empty_output(doc: &RawDocument, config: &FilterConfig) -> bool {
    let paragraphs = clean_paragraphs(&doc.paragraphs);
    let body_chars: usize = paragraphs.iter().map(|p| p.chars().count()).sum();
    if body_chars == 0 {
        return true;
    }

    if !UNICODE_SEGMENTABLE.iter().any(|lang| *lang == doc.language()) {
        return body_chars <= config.max_stub_chars;
    }
    match paragraphs.as_slice() {
        [single] => {
            let sentences: Vec<&str> = single
                .unicode_sentences()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            match sentences.as_slice() {
                [] => true,
                [sentence] => {
                    let nb_tokens = sentence
                        .split_word_bounds()
                        .filter(|t| !t.trim().is_empty())
                        .count();
                    nb_tokens < config.min_sentence_tokens
                }
                _ => false,
            }
        }
        _ => false,
    }
}

fn malformed_date(doc: &RawDocument, config: &FilterConfig) -> bool {
    config.date_policy == DatePolicy::Reject && doc.publication_date().is_none()
}

fn before_start_date(doc: &RawDocument, config: &FilterConfig) -> bool {
    match (config.start_date, doc.publication_date()) {
        (Some(start), Some(date)) => date < start,
        _ => false,
    }
}

fn after_end_date(doc: &RawDocument, config: &FilterConfig) -> bool {
    match (config.end_date, doc.publication_date()) {
        (Some(end), Some(date)) => date > end,
        _ => false,
    }
}

/// Decide whether `doc` is kept. Total and deterministic.
pub fn decide(doc: &RawDocument, config: &FilterConfig) -> FilterDecision {
    RULES
        .iter()
        .find(|rule| (rule.rejects)(doc, config))
        .map_or(FilterDecision::Accept, |rule| {
            FilterDecision::Reject(rule.reason)
        })
}

/// [decide] bound to a [FilterConfig].
#[derive(Default)]
pub struct DocumentFilter {
    config: FilterConfig,
}

impl DocumentFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn decide(&self, doc: &RawDocument) -> FilterDecision {
        decide(doc, &self.config)
    }

    /// Get a reference to the filter's config.
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }
}

impl Filter<&RawDocument> for DocumentFilter {
    fn detect(&self, doc: &RawDocument) -> bool {
        self.decide(doc).is_accept()
    }
}
