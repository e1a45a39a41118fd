//! Normalized records, the unit written to the corpus.
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{ContentType, RawDocument};

/// Canonical output unit.
///
/// `sentences`, `tokens` and their counts are absent (not empty) when the language has no segmentation model.
/// Fields are private so that counts always match their lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NormalizedRecord {
    filename: String,
    site: String,
    language: String,
    #[schemars(with = "String")]
    content_type: ContentType,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    date_published: Option<String>,
    title: String,
    authors: Vec<String>,
    paragraphs: Vec<String>,
    n_paragraphs: usize,
    n_chars: usize,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    sentences: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    n_sentences: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    tokens: Option<Vec<Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    n_tokens: Option<usize>,
}

impl NormalizedRecord {
    /// Create a paragraph-only record for `doc`. Title and authors are copied verbatim.
    pub fn new(doc: &RawDocument, paragraphs: Vec<String>) -> Self {
        Self {
            filename: doc.filename(),
            site: doc.site_code().to_string(),
            language: doc.language().to_string(),
            content_type: doc.content_type,
            url: doc.url.clone(),
            date_published: doc.date_published.clone(),
            title: doc.title.clone(),
            authors: doc.authors.clone(),
            n_paragraphs: paragraphs.len(),
            n_chars: paragraphs.iter().map(|p| p.chars().count()).sum(),
            paragraphs,
            sentences: None,
            n_sentences: None,
            tokens: None,
            n_tokens: None,
        }
    }

    /// Attach sentences and their tokens.
    ///
    /// `tokens` are dropped if they don't have one entry per sentence.
    pub fn with_segmentation(
        mut self,
        sentences: Vec<String>,
        tokens: Option<Vec<Vec<String>>>,
    ) -> Self {
        let tokens = tokens.filter(|t| t.len() == sentences.len());
        self.n_tokens = tokens.as_ref().map(|t| t.iter().map(Vec::len).sum());
        self.tokens = tokens;
        self.n_sentences = Some(sentences.len());
        self.sentences = Some(sentences);
        self
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn authors(&self) -> &[String] {
        &self.authors
    }

    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    pub fn n_paragraphs(&self) -> usize {
        self.n_paragraphs
    }

    pub fn n_chars(&self) -> usize {
        self.n_chars
    }

    pub fn sentences(&self) -> Option<&[String]> {
        self.sentences.as_deref()
    }

    pub fn n_sentences(&self) -> Option<usize> {
        self.n_sentences
    }

    pub fn tokens(&self) -> Option<&[Vec<String>]> {
        self.tokens.as_deref()
    }

    pub fn n_tokens(&self) -> Option<usize> {
        self.n_tokens
    }

    /// Check count/list consistency. Always true for records built through [NormalizedRecord::new].
    pub fn is_consistent(&self) -> bool {
        let paragraphs_ok = self.n_paragraphs == self.paragraphs.len();
        let sentences_ok = match (&self.sentences, self.n_sentences) {
            (Some(s), Some(n)) => s.len() == n,
            (None, None) => true,
            _ => false,
        };
        let tokens_ok = match (&self.tokens, &self.sentences) {
            (Some(t), Some(s)) => t.len() == s.len(),
            (Some(_), None) => false,
            (None, _) => self.n_tokens.is_none(),
        };
        paragraphs_ok && sentences_ok && tokens_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> RawDocument {
        RawDocument {
            id: "doc-1".to_string(),
            iso: "swh".to_string(),
            domain: Some("voaswahili".to_string()),
            content_type: ContentType::Article,
            title: "Kichwa".to_string(),
            authors: vec!["Mwandishi".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn paragraph_only_record_omits_segmentation_keys() {
        let record = NormalizedRecord::new(&doc(), vec!["Aya moja.".to_string()]);
        assert!(record.is_consistent());

        let json = serde_json::to_value(&record).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj["n_paragraphs"], 1);
        assert_eq!(obj["site"], "swh_voaswahili");
        assert!(!obj.contains_key("sentences"));
        assert!(!obj.contains_key("n_sentences"));
        assert!(!obj.contains_key("tokens"));
        assert!(!obj.contains_key("n_tokens"));
    }

    #[test]
    fn zero_sentences_is_not_absent() {
        let record = NormalizedRecord::new(&doc(), vec![]).with_segmentation(vec![], Some(vec![]));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["sentences"], serde_json::json!([]));
        assert_eq!(json["n_sentences"], 0);
        assert_eq!(json["n_tokens"], 0);
    }

    #[test]
    fn mismatched_tokens_are_dropped() {
        let record = NormalizedRecord::new(&doc(), vec!["A b. C d.".to_string()])
            .with_segmentation(
                vec!["A b.".to_string(), "C d.".to_string()],
                Some(vec![vec!["A".to_string(), "b".to_string()]]),
            );
        assert!(record.tokens().is_none());
        assert_eq!(record.n_sentences(), Some(2));
        assert!(record.is_consistent());
    }
}
