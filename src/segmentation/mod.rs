/*! Sentence segmentation and tokenization

Segmentation models are external, per-language resources. They are put behind the [Segmenter] trait,
and the pipeline only sees a [SegmentationService], that either has a model for a language or doesn't.
A missing model is a normal state (the language is not supported), not an error.

[Segmenters] is the default service: a registry of models keyed by ISO 639-3 code.
[Segmenters::with_defaults] registers the Unicode segmenter (UAX #29) for languages whose script delimits words and sentences.
Models have to be safe to call concurrently (or serialize themselves internally).
!*/
mod unicode;

use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use log::debug;

use crate::error::Error;

pub use unicode::UnicodeSegmenter;

lazy_static! {
    /// Languages that are correctly handled by [UnicodeSegmenter].
    pub static ref UNICODE_SEGMENTABLE: Vec<&'static str> = vec![
        "amh", "aze", "bos", "ell", "eng", "fas", "fra", "hat", "hau", "hye", "ind", "kin", "kor",
        "lin", "mkd", "nde", "orm", "por", "prs", "pus", "rus", "sna", "som", "spa", "sqi", "srp",
        "swh", "tir", "tur", "ukr", "urd", "uzb", "vie",
    ];
}

/// A segmentation model for a given language.
pub trait Segmenter: Send + Sync {
    /// Split text into sentences.
    fn segment(&self, text: &str) -> Result<Vec<String>, Error>;
    /// Split a sentence into tokens.
    fn tokenize(&self, sentence: &str) -> Result<Vec<String>, Error>;
}

/// Gives access to per-language models.
pub trait SegmentationService: Send + Sync {
    /// Model for `lang`, `None` if the language is not supported.
    fn model(&self, lang: &str) -> Option<&dyn Segmenter>;

    fn supports(&self, lang: &str) -> bool {
        self.model(lang).is_some()
    }
}

/// Registry of segmentation models.
#[derive(Default, Clone)]
pub struct Segmenters {
    models: HashMap<String, Arc<dyn Segmenter>>,
}

impl Segmenters {
    /// Registry with the unicode segmenter for [UNICODE_SEGMENTABLE] languages.
    pub fn with_defaults() -> Self {
        let mut segmenters = Self::default();
        let model: Arc<dyn Segmenter> = Arc::new(UnicodeSegmenter);
        for lang in UNICODE_SEGMENTABLE.iter() {
            segmenters.register_shared(lang, model.clone());
        }
        segmenters
    }

    /// Register (or replace) the model for `lang`.
    pub fn register(&mut self, lang: &str, model: Box<dyn Segmenter>) -> &mut Self {
        self.register_shared(lang, Arc::from(model))
    }

    fn register_shared(&mut self, lang: &str, model: Arc<dyn Segmenter>) -> &mut Self {
        debug!("registering segmentation model for {}", lang);
        self.models.insert(lang.to_string(), model);
        self
    }

    /// Supported languages, sorted.
    pub fn languages(&self) -> Vec<&str> {
        let mut langs: Vec<&str> = self.models.keys().map(String::as_str).collect();
        langs.sort_unstable();
        langs
    }
}

impl SegmentationService for Segmenters {
    fn model(&self, lang: &str) -> Option<&dyn Segmenter> {
        self.models.get(lang).map(|m| m.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Lines;
    impl Segmenter for Lines {
        fn segment(&self, text: &str) -> Result<Vec<String>, Error> {
            Ok(text.lines().map(str::to_string).collect())
        }
        fn tokenize(&self, sentence: &str) -> Result<Vec<String>, Error> {
            Ok(vec![sentence.to_string()])
        }
    }

    #[test]
    fn defaults() {
        let s = Segmenters::with_defaults();
        assert!(s.supports("swh"));
        assert!(s.supports("eng"));
        assert!(!s.supports("tha"));
        assert!(!s.supports("cmn"));
        assert!(s.model("xx").is_none());
    }

    #[test]
    fn register() {
        let mut s = Segmenters::default();
        assert!(!s.supports("tha"));
        s.register("tha", Box::new(Lines)).register("lao", Box::new(Lines));
        assert_eq!(s.languages(), vec!["lao", "tha"]);
        let model = s.model("tha").unwrap();
        assert_eq!(model.segment("a\nb").unwrap(), vec!["a", "b"]);
    }
}
