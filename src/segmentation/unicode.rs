//! Unicode segmenter.
use unicode_segmentation::UnicodeSegmentation;

use super::Segmenter;
use crate::error::Error;

/// Sentence and word segmentation following Unicode Standard Annex #29.
///
/// Tokens are word boundaries minus whitespace, so punctuation is kept as separate tokens.
/// Not suited for scripts without explicit word separators (Thai, Lao, Khmer, Chinese...).
#[derive(Debug, Default, Clone, Copy)]
pub struct UnicodeSegmenter;

impl Segmenter for UnicodeSegmenter {
    fn segment(&self, text: &str) -> Result<Vec<String>, Error> {
        Ok(text
            .unicode_sentences()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn tokenize(&self, sentence: &str) -> Result<Vec<String>, Error> {
        Ok(sentence
            .split_word_bounds()
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentences() {
        let s = UnicodeSegmenter;
        let sentences = s
            .segment("Rais alisema hayo jana. Waziri hakukubali! Je, kweli?")
            .unwrap();
        assert_eq!(
            sentences,
            vec!["Rais alisema hayo jana.", "Waziri hakukubali!", "Je, kweli?"]
        );
    }

    #[test]
    fn tokens() {
        let s = UnicodeSegmenter;
        assert_eq!(
            s.tokenize("Je, kweli?").unwrap(),
            vec!["Je", ",", "kweli", "?"]
        );
        assert!(s.tokenize("   ").unwrap().is_empty());
    }
}
