/*! Normalization of raw documents

1. Title and authors are copied verbatim.
1. Paragraphs are cleaned (see [crate::filtering::paragraph]).
1. If the language has a segmentation model, paragraphs are split into sentences, then sentences into tokens.

A failing (or panicking) model is not fatal: the document falls back to paragraph-only output
and the failure is counted in [Normalizer::soft_failures].
!*/
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, warn};

use super::Transform;
use crate::document::{NormalizedRecord, RawDocument};
use crate::error::Error;
use crate::filtering::clean_paragraphs;
use crate::segmentation::{SegmentationService, Segmenter};

type Segmented = (Vec<String>, Vec<Vec<String>>);

pub struct Normalizer<'a> {
    service: &'a dyn SegmentationService,
    soft_failures: AtomicU64,
}

impl<'a> Normalizer<'a> {
    pub fn new(service: &'a dyn SegmentationService) -> Self {
        Self {
            service,
            soft_failures: AtomicU64::new(0),
        }
    }

    /// Number of documents whose segmentation failed.
    pub fn soft_failures(&self) -> u64 {
        self.soft_failures.load(Ordering::Relaxed)
    }

    /// Normalize `doc`, using the segmentation model for `lang` if there's one.
    pub fn normalize(&self, doc: &RawDocument, lang: &str) -> Result<NormalizedRecord, Error> {
        let paragraphs = clean_paragraphs(&doc.paragraphs);
        if paragraphs.is_empty() {
            return Err(Error::Custom(format!("{}: no paragraphs to normalize", doc.id)));
        }

        let model = match self.service.model(lang) {
            Some(model) => model,
            None => {
                debug!("{}: no segmentation model for {}", doc.id, lang);
                return Ok(NormalizedRecord::new(doc, paragraphs));
            }
        };

        let segmented = panic::catch_unwind(AssertUnwindSafe(|| segment(model, &paragraphs)));
        let record = NormalizedRecord::new(doc, paragraphs);
        match segmented {
            Ok(Ok((sentences, tokens))) => Ok(record.with_segmentation(sentences, Some(tokens))),
            Ok(Err(e)) => {
                warn!("{}: segmentation failed ({}), keeping paragraphs only", doc.id, e);
                self.soft_failures.fetch_add(1, Ordering::Relaxed);
                Ok(record)
            }
            Err(_) => {
                warn!("{}: segmentation model panicked, keeping paragraphs only", doc.id);
                self.soft_failures.fetch_add(1, Ordering::Relaxed);
                Ok(record)
            }
        }
    }
}

impl<'a> Transform<RawDocument, NormalizedRecord> for Normalizer<'a> {
    fn transform(&self, doc: &RawDocument) -> Result<NormalizedRecord, Error> {
        self.normalize(doc, doc.language())
    }
}

/// Sentences of every paragraph, in order, then one token list per sentence.
fn segment(model: &dyn Segmenter, paragraphs: &[String]) -> Result<Segmented, Error> {
    let mut sentences = Vec::new();
    for paragraph in paragraphs {
        sentences.extend(
            model
                .segment(paragraph)?
                .into_iter()
                .filter(|s| !s.trim().is_empty()),
        );
    }

    let tokens = sentences
        .iter()
        .map(|s| model.tokenize(s))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((sentences, tokens))
}
