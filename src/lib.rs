/*! # motext

Builds a multilingual news text corpus out of a document store (or of dumped documents), and queries it.

- [sources] reads raw documents, split in per-site shards read in batches,
- [filtering] decides which documents are kept, and why the others are not,
- [transformers] turns accepted documents into [document::NormalizedRecord]s, using [segmentation] models,
- [pipelines] ties the above together in a concurrent extraction run,
- [query] searches and extracts text units from an extracted corpus,
- [processing] packages and computes statistics of an extracted corpus.
!*/
pub mod config;
pub mod document;
pub mod error;
pub mod filtering;
pub mod pipelines;
pub mod processing;
pub mod query;
pub mod segmentation;
pub mod sources;
pub mod transformers;
