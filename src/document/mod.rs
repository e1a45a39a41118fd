/*! Document types

Raw documents as they come out of the document store, and the normalized records that get written to the corpus.

- [RawDocument] is read-only once fetched: several workers can hold the same batch.
- [NormalizedRecord] is created once per accepted [RawDocument] and is immutable afterwards.
!*/
mod content_type;
mod raw;
mod record;
mod site;

pub use content_type::ContentType;
pub use raw::{parse_date, RawDocument};
pub use record::NormalizedRecord;
pub use site::SiteCode;
