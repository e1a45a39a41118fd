/*! Filtering utilities

Filters operate on document or paragraph level.

- [record] holds the document-level exclusion rules, evaluated as a table in precedence order (first match wins).
  They only read document metadata and are pure: they can be called from any worker without synchronization.
- [paragraph] removes empty and boilerplate paragraphs (player notices, login prompts, share buttons...).

Filters implement [filter::Filter].
! */
mod decision;
mod filter;
pub mod paragraph;
pub mod record;

pub use decision::{FilterDecision, RejectReason};
pub use filter::Filter;
pub use paragraph::clean_paragraphs;
pub use record::{decide, DocumentFilter};
