//! Pipelines.
//!
//! The extraction pipeline is implemented here, and the module
//! provides a light [pipeline::Pipeline] trait that enables easy and flexible pipeline creation.
mod cancel;
pub mod extraction;
#[allow(clippy::module_inception)]
pub mod pipeline;

pub use cancel::CancelFlag;
pub use extraction::{Extraction, Summary};
pub use pipeline::Pipeline;
