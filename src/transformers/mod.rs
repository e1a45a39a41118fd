/*! Document transformers.

Transforms raw documents into normalized records.

!*/

mod normalize;
mod transform;

pub use normalize::Normalizer;
pub use transform::Transform;
