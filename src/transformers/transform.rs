//! Transform trait.
use crate::error::Error;

pub trait Transform<I, O> {
    /// Builds a new `O` from a borrowed `I`, leaving the input untouched.
    fn transform(&self, input: &I) -> Result<O, Error>;
}
