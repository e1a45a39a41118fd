//! Pipeline trait.
use crate::error::Error;

/// This trait must be implemented for each Pipeline,
/// and is generic over the return type so that
/// a pipeline can report what it did (see [super::Summary]).
pub trait Pipeline<T> {
    fn run(&self) -> Result<T, Error>;
}
