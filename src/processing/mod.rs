/*! Content processing

Contains functions that operate on an already extracted corpus:
packaging it for distribution and computing statistics.
!*/
pub mod package;
pub mod stats;

pub use package::{package, Exclusions, PackageReport};
pub use stats::{corpus_stats, stats, SiteStats};
