//! Analysis modules.
//!
//! Aggregation of raw occurrences and the ranked projections built on top.

pub mod aggregator;
pub mod ranking;

pub use aggregator::*;
pub use ranking::*;
