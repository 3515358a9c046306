//! Boundary and result types.

mod analysis;
mod candidate;

pub use analysis::{StyleAnalysis, StyleMatch};
pub use candidate::{Candidate, Review};
