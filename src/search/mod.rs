//! Search result processing.
//!
//! Turns raw peer responses into ordered download candidates.

mod ranker;

pub use ranker::{filter, rank, Candidate, LOSSLESS_FORMATS};
