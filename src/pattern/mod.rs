//! Jobs and collective pattern expansion.

pub mod job;
pub mod expander;

pub use job::{Job, JobParams, Pattern, PatternError, UnknownPattern};
pub use expander::{barrier_hops, expand, Expansion, PairSet};
