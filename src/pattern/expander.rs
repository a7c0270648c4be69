//! Pattern expansion.
//!
//! Maps a job to the communicating rank pairs its collective implies, or, for
//! `Barrier`, to an analytic hop estimate. Barrier control messages travel a
//! reduction tree rather than point-to-point pairs, so it never produces pairs.

use super::job::{Job, Pattern};

/// The ordered rank pairs a pairwise pattern implies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairSet {
    /// Every ordered `(i, j)` with `i != j` in `start..start + size`
    AllPairs { start: usize, size: usize },
    /// `(root, j)` for every other `j` in `start..start + size`
    Rooted { root: usize, start: usize, size: usize },
    /// A single exchange between two ranks
    Single { from: usize, to: usize },
}

impl PairSet {
    /// Number of pairs the set yields
    pub fn len(&self) -> usize {
        match *self {
            PairSet::AllPairs { size, .. } => size * size.saturating_sub(1),
            PairSet::Rooted { size, .. } => size.saturating_sub(1),
            PairSet::Single { .. } => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lazily enumerates the pairs.
    pub fn iter(&self) -> Box<dyn Iterator<Item = (usize, usize)> + Send + '_> {
        match *self {
            PairSet::AllPairs { start, size } => {
                let ranks = start..start + size;
                Box::new(ranks.clone().flat_map(move |i| {
                    ranks.clone().filter(move |&j| j != i).map(move |j| (i, j))
                }))
            }
            PairSet::Rooted { root, start, size } => Box::new(
                (start..start + size)
                    .filter(move |&j| j != root)
                    .map(move |j| (root, j)),
            ),
            PairSet::Single { from, to } => Box::new(std::iter::once((from, to))),
        }
    }
}

/// Result of expanding a job
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expansion {
    Pairs(PairSet),
    /// Hop estimate that does not come from pairwise distances
    Analytic(f64),
}

/// Expands a job into its pair set or analytic estimate.
pub fn expand(job: &Job) -> Expansion {
    match job.pattern {
        Pattern::Allreduce | Pattern::Alltoall => Expansion::Pairs(PairSet::AllPairs {
            start: job.start,
            size: job.size,
        }),
        Pattern::Scatter | Pattern::Bcast => Expansion::Pairs(PairSet::Rooted {
            root: job.root,
            start: job.start,
            size: job.size,
        }),
        Pattern::PingPong => Expansion::Pairs(PairSet::Single {
            from: job.start,
            to: job.start + 1,
        }),
        Pattern::Barrier => Expansion::Analytic(barrier_hops(job.size)),
    }
}

/// Tree-barrier control depth: `2 * (log2(size) + 1)`.
pub fn barrier_hops(size: usize) -> f64 {
    2.0 * ((size as f64).log2() + 1.0)
}
