//! Rank placement across topology nodes.
//!
//! Jobs address their participants by rank. Before any distance is computed,
//! ranks are mapped onto physical node ids with one of two strategies:
//!
//! - **Linear**: rank `r` runs on node `r` (the Dragonfly and Torus scenarios)
//! - **Random**: ranks are scattered over distinct nodes sampled without
//!   replacement from the whole topology (the Mesh scenario)
//!
//! The random strategy always carries its own seed, so a placement is a pure
//! function of `(strategy, rank_count, total_nodes)`.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::AddressError;

/// Strategy for mapping ranks onto nodes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum PlacementStrategy {
    /// Rank r is node r
    #[default]
    Linear,
    /// Distinct nodes sampled with a seeded generator
    Random { seed: u64 },
}

impl fmt::Display for PlacementStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementStrategy::Linear => write!(f, "linear"),
            PlacementStrategy::Random { seed } => write!(f, "random (seed {})", seed),
        }
    }
}

/// Resolved rank-to-node table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    strategy: PlacementStrategy,
    nodes: Vec<usize>,
}

impl Placement {
    /// Number of placed ranks
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn strategy(&self) -> PlacementStrategy {
        self.strategy
    }

    /// Node id hosting `rank`, or `None` if the rank was never placed.
    pub fn node_of(&self, rank: usize) -> Option<usize> {
        self.nodes.get(rank).copied()
    }

    /// Node ids hosting ranks `start..start + size`.
    pub fn nodes_for(&self, start: usize, size: usize) -> Option<&[usize]> {
        self.nodes.get(start..start.checked_add(size)?)
    }
}

/// Places `rank_count` ranks onto a topology with `total_nodes` nodes.
///
/// # Arguments
///
/// * `strategy` - Placement strategy to use
/// * `rank_count` - Number of ranks to place (ranks `0..rank_count`)
/// * `total_nodes` - Number of addressable nodes in the topology
///
/// # Returns
///
/// * The rank-to-node table, or `AddressError::Capacity` if there are more
///   ranks than nodes
pub fn distribute_ranks(
    strategy: PlacementStrategy,
    rank_count: usize,
    total_nodes: usize,
) -> Result<Placement, AddressError> {
    if rank_count > total_nodes {
        return Err(AddressError::Capacity {
            ranks: rank_count,
            total: total_nodes,
        });
    }

    let nodes = match strategy {
        PlacementStrategy::Linear => {
            info!("Placing {} ranks linearly", rank_count);
            distribute_linear(rank_count)
        }
        PlacementStrategy::Random { seed } => {
            info!(
                "Placing {} ranks randomly over {} nodes (seed {})",
                rank_count, total_nodes, seed
            );
            distribute_random(rank_count, total_nodes, seed)
        }
    };

    Ok(Placement { strategy, nodes })
}

fn distribute_linear(rank_count: usize) -> Vec<usize> {
    (0..rank_count).collect()
}

/// Samples `rank_count` distinct nodes; the order of the sample is the rank order.
fn distribute_random(rank_count: usize, total_nodes: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    let nodes = rand::seq::index::sample(&mut rng, total_nodes, rank_count).into_vec();
    for (rank, node) in nodes.iter().enumerate().take(4) {
        debug!("Rank {} -> node {}", rank, node);
    }
    nodes
}
