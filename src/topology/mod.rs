//! Network topology module.
//!
//! This module contains the topology address model, the per-family hop-count
//! distance functions, and the placement of job ranks onto topology nodes.

pub mod types;
pub mod address;
pub mod distance;
pub mod distribution;

// Re-export key types and functions for easier access
pub use types::{
    AddressError, DragonflyParams, GridParams, HopCount, NodeAddress, Topology, NIC_OVERHEAD,
};
pub use distance::{dragonfly_distance, groups_linked, mesh_distance, torus_distance};
pub use distribution::{distribute_ranks, Placement, PlacementStrategy};
