//! Topology type definitions.
//!
//! This file contains the closed set of topology families the analysis
//! engine understands (Dragonfly, 2D Mesh, 2D Torus), the per-node address
//! each of them decomposes into, and the errors raised while addressing.
//!
//! A new family (for example PolarFly, whose routers are addressed by points
//! of a generalized quadrangle) is added as a new `Topology` variant with its
//! own address type and distance function.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of network traversal steps between two endpoints, including the
/// fixed NIC-to-router injection and router-to-NIC ejection.
pub type HopCount = u32;

/// Hops charged for injection plus ejection on every message.
pub const NIC_OVERHEAD: HopCount = 2;

/// Dragonfly parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragonflyParams {
    pub num_groups: usize,
    pub routers_per_group: usize,
    pub hosts_per_router: usize,
    pub intergroup_links: usize,
}

impl DragonflyParams {
    pub fn nodes_per_group(&self) -> usize {
        self.routers_per_group * self.hosts_per_router
    }

    /// Width of each band of groups reachable through one intergroup link.
    pub fn band_size(&self) -> usize {
        self.num_groups / self.intergroup_links
    }
}

/// Parameters shared by the two-dimensional grid families (Mesh and Torus)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridParams {
    pub dim_x: usize,
    pub dim_y: usize,
    pub hosts_per_router: usize,
}

/// Network topology analysed by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Topology {
    /// Groups of fully connected routers joined by intergroup links
    Dragonfly(DragonflyParams),
    /// 2D grid without wraparound links
    Mesh(GridParams),
    /// 2D grid with wraparound links on both axes
    Torus(GridParams),
}

impl Topology {
    /// Short lowercase name of the topology family
    pub fn kind_name(&self) -> &'static str {
        match self {
            Topology::Dragonfly(_) => "dragonfly",
            Topology::Mesh(_) => "mesh",
            Topology::Torus(_) => "torus",
        }
    }

    /// Router count, saturating at `usize::MAX` on overflow
    pub fn total_routers(&self) -> usize {
        self.checked_total_routers().unwrap_or(usize::MAX)
    }

    fn checked_total_routers(&self) -> Option<usize> {
        match self {
            Topology::Dragonfly(p) => p.num_groups.checked_mul(p.routers_per_group),
            Topology::Mesh(p) | Topology::Torus(p) => p.dim_x.checked_mul(p.dim_y),
        }
    }

    pub fn hosts_per_router(&self) -> usize {
        match self {
            Topology::Dragonfly(p) => p.hosts_per_router,
            Topology::Mesh(p) | Topology::Torus(p) => p.hosts_per_router,
        }
    }

    /// Number of addressable compute nodes; valid node ids are `[0, total_nodes)`.
    ///
    /// Saturates at `usize::MAX` when the product overflows; configuration
    /// validation rejects such topologies first.
    pub fn total_nodes(&self) -> usize {
        self.checked_total_nodes().unwrap_or(usize::MAX)
    }

    /// Node count, or `None` when it does not fit in a `usize`
    pub fn checked_total_nodes(&self) -> Option<usize> {
        self.checked_total_routers()?
            .checked_mul(self.hosts_per_router())
    }

    /// Whether hop counts under this topology take few enough distinct values
    /// to be worth reporting as a histogram.
    pub fn reports_histogram(&self) -> bool {
        matches!(self, Topology::Dragonfly(_) | Topology::Torus(_))
    }

    /// One-line human-readable description used in reports
    pub fn summary(&self) -> String {
        match self {
            Topology::Dragonfly(p) => format!(
                "Dragonfly: {} groups x {} routers x {} hosts, {} intergroup links ({} nodes)",
                p.num_groups,
                p.routers_per_group,
                p.hosts_per_router,
                p.intergroup_links,
                self.total_nodes()
            ),
            Topology::Mesh(p) => format!(
                "2D {}x{} Mesh, {} hosts per router ({} nodes)",
                p.dim_x,
                p.dim_y,
                p.hosts_per_router,
                self.total_nodes()
            ),
            Topology::Torus(p) => format!(
                "2D {}x{} Torus, {} hosts per router ({} nodes)",
                p.dim_x,
                p.dim_y,
                p.hosts_per_router,
                self.total_nodes()
            ),
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind_name())
    }
}

/// Position of a node within its topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeAddress {
    Dragonfly { group: usize, router: usize, host: usize },
    /// Mesh or Torus router coordinate plus the host index on that router
    Grid { x: usize, y: usize, host: usize },
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeAddress::Dragonfly { group, router, host } => {
                write!(f, "({},{},{})", group, router, host)
            }
            NodeAddress::Grid { x, y, .. } => write!(f, "({},{})", x, y),
        }
    }
}

/// Errors raised while decomposing node ids or comparing addresses
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("Node {node} is outside the topology (valid ids are 0..{total})")]
    OutOfRange { node: usize, total: usize },
    #[error("Address {address} does not belong to a {topology} topology")]
    Mismatch {
        address: NodeAddress,
        topology: &'static str,
    },
    #[error("Cannot place {ranks} ranks on a topology with {total} nodes")]
    Capacity { ranks: usize, total: usize },
}
