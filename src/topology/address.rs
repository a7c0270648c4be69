//! Router address decomposition.
//!
//! Node ids are contiguous in `[0, total_nodes)`. Hosts attached to the same
//! router are numbered consecutively, routers of a Dragonfly group are
//! consecutive, and grid routers are numbered row by row (x varies fastest).

use super::types::{AddressError, DragonflyParams, GridParams, NodeAddress, Topology};

impl Topology {
    /// Decomposes a flat node id into its topology-specific address.
    pub fn decompose(&self, node: usize) -> Result<NodeAddress, AddressError> {
        let total = self.total_nodes();
        if node >= total {
            return Err(AddressError::OutOfRange { node, total });
        }

        Ok(match self {
            Topology::Dragonfly(p) => dragonfly_address(p, node),
            Topology::Mesh(p) | Topology::Torus(p) => grid_address(p, node),
        })
    }

    /// Flat id of the router a node is attached to.
    pub fn router_of(&self, node: usize) -> Result<usize, AddressError> {
        let total = self.total_nodes();
        if node >= total {
            return Err(AddressError::OutOfRange { node, total });
        }
        Ok(node / self.hosts_per_router())
    }
}

pub(crate) fn dragonfly_address(p: &DragonflyParams, node: usize) -> NodeAddress {
    let nodes_per_group = p.nodes_per_group();
    NodeAddress::Dragonfly {
        group: node / nodes_per_group,
        router: (node % nodes_per_group) / p.hosts_per_router,
        host: node % p.hosts_per_router,
    }
}

pub(crate) fn grid_address(p: &GridParams, node: usize) -> NodeAddress {
    let router_id = node / p.hosts_per_router;
    NodeAddress::Grid {
        x: router_id % p.dim_x,
        y: router_id / p.dim_x,
        host: node % p.hosts_per_router,
    }
}
