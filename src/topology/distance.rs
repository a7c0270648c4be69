//! Hop-count distance functions.
//!
//! Every distance includes `NIC_OVERHEAD` for injection and ejection, so two
//! hosts on the same router are 2 hops apart.
//!
//! The Dragonfly function is a tiered minimal-path model rather than a search
//! over the router graph:
//!
//! | relation                          | hops |
//! |-----------------------------------|------|
//! | same router                       | 2    |
//! | same group, different router      | 3    |
//! | groups joined by a global link    | 4    |
//! | anything else (intermediate group)| 5    |
//!
//! Group `g` has a global link to `(g + k * band + 1) mod num_groups` for each
//! `k` in `[0, intergroup_links)`, where `band = num_groups / intergroup_links`.
//! That relation is not symmetric, so neither is the Dragonfly distance.

use super::types::{
    AddressError, DragonflyParams, GridParams, HopCount, NodeAddress, Topology, NIC_OVERHEAD,
};

impl Topology {
    /// Hop count between two addresses produced by this topology.
    pub fn distance(&self, a: &NodeAddress, b: &NodeAddress) -> Result<HopCount, AddressError> {
        match (self, a, b) {
            (
                Topology::Dragonfly(p),
                NodeAddress::Dragonfly { group: g1, router: r1, .. },
                NodeAddress::Dragonfly { group: g2, router: r2, .. },
            ) => Ok(dragonfly_distance(p, (*g1, *r1), (*g2, *r2))),
            (
                Topology::Mesh(_),
                NodeAddress::Grid { x: x1, y: y1, .. },
                NodeAddress::Grid { x: x2, y: y2, .. },
            ) => Ok(mesh_distance((*x1, *y1), (*x2, *y2))),
            (
                Topology::Torus(p),
                NodeAddress::Grid { x: x1, y: y1, .. },
                NodeAddress::Grid { x: x2, y: y2, .. },
            ) => Ok(torus_distance(p, (*x1, *y1), (*x2, *y2))),
            (topology, _, _) => {
                let fits = |address: &NodeAddress| {
                    matches!(
                        (topology, address),
                        (Topology::Dragonfly(_), NodeAddress::Dragonfly { .. })
                            | (Topology::Mesh(_) | Topology::Torus(_), NodeAddress::Grid { .. })
                    )
                };
                let offender = if fits(a) { *b } else { *a };
                Err(AddressError::Mismatch {
                    address: offender,
                    topology: topology.kind_name(),
                })
            }
        }
    }

    /// Hop count between two flat node ids.
    pub fn hop_count(&self, from: usize, to: usize) -> Result<HopCount, AddressError> {
        let a = self.decompose(from)?;
        let b = self.decompose(to)?;
        self.distance(&a, &b)
    }
}

/// Whether `from` has a direct global link to `to`.
pub fn groups_linked(p: &DragonflyParams, from: usize, to: usize) -> bool {
    let band = p.band_size();
    (0..p.intergroup_links).any(|link| (from + link * band + 1) % p.num_groups == to)
}

/// Tiered Dragonfly distance between `(group, router)` pairs.
pub fn dragonfly_distance(
    p: &DragonflyParams,
    (g1, r1): (usize, usize),
    (g2, r2): (usize, usize),
) -> HopCount {
    if g1 == g2 {
        if r1 == r2 {
            NIC_OVERHEAD
        } else {
            NIC_OVERHEAD + 1
        }
    } else if groups_linked(p, g1, g2) {
        NIC_OVERHEAD + 2
    } else {
        NIC_OVERHEAD + 3
    }
}

/// Manhattan distance between router coordinates, no wraparound.
pub fn mesh_distance((x1, y1): (usize, usize), (x2, y2): (usize, usize)) -> HopCount {
    (x1.abs_diff(x2) + y1.abs_diff(y2)) as HopCount + NIC_OVERHEAD
}

/// Manhattan distance on a ring in each axis.
pub fn torus_distance(
    p: &GridParams,
    (x1, y1): (usize, usize),
    (x2, y2): (usize, usize),
) -> HopCount {
    if (x1, y1) == (x2, y2) {
        return NIC_OVERHEAD;
    }
    (ring_delta(x1, x2, p.dim_x) + ring_delta(y1, y2, p.dim_y)) as HopCount + NIC_OVERHEAD
}

fn ring_delta(a: usize, b: usize, dim: usize) -> usize {
    let direct = a.abs_diff(b);
    direct.min(dim - direct)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dragonfly() -> Topology {
        Topology::Dragonfly(DragonflyParams {
            num_groups: 16,
            routers_per_group: 8,
            hosts_per_router: 4,
            intergroup_links: 4,
        })
    }

    fn grid(dim_x: usize, dim_y: usize, hosts_per_router: usize) -> GridParams {
        GridParams {
            dim_x,
            dim_y,
            hosts_per_router,
        }
    }

    #[test]
    fn test_dragonfly_tiers() {
        let topo = dragonfly();
        // same router
        assert_eq!(topo.hop_count(0, 1).unwrap(), 2);
        // same group, different router
        assert_eq!(topo.hop_count(0, 4).unwrap(), 3);
        // group 0 links to groups 1, 5, 9 and 13
        assert_eq!(topo.hop_count(0, 32).unwrap(), 4);
        assert_eq!(topo.hop_count(0, 5 * 32).unwrap(), 4);
        assert_eq!(topo.hop_count(0, 13 * 32 + 7).unwrap(), 4);
        // group 2 needs an intermediate group
        assert_eq!(topo.hop_count(0, 64).unwrap(), 5);
    }

    #[test]
    fn test_dragonfly_link_bands() {
        let p = DragonflyParams {
            num_groups: 16,
            routers_per_group: 8,
            hosts_per_router: 4,
            intergroup_links: 4,
        };
        let linked: Vec<usize> = (0..16).filter(|&g| groups_linked(&p, 15, g)).collect();
        assert_eq!(linked, vec![0, 4, 8, 12]);
        // the link relation is directional
        assert!(groups_linked(&p, 0, 1));
        assert!(!groups_linked(&p, 1, 0));
    }

    #[test]
    fn test_same_router_shortcut() {
        let torus = Topology::Torus(grid(8, 8, 10));
        for (a, b) in [(0, 9), (10, 19), (633, 630)] {
            assert_eq!(torus.hop_count(a, b).unwrap(), 2);
        }
        let topo = dragonfly();
        assert_eq!(topo.hop_count(508, 511).unwrap(), 2);
    }

    #[test]
    fn test_torus_wraparound() {
        let torus = Topology::Torus(grid(4, 4, 1));
        // (0,0) -> (3,0): wrap path of length 1
        assert_eq!(torus.hop_count(0, 3).unwrap(), 3);
        // (0,0) -> (3,3): one step on each axis
        assert_eq!(torus.hop_count(0, 15).unwrap(), 4);
        // (0,0) -> (2,2): halfway on each axis
        assert_eq!(torus.hop_count(0, 10).unwrap(), 6);

        let mesh = Topology::Mesh(grid(4, 4, 1));
        assert_eq!(mesh.hop_count(0, 3).unwrap(), 5);
        assert_eq!(mesh.hop_count(0, 15).unwrap(), 8);
    }

    #[test]
    fn test_grid_symmetry() {
        for topo in [
            Topology::Mesh(grid(5, 3, 2)),
            Topology::Torus(grid(5, 3, 2)),
        ] {
            let total = topo.total_nodes();
            for i in 0..total {
                for j in 0..total {
                    assert_eq!(
                        topo.hop_count(i, j).unwrap(),
                        topo.hop_count(j, i).unwrap(),
                        "{} distance not symmetric for ({}, {})",
                        topo,
                        i,
                        j
                    );
                }
            }
        }
    }

    #[test]
    fn test_mesh_hosts_share_router() {
        let mesh = Topology::Mesh(grid(4, 4, 2));
        assert_eq!(mesh.hop_count(0, 1).unwrap(), 2);
        // node 2 sits on router 1 at (1,0)
        assert_eq!(mesh.hop_count(0, 2).unwrap(), 3);
    }

    #[test]
    fn test_address_mismatch() {
        let mesh = Topology::Mesh(grid(4, 4, 1));
        let df = NodeAddress::Dragonfly { group: 0, router: 0, host: 0 };
        let g = NodeAddress::Grid { x: 0, y: 0, host: 0 };
        assert!(matches!(
            mesh.distance(&g, &df),
            Err(AddressError::Mismatch { address, topology: "mesh" }) if address == df
        ));
        assert!(dragonfly().distance(&g, &g).is_err());
    }

    #[test]
    fn test_out_of_range_pair() {
        let torus = Topology::Torus(grid(4, 4, 1));
        assert_eq!(
            torus.hop_count(0, 16),
            Err(AddressError::OutOfRange { node: 16, total: 16 })
        );
    }
}
