//! Built-in analysis scenarios.
//!
//! These reproduce the multi-job workloads that were configured for the
//! simulator runs, so the analytic hop counts can be compared with the
//! simulator's own statistics without writing a configuration file.

use color_eyre::eyre::eyre;
use color_eyre::Result;

use crate::config::Config;
use crate::config_loader::load_config_str;

/// Names accepted by [`preset`]
pub const PRESET_NAMES: [&str; 3] = ["dragonfly", "torus", "mesh"];

const DRAGONFLY: &str = r#"
topology:
  kind: dragonfly
  num_groups: 16
  routers_per_group: 8
  hosts_per_router: 4
  intergroup_links: 4
jobs:
  - size: 16
    start: 0
    pattern: Allreduce
    params: "arg.count=512 arg.iterations=1 arg.compute=1"
  - size: 64
    start: 16
    pattern: Alltoall
    params: "arg.bytes=512 arg.iterations=1 arg.compute=1"
  - size: 32
    start: 80
    pattern: Scatter
    params: "arg.root=0 arg.count=512 arg.iterations=1 arg.compute=1"
  - size: 64
    start: 112
    pattern: Bcast
    params: "arg.root=0 arg.count=512 arg.iterations=1 arg.compute=1"
"#;

const TORUS: &str = r#"
topology:
  kind: torus
  dim_x: 8
  dim_y: 8
  hosts_per_router: 10
jobs:
  - size: 32
    start: 0
    pattern: Allreduce
  - size: 64
    start: 32
    pattern: Alltoall
  - size: 128
    start: 96
    pattern: Scatter
  - size: 256
    start: 224
    pattern: Bcast
"#;

// 256 ranks scattered over the 1024 mesh routers
const MESH: &str = r#"
topology:
  kind: mesh
  dim_x: 32
  dim_y: 32
  hosts_per_router: 1
placement:
  strategy: random
  seed: 42
output:
  layout: per_rank
jobs:
  - size: 32
    start: 0
    pattern: Allreduce
    params: "arg.count=2048 arg.iterations=20 arg.compute=50ns"
  - size: 60
    start: 32
    pattern: Alltoall
    params: "arg.bytes=1024 arg.iterations=10 arg.compute=100ns"
  - size: 64
    start: 92
    pattern: Barrier
    params: "arg.iterations=30"
  - size: 32
    start: 156
    pattern: Scatter
    params: "arg.root=0 arg.count=4096 arg.iterations=5 arg.compute=150ns"
  - size: 66
    start: 188
    pattern: Bcast
    params: "arg.root=0 arg.count=8192 arg.iterations=8 arg.compute=75ns"
  - size: 2
    start: 254
    pattern: PingPong
    params: "arg.messageSize=1024 arg.iterations=15 arg.rank2=1"
"#;

/// Returns the named built-in scenario
pub fn preset(name: &str) -> Result<Config> {
    let yaml = match name {
        "dragonfly" => DRAGONFLY,
        "torus" => TORUS,
        "mesh" => MESH,
        other => {
            return Err(eyre!(
                "Unknown preset '{}' (available: {})",
                other,
                PRESET_NAMES.join(", ")
            ))
        }
    };
    load_config_str(yaml)
}
