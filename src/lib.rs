//! # Hopcount - Topology-aware hop-count analysis for multi-job workloads
//!
//! This library estimates how many network hops the messages of collective
//! communication jobs travel on an interconnect topology, without running a
//! packet-level simulation.
//!
//! ## Overview
//!
//! A scenario names a topology and a list of jobs. Each job occupies a
//! contiguous block of ranks and runs one collective pattern. Ranks are
//! placed onto topology nodes, every communicating pair of a job is turned
//! into a hop count, and the counts are aggregated into a per-job average
//! and, where the counts are small and discrete, a histogram.
//!
//! ## Key Features
//!
//! - **Topologies**: Dragonfly, 2D Mesh and 2D Torus
//! - **Patterns**: Allreduce, Alltoall, Scatter, Bcast, Barrier and PingPong
//! - **Placement**: linear, or seeded random over the whole topology
//! - **Reports**: console summary, CSV table, JSON and text reports
//! - **Simulator comparison**: aggregation of the simulator's own
//!   `hopcountN` statistics
//!
//! ## Architecture
//!
//! - `config`: scenario structures and validation
//! - `config_loader`: YAML loading and CLI overrides
//! - `presets`: built-in scenarios
//! - `topology`: node addressing, distance functions and rank placement
//! - `pattern`: job descriptors and pattern expansion into rank pairs
//! - `analysis`: aggregation, exporters and simulator statistics
//! - `orchestrator`: a complete run from configuration to written reports
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use hopcount::{config_loader, orchestrator};
//!
//! let config = config_loader::load_config(Path::new("scenario.yaml"))?;
//! let (report, files) = orchestrator::run(&config, Path::new("analysis_output"))?;
//!
//! println!("Overall average: {:.2} hops", report.overall_average_hops);
//! println!("CSV table: {}", files.csv.display());
//! # Ok::<(), color_eyre::Report>(())
//! ```
//!
//! ## Configuration Format
//!
//! ```yaml
//! topology:
//!   kind: torus
//!   dim_x: 8
//!   dim_y: 8
//!   hosts_per_router: 10
//! placement:
//!   strategy: linear     # or: random, with seed: 42
//! jobs:
//!   - size: 32
//!     start: 0
//!     pattern: Allreduce
//!     params: "arg.count=2048 arg.iterations=20"
//! ```
//!
//! ## Error Handling
//!
//! Each module defines its own `thiserror` error type. Configuration errors
//! are raised before any hop count is computed, so a failed run never leaves
//! partial output. The loader, orchestrator and binary wrap these errors with
//! `color_eyre` context.

pub mod config;
pub mod config_loader;
pub mod presets;

pub mod topology;
pub mod pattern;
pub mod analysis;
pub mod orchestrator;
