//! Hop-count analysis of jobs placed on a topology.
//!
//! This module evaluates each job's communication pairs, aggregates the hop
//! counts, and exports the results as CSV, JSON and text reports. It also
//! reads the hop-count statistics produced by the network simulator.

pub mod types;
pub mod aggregator;
pub mod export;
pub mod report;
pub mod sim_stats;

pub use types::*;
pub use aggregator::{analyze_job, analyze_jobs, overall_average, AnalysisError, HopAccumulator};
pub use export::{export_csv, write_csv, CsvLayout, ExportError};
pub use report::{generate_json_report, generate_text_report, print_summary, render_summary};
pub use sim_stats::{
    load_hop_statistics, parse_hop_statistics, SimHopStats, StatsError, StatsFilter,
};
