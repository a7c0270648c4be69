//! Core data types for hop-count analysis.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

use crate::pattern::{JobParams, Pattern};
use crate::topology::{HopCount, Topology};

/// Occurrences of each exact hop count, ordered by hop count
pub type HopHistogram = BTreeMap<HopCount, u64>;

/// Aggregated hop counts for one job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: usize,
    pub pattern: Pattern,
    pub start: usize,
    pub size: usize,
    pub average_hops: f64,
    /// Number of evaluated pairs; 0 for analytic estimates
    pub pair_count: u64,
    /// Present only when the topology's hop counts are small and discrete
    /// and the job was evaluated pairwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub histogram: Option<HopHistogram>,
    /// True when `average_hops` is a formula rather than a pair average
    pub analytic: bool,
    #[serde(default, skip_serializing_if = "JobParams::is_empty")]
    pub params: JobParams,
}

/// Report metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub analysis_timestamp: String,
    pub topology: Topology,
    pub topology_summary: String,
    pub placement: String,
    pub total_jobs: usize,
    pub total_ranks: usize,
}

/// Complete analysis output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub metadata: AnalysisMetadata,
    pub jobs: Vec<JobResult>,
    /// Unweighted mean of the per-job averages
    pub overall_average_hops: f64,
}

impl AnalysisReport {
    /// Sorted union of hop counts over every job histogram
    pub fn hop_buckets(&self) -> Vec<HopCount> {
        let mut buckets: Vec<HopCount> = self
            .jobs
            .iter()
            .filter_map(|j| j.histogram.as_ref())
            .flat_map(|h| h.keys().copied())
            .collect();
        buckets.sort_unstable();
        buckets.dedup();
        buckets
    }
}
