//! Per-job hop-count aggregation.
//!
//! Each job is expanded into its pair set, every pair's ranks are mapped to
//! nodes through the placement, and the resulting distances are summed into
//! an average and, for Dragonfly and Torus, a histogram. Jobs are independent
//! and are analysed in parallel.

use rayon::prelude::*;

use super::types::{HopHistogram, JobResult};
use crate::pattern::{expand, Expansion, Job, PairSet};
use crate::topology::{AddressError, HopCount, Placement, Topology};

/// Errors raised while evaluating a job
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("Job {job_id}: rank {rank} has no placed node")]
    Unplaced { job_id: usize, rank: usize },
    #[error("Job {job_id}: {source}")]
    Address {
        job_id: usize,
        #[source]
        source: AddressError,
    },
}

/// Running sum of hop counts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HopAccumulator {
    total_hops: u64,
    pair_count: u64,
    histogram: Option<HopHistogram>,
}

impl HopAccumulator {
    pub fn new(with_histogram: bool) -> Self {
        Self {
            total_hops: 0,
            pair_count: 0,
            histogram: with_histogram.then(HopHistogram::new),
        }
    }

    pub fn record(&mut self, hops: HopCount) {
        self.total_hops += u64::from(hops);
        self.pair_count += 1;
        if let Some(histogram) = self.histogram.as_mut() {
            *histogram.entry(hops).or_insert(0) += 1;
        }
    }

    pub fn pair_count(&self) -> u64 {
        self.pair_count
    }

    /// Mean hop count; 0 when nothing was recorded
    pub fn average(&self) -> f64 {
        if self.pair_count == 0 {
            0.0
        } else {
            self.total_hops as f64 / self.pair_count as f64
        }
    }

    pub fn into_histogram(self) -> Option<HopHistogram> {
        self.histogram
    }
}

/// Analyse a single job.
pub fn analyze_job(
    job: &Job,
    topology: &Topology,
    placement: &Placement,
) -> Result<JobResult, AnalysisError> {
    let result = match expand(job) {
        Expansion::Pairs(pairs) => analyze_pairs(job, &pairs, topology, placement)?,
        Expansion::Analytic(hops) => JobResult {
            job_id: job.id,
            pattern: job.pattern,
            start: job.start,
            size: job.size,
            average_hops: hops,
            pair_count: 0,
            histogram: None,
            analytic: true,
            params: job.params.clone(),
        },
    };

    log::debug!(
        "Job {} ({}, size {}): average {:.2} hops over {} pairs",
        result.job_id,
        result.pattern,
        result.size,
        result.average_hops,
        result.pair_count
    );

    Ok(result)
}

fn analyze_pairs(
    job: &Job,
    pairs: &PairSet,
    topology: &Topology,
    placement: &Placement,
) -> Result<JobResult, AnalysisError> {
    let node_of = |rank: usize| {
        placement.node_of(rank).ok_or(AnalysisError::Unplaced {
            job_id: job.id,
            rank,
        })
    };

    let mut acc = HopAccumulator::new(topology.reports_histogram());
    for (from, to) in pairs.iter() {
        let hops = topology
            .hop_count(node_of(from)?, node_of(to)?)
            .map_err(|source| AnalysisError::Address {
                job_id: job.id,
                source,
            })?;
        acc.record(hops);
    }

    Ok(JobResult {
        job_id: job.id,
        pattern: job.pattern,
        start: job.start,
        size: job.size,
        average_hops: acc.average(),
        pair_count: acc.pair_count(),
        histogram: acc.into_histogram(),
        analytic: false,
        params: job.params.clone(),
    })
}

/// Analyse every job in parallel; results keep the job-list order.
pub fn analyze_jobs(
    jobs: &[Job],
    topology: &Topology,
    placement: &Placement,
) -> Result<Vec<JobResult>, AnalysisError> {
    log::info!("Analysing {} jobs on a {} topology", jobs.len(), topology);

    let results = jobs
        .par_iter()
        .map(|job| analyze_job(job, topology, placement))
        .collect::<Result<Vec<_>, _>>()?;

    let pairs: u64 = results.iter().map(|r| r.pair_count).sum();
    log::info!("Evaluated {} pairs across {} jobs", pairs, results.len());

    Ok(results)
}

/// Arithmetic mean of the per-job averages, every job weighted equally
/// regardless of its pair count. 0 for an empty list.
pub fn overall_average(results: &[JobResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    results.iter().map(|r| r.average_hops).sum::<f64>() / results.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{JobParams, Pattern};
    use crate::topology::{distribute_ranks, DragonflyParams, GridParams, PlacementStrategy};

    fn job(id: usize, pattern: Pattern, start: usize, size: usize) -> Job {
        Job::new(id, pattern, start, size, JobParams::default()).unwrap()
    }

    fn linear(topology: &Topology) -> Placement {
        distribute_ranks(PlacementStrategy::Linear, topology.total_nodes(), topology.total_nodes())
            .unwrap()
    }

    fn square_mesh() -> Topology {
        Topology::Mesh(GridParams {
            dim_x: 2,
            dim_y: 2,
            hosts_per_router: 1,
        })
    }

    #[test]
    fn test_mesh_worked_example() {
        let topology = square_mesh();
        let result =
            analyze_job(&job(1, Pattern::Allreduce, 0, 4), &topology, &linear(&topology)).unwrap();

        assert_eq!(result.pair_count, 12);
        // 8 neighbour pairs at 3 hops and 4 diagonal pairs at 4 hops
        assert!((result.average_hops - 40.0 / 12.0).abs() < 1e-12);
        assert_eq!(format!("{:.2}", result.average_hops), "3.33");
        assert!(result.histogram.is_none());
    }

    #[test]
    fn test_dragonfly_histogram() {
        let topology = Topology::Dragonfly(DragonflyParams {
            num_groups: 16,
            routers_per_group: 8,
            hosts_per_router: 4,
            intergroup_links: 4,
        });
        let placement = linear(&topology);
        // Bcast from node 0 over one full router plus the next one
        let result = analyze_job(&job(1, Pattern::Bcast, 0, 8), &topology, &placement).unwrap();

        let histogram = result.histogram.unwrap();
        assert_eq!(histogram.get(&2), Some(&3));
        assert_eq!(histogram.get(&3), Some(&4));
        assert_eq!(histogram.values().sum::<u64>(), result.pair_count);
        assert!((result.average_hops - 18.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_torus_histogram_matches_pairs() {
        let topology = Topology::Torus(GridParams {
            dim_x: 8,
            dim_y: 8,
            hosts_per_router: 10,
        });
        let result = analyze_job(
            &job(1, Pattern::Allreduce, 0, 32),
            &topology,
            &linear(&topology),
        )
        .unwrap();

        assert_eq!(result.pair_count, 32 * 31);
        let histogram = result.histogram.unwrap();
        assert_eq!(histogram.values().sum::<u64>(), 32 * 31);
        // 10 hosts per router: 3 routers of 10 plus 2 hosts on a fourth
        let same_router = 3 * 10 * 9 + 2;
        assert_eq!(histogram.get(&2), Some(&same_router));
    }

    #[test]
    fn test_barrier_has_no_histogram() {
        let topology = Topology::Torus(GridParams {
            dim_x: 4,
            dim_y: 4,
            hosts_per_router: 1,
        });
        let result =
            analyze_job(&job(3, Pattern::Barrier, 0, 16), &topology, &linear(&topology)).unwrap();
        assert!(result.analytic);
        assert_eq!(result.pair_count, 0);
        assert!(result.histogram.is_none());
        assert!((result.average_hops - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_ping_pong() {
        let topology = Topology::Torus(GridParams {
            dim_x: 4,
            dim_y: 4,
            hosts_per_router: 1,
        });
        let result =
            analyze_job(&job(6, Pattern::PingPong, 2, 2), &topology, &linear(&topology)).unwrap();
        assert_eq!(result.pair_count, 1);
        assert_eq!(result.average_hops, 3.0);
    }

    #[test]
    fn test_random_placement_changes_nodes() {
        let topology = Topology::Mesh(GridParams {
            dim_x: 32,
            dim_y: 32,
            hosts_per_router: 1,
        });
        let placement =
            distribute_ranks(PlacementStrategy::Random { seed: 42 }, 2, 1024).unwrap();
        let result = analyze_job(&job(1, Pattern::PingPong, 0, 2), &topology, &placement).unwrap();

        let a = placement.node_of(0).unwrap();
        let b = placement.node_of(1).unwrap();
        assert_eq!(result.average_hops, topology.hop_count(a, b).unwrap() as f64);
    }

    #[test]
    fn test_unplaced_rank() {
        let topology = square_mesh();
        let placement = distribute_ranks(PlacementStrategy::Linear, 2, 4).unwrap();
        let err = analyze_job(&job(5, Pattern::Alltoall, 0, 3), &topology, &placement).unwrap_err();
        assert_eq!(err, AnalysisError::Unplaced { job_id: 5, rank: 2 });
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let topology = Topology::Dragonfly(DragonflyParams {
            num_groups: 16,
            routers_per_group: 8,
            hosts_per_router: 4,
            intergroup_links: 4,
        });
        let placement = linear(&topology);
        let jobs = vec![
            job(1, Pattern::Allreduce, 0, 16),
            job(2, Pattern::Alltoall, 16, 64),
            job(3, Pattern::Scatter, 80, 32),
        ];
        let first = analyze_jobs(&jobs, &topology, &placement).unwrap();
        let second = analyze_jobs(&jobs, &topology, &placement).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.iter().map(|r| r.job_id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_overall_average_is_unweighted() {
        let topology = square_mesh();
        let placement = linear(&topology);
        let jobs = vec![
            job(1, Pattern::Allreduce, 0, 4),
            job(2, Pattern::PingPong, 0, 2),
        ];
        let results = analyze_jobs(&jobs, &topology, &placement).unwrap();

        // (40/12 + 3) / 2, not (40 + 3) / 13
        let expected = (40.0 / 12.0 + 3.0) / 2.0;
        assert!((overall_average(&results) - expected).abs() < 1e-12);
        assert_eq!(overall_average(&[]), 0.0);
    }

    #[test]
    fn test_accumulator_empty() {
        let acc = HopAccumulator::new(true);
        assert_eq!(acc.average(), 0.0);
        assert_eq!(acc.into_histogram(), Some(HopHistogram::new()));
    }
}
