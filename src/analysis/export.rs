//! CSV export of job results.
//!
//! Two layouts are supported:
//!
//! - **per_job**: `Job ID,Pattern,Size,Avg Hop Count,<h1>,<h2>,...` with one
//!   column per hop count seen in any histogram; a job without that bucket
//!   (or without a histogram at all) leaves the cell empty. The job column
//!   reads `Job <id>`.
//! - **per_rank**: `Job ID,Pattern,Size,Avg Hop Count,Rank,Coordinates` with
//!   one row per participating rank, keyed by the bare job id. Every row of a
//!   job repeats that job's aggregate average; no per-rank distance is
//!   computed.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::types::AnalysisReport;
use crate::topology::{AddressError, Placement, Topology};

/// Row granularity of the CSV table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CsvLayout {
    #[value(name = "per_job")]
    PerJob,
    #[value(name = "per_rank")]
    PerRank,
}

impl CsvLayout {
    /// Per-rank coordinates for Mesh, hop-count buckets for the others
    pub fn default_for(topology: &Topology) -> Self {
        match topology {
            Topology::Mesh(_) => CsvLayout::PerRank,
            Topology::Dragonfly(_) | Topology::Torus(_) => CsvLayout::PerJob,
        }
    }
}

/// CSV export errors
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Job {job_id}, rank {rank}: no placed node")]
    Unplaced { job_id: usize, rank: usize },
    #[error(transparent)]
    Address(#[from] AddressError),
}

/// Quote a field if it contains a separator, quote or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn write_row<W: Write>(writer: &mut W, cells: &[String]) -> io::Result<()> {
    let line: Vec<String> = cells.iter().map(|c| csv_field(c)).collect();
    writeln!(writer, "{}", line.join(","))
}

fn base_header() -> Vec<String> {
    ["Job ID", "Pattern", "Size", "Avg Hop Count"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Write the table in `layout` to any writer.
///
/// I/O failures are returned unwrapped; [`export_csv`] attaches the path.
pub fn write_csv<W: Write>(
    writer: &mut W,
    report: &AnalysisReport,
    layout: CsvLayout,
    topology: &Topology,
    placement: &Placement,
) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: PathBuf::from("<writer>"),
        source,
    };

    match layout {
        CsvLayout::PerJob => {
            let buckets = report.hop_buckets();
            let mut header = base_header();
            header.extend(buckets.iter().map(|h| h.to_string()));
            write_row(writer, &header).map_err(io_err)?;

            for job in &report.jobs {
                let mut row = vec![
                    format!("Job {}", job.job_id),
                    job.pattern.to_string(),
                    job.size.to_string(),
                    format!("{:.2}", job.average_hops),
                ];
                for bucket in &buckets {
                    let cell = job
                        .histogram
                        .as_ref()
                        .and_then(|h| h.get(bucket))
                        .map(|count| count.to_string())
                        .unwrap_or_default();
                    row.push(cell);
                }
                write_row(writer, &row).map_err(io_err)?;
            }
        }
        CsvLayout::PerRank => {
            let mut header = base_header();
            header.push("Rank".to_string());
            header.push("Coordinates".to_string());
            write_row(writer, &header).map_err(io_err)?;

            for job in &report.jobs {
                let average = format!("{:.2}", job.average_hops);
                for offset in 0..job.size {
                    let rank = job.start + offset;
                    let node = placement.node_of(rank).ok_or(ExportError::Unplaced {
                        job_id: job.job_id,
                        rank,
                    })?;
                    let address = topology.decompose(node)?;
                    let row = vec![
                        job.job_id.to_string(),
                        job.pattern.to_string(),
                        job.size.to_string(),
                        average.clone(),
                        offset.to_string(),
                        address.to_string(),
                    ];
                    write_row(writer, &row).map_err(io_err)?;
                }
            }
        }
    }

    Ok(())
}

/// Write the CSV table to `path`.
///
/// The file is created (truncating any previous content), written through a
/// buffer and flushed before returning; it is closed on every exit path.
pub fn export_csv(
    path: &Path,
    report: &AnalysisReport,
    layout: CsvLayout,
    topology: &Topology,
    placement: &Placement,
) -> Result<(), ExportError> {
    let with_path = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(with_path)?;
    let mut writer = BufWriter::new(file);

    match write_csv(&mut writer, report, layout, topology, placement) {
        Err(ExportError::Io { source, .. }) => return Err(with_path(source)),
        other => other?,
    }
    writer.flush().map_err(with_path)?;

    log::info!("CSV table written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::{AnalysisMetadata, HopHistogram, JobResult};
    use crate::pattern::{JobParams, Pattern};
    use crate::topology::{distribute_ranks, GridParams, PlacementStrategy};

    fn result(
        job_id: usize,
        pattern: Pattern,
        start: usize,
        size: usize,
        avg: f64,
        hist: Option<Vec<(u32, u64)>>,
    ) -> JobResult {
        JobResult {
            job_id,
            pattern,
            start,
            size,
            average_hops: avg,
            pair_count: 0,
            histogram: hist.map(|h| h.into_iter().collect::<HopHistogram>()),
            analytic: false,
            params: JobParams::default(),
        }
    }

    fn report(topology: Topology, jobs: Vec<JobResult>) -> AnalysisReport {
        AnalysisReport {
            metadata: AnalysisMetadata {
                analysis_timestamp: "2026-01-01T00:00:00+00:00".to_string(),
                topology,
                topology_summary: topology.summary(),
                placement: "linear".to_string(),
                total_jobs: jobs.len(),
                total_ranks: jobs.iter().map(|j| j.size).sum(),
            },
            jobs,
            overall_average_hops: 0.0,
        }
    }

    fn render(
        report: &AnalysisReport,
        layout: CsvLayout,
        topology: &Topology,
        placement: &Placement,
    ) -> String {
        let mut out = Vec::new();
        write_csv(&mut out, report, layout, topology, placement).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_per_job_missing_buckets_are_empty() {
        let topology = Topology::Torus(GridParams {
            dim_x: 4,
            dim_y: 4,
            hosts_per_router: 1,
        });
        let placement = distribute_ranks(PlacementStrategy::Linear, 16, 16).unwrap();
        let report = report(
            topology,
            vec![
                result(1, Pattern::Allreduce, 0, 4, 3.5, Some(vec![(3, 8), (4, 4)])),
                result(2, Pattern::Scatter, 4, 4, 10.0 / 3.0, Some(vec![(2, 1), (3, 2)])),
                result(3, Pattern::Barrier, 8, 8, 8.0, None),
            ],
        );

        let csv = render(&report, CsvLayout::PerJob, &topology, &placement);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Job ID,Pattern,Size,Avg Hop Count,2,3,4");
        assert_eq!(lines[1], "Job 1,Allreduce,4,3.50,,8,4");
        assert_eq!(lines[2], "Job 2,Scatter,4,3.33,1,2,");
        assert_eq!(lines[3], "Job 3,Barrier,8,8.00,,,");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_per_rank_repeats_job_average() {
        let topology = Topology::Mesh(GridParams {
            dim_x: 2,
            dim_y: 2,
            hosts_per_router: 1,
        });
        let placement = distribute_ranks(PlacementStrategy::Linear, 4, 4).unwrap();
        let report = report(
            topology,
            vec![result(1, Pattern::Allreduce, 0, 4, 40.0 / 12.0, None)],
        );

        let csv = render(&report, CsvLayout::PerRank, &topology, &placement);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Job ID,Pattern,Size,Avg Hop Count,Rank,Coordinates");
        assert_eq!(lines[1], "1,Allreduce,4,3.33,0,\"(0,0)\"");
        assert_eq!(lines[2], "1,Allreduce,4,3.33,1,\"(1,0)\"");
        assert_eq!(lines[3], "1,Allreduce,4,3.33,2,\"(0,1)\"");
        assert_eq!(lines[4], "1,Allreduce,4,3.33,3,\"(1,1)\"");
    }

    #[test]
    fn test_per_rank_unplaced() {
        let topology = Topology::Mesh(GridParams {
            dim_x: 2,
            dim_y: 2,
            hosts_per_router: 1,
        });
        let placement = distribute_ranks(PlacementStrategy::Linear, 2, 4).unwrap();
        let report = report(topology, vec![result(1, Pattern::Allreduce, 0, 4, 1.0, None)]);
        let mut out = Vec::new();
        let err =
            write_csv(&mut out, &report, CsvLayout::PerRank, &topology, &placement).unwrap_err();
        assert!(matches!(err, ExportError::Unplaced { job_id: 1, rank: 2 }));
    }

    #[test]
    fn test_export_csv_reports_path() {
        let topology = Topology::Mesh(GridParams {
            dim_x: 2,
            dim_y: 2,
            hosts_per_router: 1,
        });
        let placement = distribute_ranks(PlacementStrategy::Linear, 4, 4).unwrap();
        let report = report(topology, vec![]);
        let path = Path::new("/nonexistent-dir/table.csv");
        let err = export_csv(path, &report, CsvLayout::PerJob, &topology, &placement).unwrap_err();
        assert!(err.to_string().contains("/nonexistent-dir/table.csv"));
    }

    #[test]
    fn test_export_csv_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        let topology = Topology::Torus(GridParams {
            dim_x: 4,
            dim_y: 4,
            hosts_per_router: 1,
        });
        let placement = distribute_ranks(PlacementStrategy::Linear, 16, 16).unwrap();
        let report = report(
            topology,
            vec![result(1, Pattern::PingPong, 0, 2, 3.0, Some(vec![(3, 1)]))],
        );
        export_csv(&path, &report, CsvLayout::PerJob, &topology, &placement).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Job ID,Pattern,Size,Avg Hop Count,3\nJob 1,PingPong,2,3.00,1\n");
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("(1,2)"), "\"(1,2)\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
