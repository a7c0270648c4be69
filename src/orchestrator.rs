//! Analysis orchestrator.
//!
//! This module coordinates a full run, from the validated configuration
//! through rank placement and per-job analysis to the written reports.

use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;

use crate::analysis::{
    self, analyze_jobs, overall_average, AnalysisMetadata, AnalysisReport, CsvLayout,
};
use crate::config::Config;
use crate::pattern::Job;
use crate::topology::{Placement, Topology};

/// CSV table written by [`write_outputs`]
pub const CSV_FILE: &str = "hopcount_analysis.csv";
/// JSON report written by [`write_outputs`]
pub const JSON_FILE: &str = "hopcount_report.json";
/// Text report written by [`write_outputs`]
pub const TEXT_FILE: &str = "hopcount_report.txt";

/// A validated configuration with its ranks placed on nodes
#[derive(Debug, Clone)]
pub struct Scenario {
    pub topology: Topology,
    pub jobs: Vec<Job>,
    pub placement: Placement,
    pub layout: CsvLayout,
}

impl Scenario {
    /// Validate `config`, build its jobs and place every referenced rank.
    ///
    /// Ranks are numbered up to the highest job end, so gaps between jobs
    /// still occupy nodes.
    pub fn from_config(config: &Config) -> Result<Self> {
        let jobs = config.build_jobs()?;
        let rank_count = jobs.iter().map(Job::end).max().unwrap_or(0);
        let placement = config
            .place_ranks(rank_count)
            .wrap_err("Failed to place ranks on the topology")?;

        info!(
            "Scenario: {} with {} jobs over {} ranks ({} placement)",
            config.topology.summary(),
            jobs.len(),
            rank_count,
            placement.strategy()
        );

        Ok(Self {
            topology: config.topology,
            jobs,
            placement,
            layout: config.layout(),
        })
    }

    pub fn total_ranks(&self) -> usize {
        self.jobs.iter().map(|j| j.size).sum()
    }
}

/// Paths of the files produced by one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFiles {
    pub csv: PathBuf,
    pub json: PathBuf,
    pub text: PathBuf,
}

impl OutputFiles {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            csv: dir.join(CSV_FILE),
            json: dir.join(JSON_FILE),
            text: dir.join(TEXT_FILE),
        }
    }
}

/// Run the hop-count analysis for every job of the scenario
pub fn analyze(scenario: &Scenario) -> Result<AnalysisReport> {
    let jobs = analyze_jobs(&scenario.jobs, &scenario.topology, &scenario.placement)
        .wrap_err("Hop count analysis failed")?;
    let overall = overall_average(&jobs);

    let metadata = AnalysisMetadata {
        analysis_timestamp: chrono::Utc::now().to_rfc3339(),
        topology: scenario.topology,
        topology_summary: scenario.topology.summary(),
        placement: scenario.placement.strategy().to_string(),
        total_jobs: jobs.len(),
        total_ranks: scenario.total_ranks(),
    };

    Ok(AnalysisReport {
        metadata,
        jobs,
        overall_average_hops: overall,
    })
}

/// Write the CSV table plus the JSON and text reports into `output_dir`
pub fn write_outputs(
    report: &AnalysisReport,
    scenario: &Scenario,
    output_dir: &Path,
) -> Result<OutputFiles> {
    fs::create_dir_all(output_dir).wrap_err_with(|| {
        format!("Failed to create output directory: {}", output_dir.display())
    })?;

    let files = OutputFiles::in_dir(output_dir);

    analysis::export_csv(
        &files.csv,
        report,
        scenario.layout,
        &scenario.topology,
        &scenario.placement,
    )?;
    analysis::generate_json_report(report, &files.json)?;
    analysis::generate_text_report(report, &files.text)?;

    info!("Reports written to {}", output_dir.display());
    Ok(files)
}

/// Analyse `config` and write every report into `output_dir`
pub fn run(config: &Config, output_dir: &Path) -> Result<(AnalysisReport, OutputFiles)> {
    let scenario = Scenario::from_config(config)?;
    let report = analyze(&scenario)?;
    let files = write_outputs(&report, &scenario, output_dir)?;
    Ok((report, files))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_loader::load_config_str;
    use crate::topology::PlacementStrategy;

    const MESH_YAML: &str = r#"
topology:
  kind: mesh
  dim_x: 2
  dim_y: 2
  hosts_per_router: 1
jobs:
  - size: 4
    start: 0
    pattern: Allreduce
"#;

    #[test]
    fn test_scenario_places_up_to_highest_rank() {
        let yaml = r#"
topology:
  kind: torus
  dim_x: 4
  dim_y: 4
  hosts_per_router: 1
jobs:
  - size: 2
    start: 10
    pattern: PingPong
"#;
        let scenario = Scenario::from_config(&load_config_str(yaml).unwrap()).unwrap();
        assert_eq!(scenario.placement.len(), 12);
        assert_eq!(scenario.total_ranks(), 2);
        assert_eq!(scenario.layout, CsvLayout::PerJob);
    }

    #[test]
    fn test_analyze_mesh_example() {
        let scenario = Scenario::from_config(&load_config_str(MESH_YAML).unwrap()).unwrap();
        let report = analyze(&scenario).unwrap();

        assert_eq!(report.jobs.len(), 1);
        assert_eq!(format!("{:.2}", report.overall_average_hops), "3.33");
        assert_eq!(report.metadata.placement, PlacementStrategy::Linear.to_string());
        assert_eq!(report.metadata.total_ranks, 4);
    }

    #[test]
    fn test_run_writes_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");
        let (report, files) = run(&load_config_str(MESH_YAML).unwrap(), &out).unwrap();

        assert_eq!(files, OutputFiles::in_dir(&out));
        assert!(files.csv.exists());
        assert!(files.json.exists());
        assert!(files.text.exists());

        // Mesh defaults to one row per rank
        let csv = fs::read_to_string(&files.csv).unwrap();
        assert_eq!(csv.lines().count(), 1 + report.metadata.total_ranks);
    }
}
