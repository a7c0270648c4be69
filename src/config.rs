//! Scenario configuration.
//!
//! A scenario is one topology plus the jobs placed on it. Everything here is
//! checked before any hop count is computed.

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::export::CsvLayout;
use crate::pattern::{Job, JobParams, PatternError};
use crate::topology::{distribute_ranks, AddressError, Placement, PlacementStrategy, Topology};

/// Analysis scenario as written in the YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub topology: Topology,
    /// Rank placement (default: linear)
    #[serde(default)]
    pub placement: PlacementStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

/// Output preferences
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<CsvLayout>,
}

/// A job entry as written in the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Job identifier (default: 1-based position in the job list)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<usize>,
    pub size: usize,
    pub start: usize,
    /// Collective pattern name, e.g. "Allreduce"
    pub pattern: String,
    #[serde(default)]
    pub params: ParamsConfig,
}

/// Motif arguments, either as the simulator's argument string or as a map
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamsConfig {
    Text(String),
    Map(BTreeMap<String, serde_yaml::Value>),
}

impl Default for ParamsConfig {
    fn default() -> Self {
        ParamsConfig::Text(String::new())
    }
}

impl ParamsConfig {
    pub fn to_params(&self) -> JobParams {
        match self {
            ParamsConfig::Text(text) => JobParams::parse(text),
            ParamsConfig::Map(map) => JobParams::from_map(
                map.iter()
                    .map(|(k, v)| (k.clone(), yaml_scalar_to_string(v)))
                    .collect(),
            ),
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

/// Configuration errors, all raised before any hop count is computed
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Invalid topology configuration: {0}")]
    InvalidTopology(String),
    #[error("Jobs request {ranks} ranks but the {topology} topology only has {capacity} nodes")]
    CapacityExceeded {
        ranks: usize,
        capacity: usize,
        topology: &'static str,
    },
    #[error("Job {job_id} (start={start}, size={size}) does not fit in {capacity} nodes")]
    JobOutOfRange {
        job_id: usize,
        start: usize,
        size: usize,
        capacity: usize,
    },
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error("Invalid placement: {0}")]
    Placement(#[from] AddressError),
}

impl Config {
    /// Validate topology parameters and job ranges against the topology capacity
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.validate_topology()?;

        let capacity = self.topology.total_nodes();
        let ranks = self.total_ranks();
        if ranks > capacity {
            return Err(ConfigurationError::CapacityExceeded {
                ranks,
                capacity,
                topology: self.topology.kind_name(),
            });
        }

        for (index, job) in self.jobs.iter().enumerate() {
            let fits = job
                .start
                .checked_add(job.size)
                .is_some_and(|end| end <= capacity);
            if !fits {
                return Err(ConfigurationError::JobOutOfRange {
                    job_id: job.id.unwrap_or(index + 1),
                    start: job.start,
                    size: job.size,
                    capacity,
                });
            }
        }

        Ok(())
    }

    fn validate_topology(&self) -> Result<(), ConfigurationError> {
        let fields: Vec<(&str, usize)> = match &self.topology {
            Topology::Dragonfly(p) => vec![
                ("num_groups", p.num_groups),
                ("routers_per_group", p.routers_per_group),
                ("hosts_per_router", p.hosts_per_router),
                ("intergroup_links", p.intergroup_links),
            ],
            Topology::Mesh(p) | Topology::Torus(p) => vec![
                ("dim_x", p.dim_x),
                ("dim_y", p.dim_y),
                ("hosts_per_router", p.hosts_per_router),
            ],
        };

        for (name, value) in fields {
            if value == 0 {
                return Err(ConfigurationError::InvalidTopology(format!(
                    "{} must be at least 1 for a {} topology",
                    name,
                    self.topology.kind_name()
                )));
            }
        }

        if self.topology.checked_total_nodes().is_none() {
            return Err(ConfigurationError::InvalidTopology(
                "topology has more nodes than can be addressed".to_string(),
            ));
        }

        if let Topology::Dragonfly(p) = &self.topology {
            if p.intergroup_links > p.num_groups {
                warn!(
                    "Dragonfly has {} intergroup links but only {} groups; link bands are empty",
                    p.intergroup_links, p.num_groups
                );
            }
        }

        Ok(())
    }

    /// Validate the configuration and build the job list.
    ///
    /// Overlapping job ranges are allowed but logged.
    pub fn build_jobs(&self) -> Result<Vec<Job>, ConfigurationError> {
        self.validate()?;

        let jobs = self
            .jobs
            .iter()
            .enumerate()
            .map(|(index, jc)| {
                Job::from_name(
                    jc.id.unwrap_or(index + 1),
                    &jc.pattern,
                    jc.start,
                    jc.size,
                    jc.params.to_params(),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (i, a) in jobs.iter().enumerate() {
            for b in &jobs[i + 1..] {
                if a.overlaps(b) {
                    warn!(
                        "Job {} (ranks {:?}) overlaps job {} (ranks {:?})",
                        a.id,
                        a.ranks(),
                        b.id,
                        b.ranks()
                    );
                }
            }
        }

        Ok(jobs)
    }

    /// CSV layout: configured value, else per-rank for Mesh and per-job otherwise
    pub fn layout(&self) -> CsvLayout {
        self.output
            .as_ref()
            .and_then(|o| o.layout)
            .unwrap_or_else(|| CsvLayout::default_for(&self.topology))
    }

    /// Sum of all job sizes, saturating at `usize::MAX`
    pub fn total_ranks(&self) -> usize {
        self.jobs
            .iter()
            .fold(0usize, |total, j| total.saturating_add(j.size))
    }

    /// Place ranks `0..rank_count` on the topology with the configured strategy
    pub fn place_ranks(&self, rank_count: usize) -> Result<Placement, ConfigurationError> {
        Ok(distribute_ranks(self.placement, rank_count, self.topology.total_nodes())?)
    }
}
