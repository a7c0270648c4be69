//! Hop-count statistics exported by the network simulator.
//!
//! The simulator's CSV statistic output has one row per (component,
//! statistic) with accumulator columns such as `Sum.u32`. Router topology
//! components record packets per hop count as statistics named
//! `hopcount0`, `hopcount1`, ... This module sums those rows into a
//! histogram so measured hop counts can be set beside the analytic model.
//! The hop value is the simulator's own count and is not adjusted.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::types::HopHistogram;
use crate::topology::HopCount;

/// Match: "hopcount<N>"
static HOPCOUNT_STAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^hopcount(\d+)$").expect("Invalid hopcount regex"));

const COMPONENT_COLUMN: &str = "ComponentName";
const STATISTIC_COLUMN: &str = "StatisticName";
const SUM_COLUMNS: [&str; 2] = ["Sum.u32", "Sum.u64"];

/// Errors while reading simulator statistics
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Statistics file has no header row")]
    MissingHeader,
    #[error("Statistics file has no '{0}' column")]
    MissingColumn(String),
    #[error("Line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },
}

/// Which components' statistics to include
#[derive(Debug, Clone, Default)]
pub struct StatsFilter {
    pub component_prefix: Option<String>,
    pub component_suffix: Option<String>,
}

impl StatsFilter {
    fn accepts(&self, component: &str) -> bool {
        self.component_prefix
            .as_deref()
            .map_or(true, |p| component.starts_with(p))
            && self
                .component_suffix
                .as_deref()
                .map_or(true, |s| component.ends_with(s))
    }
}

/// Aggregated simulator hop counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimHopStats {
    pub histogram: HopHistogram,
    /// Statistic rows that contributed to the histogram
    pub rows_matched: usize,
}

impl SimHopStats {
    pub fn total_packets(&self) -> u64 {
        self.histogram.values().sum()
    }

    /// Packet-weighted mean hop count; 0 when nothing was recorded
    pub fn average_hops(&self) -> f64 {
        let total = self.total_packets();
        if total == 0 {
            return 0.0;
        }
        let weighted: u64 = self
            .histogram
            .iter()
            .map(|(hops, count)| u64::from(*hops) * count)
            .sum();
        weighted as f64 / total as f64
    }
}

fn split_fields(line: &str) -> Vec<&str> {
    line.split(',').map(str::trim).collect()
}

fn parse_sum(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.round() as u64)
    })
}

/// Aggregate `hopcountN` rows from a statistics CSV stream.
pub fn parse_hop_statistics<R: BufRead>(
    reader: R,
    filter: &StatsFilter,
) -> Result<SimHopStats, StatsError> {
    let io_err = |source| StatsError::Io {
        path: PathBuf::from("<reader>"),
        source,
    };

    let mut lines = reader.lines().enumerate();
    let header = loop {
        match lines.next() {
            Some((_, line)) => {
                let line = line.map_err(io_err)?;
                if !line.trim().is_empty() {
                    break line;
                }
            }
            None => return Err(StatsError::MissingHeader),
        }
    };

    let columns: HashMap<&str, usize> = split_fields(&header)
        .into_iter()
        .enumerate()
        .map(|(i, name)| (name, i))
        .collect();
    let column = |name: &str| {
        columns
            .get(name)
            .copied()
            .ok_or_else(|| StatsError::MissingColumn(name.to_string()))
    };
    let component_idx = column(COMPONENT_COLUMN)?;
    let statistic_idx = column(STATISTIC_COLUMN)?;
    let sum_idx = SUM_COLUMNS
        .iter()
        .find_map(|name| columns.get(name).copied())
        .ok_or_else(|| StatsError::MissingColumn(SUM_COLUMNS[0].to_string()))?;
    let width = component_idx.max(statistic_idx).max(sum_idx) + 1;

    let mut stats = SimHopStats::default();
    for (index, line) in lines {
        let line = line.map_err(io_err)?;
        if line.trim().is_empty() {
            continue;
        }
        let line_no = index + 1;
        let fields = split_fields(&line);
        if fields.len() < width {
            return Err(StatsError::MalformedRow {
                line: line_no,
                reason: format!("expected at least {} fields, found {}", width, fields.len()),
            });
        }

        let Some(caps) = HOPCOUNT_STAT.captures(fields[statistic_idx]) else {
            continue;
        };
        if !filter.accepts(fields[component_idx]) {
            continue;
        }

        let hops: HopCount = caps[1].parse().map_err(|_| StatsError::MalformedRow {
            line: line_no,
            reason: format!("hop count out of range in '{}'", fields[statistic_idx]),
        })?;
        let sum = parse_sum(fields[sum_idx]).ok_or_else(|| StatsError::MalformedRow {
            line: line_no,
            reason: format!("invalid sum '{}'", fields[sum_idx]),
        })?;

        *stats.histogram.entry(hops).or_insert(0) += sum;
        stats.rows_matched += 1;
    }

    if stats.rows_matched == 0 || stats.total_packets() == 0 {
        log::warn!("No hop count statistics found; check the component filters and the sum column");
    } else {
        log::info!(
            "Aggregated {} hop count rows ({} packets)",
            stats.rows_matched,
            stats.total_packets()
        );
    }

    Ok(stats)
}

/// Aggregate `hopcountN` rows from a statistics CSV file.
pub fn load_hop_statistics(path: &Path, filter: &StatsFilter) -> Result<SimHopStats, StatsError> {
    let with_path = |source| StatsError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(with_path)?;
    match parse_hop_statistics(BufReader::new(file), filter) {
        Err(StatsError::Io { source, .. }) => Err(with_path(source)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    const STATS: &str = "\
ComponentName, StatisticName, StatisticSubId, StatisticType, SimTime, Rank, Sum.u32, SumSQ.u32, Count.u32, Min.u32, Max.u32
polarfly_network.r0:topology, hopcount0, , Accumulator, 1000, 0, 0, 0, 0, 0, 0
polarfly_network.r0:topology, hopcount1, , Accumulator, 1000, 0, 12, 12, 12, 1, 1
polarfly_network.r1:topology, hopcount1, , Accumulator, 1000, 0, 8, 8, 8, 1, 1
polarfly_network.r1:topology, hopcount2, , Accumulator, 1000, 0, 5, 20, 5, 2, 2
polarfly_network.r1, send_packet_count, , Accumulator, 1000, 0, 99, 0, 0, 0, 0
other_network.r0:topology, hopcount2, , Accumulator, 1000, 0, 100, 0, 0, 0, 0
";

    fn filter() -> StatsFilter {
        StatsFilter {
            component_prefix: Some("polarfly_network.r".to_string()),
            component_suffix: Some(":topology".to_string()),
        }
    }

    #[test]
    fn test_aggregate_hopcounts() {
        let stats = parse_hop_statistics(Cursor::new(STATS), &filter()).unwrap();
        assert_eq!(stats.rows_matched, 4);
        assert_eq!(stats.histogram.get(&0), Some(&0));
        assert_eq!(stats.histogram.get(&1), Some(&20));
        assert_eq!(stats.histogram.get(&2), Some(&5));
        assert_eq!(stats.total_packets(), 25);
        assert!((stats.average_hops() - 30.0 / 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_filter_includes_everything() {
        let stats = parse_hop_statistics(Cursor::new(STATS), &StatsFilter::default()).unwrap();
        assert_eq!(stats.rows_matched, 5);
        assert_eq!(stats.histogram.get(&2), Some(&105));
    }

    #[test]
    fn test_missing_column() {
        let csv = "ComponentName, StatisticName, Count.u32\nr0, hopcount1, 3\n";
        let err = parse_hop_statistics(Cursor::new(csv), &StatsFilter::default()).unwrap_err();
        assert!(matches!(err, StatsError::MissingColumn(ref c) if c == "Sum.u32"));
    }

    #[test]
    fn test_sum_u64_fallback() {
        let csv = "ComponentName,StatisticName,Sum.u64\nr0:topology,hopcount3,7\n";
        let stats = parse_hop_statistics(Cursor::new(csv), &StatsFilter::default()).unwrap();
        assert_eq!(stats.histogram.get(&3), Some(&7));
    }

    #[test]
    fn test_malformed_sum() {
        let csv = "ComponentName,StatisticName,Sum.u32\nr0,hopcount1,lots\n";
        let err = parse_hop_statistics(Cursor::new(csv), &StatsFilter::default()).unwrap_err();
        assert!(matches!(err, StatsError::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn test_empty_input() {
        let err = parse_hop_statistics(Cursor::new(""), &StatsFilter::default()).unwrap_err();
        assert!(matches!(err, StatsError::MissingHeader));
    }

    #[test]
    fn test_no_matching_rows_is_not_an_error() {
        let csv = "ComponentName,StatisticName,Sum.u32\nr0,send_packet_count,4\n";
        let stats = parse_hop_statistics(Cursor::new(csv), &StatsFilter::default()).unwrap();
        assert_eq!(stats, SimHopStats::default());
        assert_eq!(stats.average_hops(), 0.0);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", STATS).unwrap();
        let stats = load_hop_statistics(file.path(), &filter()).unwrap();
        assert_eq!(stats.total_packets(), 25);

        let err = load_hop_statistics(Path::new("/nonexistent/stats.csv"), &filter()).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/stats.csv"));
    }
}
