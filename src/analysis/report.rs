//! Report generation for hop-count analysis.
//!
//! Generates the console summary plus JSON and human-readable text reports.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{Context, Result};

use super::types::*;

/// Render a histogram as `{2: 10, 3: 40}`
pub fn format_histogram(histogram: &HopHistogram) -> String {
    let entries: Vec<String> = histogram
        .iter()
        .map(|(hops, count)| format!("{}: {}", hops, count))
        .collect();
    format!("{{{}}}", entries.join(", "))
}

/// One console line for a job
pub fn summary_line(job: &JobResult) -> String {
    let mut line = format!(
        "Job {}: {:<10} Size={:<3} Avg Hops={:.2}",
        job.job_id, job.pattern, job.size, job.average_hops
    );
    if let Some(ref histogram) = job.histogram {
        line.push_str(&format!("  Breakdown={}", format_histogram(histogram)));
    }
    line
}

/// Console summary: one line per job, then the overall average
pub fn render_summary(report: &AnalysisReport) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push("Job Hop Count Analysis:".to_string());
    lines.push(String::new());
    for job in &report.jobs {
        lines.push(summary_line(job));
    }
    lines.push(String::new());
    lines.push(format!(
        "Overall Average Hop Count: {:.2}",
        report.overall_average_hops
    ));
    lines.join("\n")
}

/// Print the summary to stdout
pub fn print_summary(report: &AnalysisReport) {
    println!("\n{}\n", render_summary(report));
}

/// Generate JSON report
pub fn generate_json_report(report: &AnalysisReport, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .context("Failed to serialize report to JSON")?;

    fs::write(output_path, json)
        .with_context(|| format!("Failed to write JSON report to {}", output_path.display()))?;

    log::info!("JSON report written to {}", output_path.display());
    Ok(())
}

/// Generate human-readable text report
pub fn generate_text_report(report: &AnalysisReport, output_path: &Path) -> Result<()> {
    fs::write(output_path, render_text_report(report))
        .with_context(|| format!("Failed to write text report to {}", output_path.display()))?;

    log::info!("Text report written to {}", output_path.display());
    Ok(())
}

pub fn render_text_report(report: &AnalysisReport) -> String {
    let mut lines: Vec<String> = Vec::new();

    // Header
    lines.push("=".repeat(80));
    lines.push("                        TOPOLOGY HOP COUNT ANALYSIS".to_string());
    lines.push("=".repeat(80));
    lines.push(String::new());

    // Metadata
    lines.push(format!("Analysis Date: {}", report.metadata.analysis_timestamp));
    lines.push(format!("Topology: {}", report.metadata.topology_summary));
    lines.push(format!("Placement: {}", report.metadata.placement));
    lines.push(format!("Jobs: {}", report.metadata.total_jobs));
    lines.push(format!("Total Ranks: {}", report.metadata.total_ranks));
    lines.push(String::new());

    lines.push("=".repeat(80));
    lines.push("                                PER-JOB RESULTS".to_string());
    lines.push("=".repeat(80));
    lines.push(String::new());

    for job in &report.jobs {
        lines.push(format!(
            "Job {}: {} (ranks {}..{}, size={})",
            job.job_id,
            job.pattern,
            job.start,
            job.start + job.size,
            job.size
        ));
        lines.push(format!("  Average Hop Count: {:.2}", job.average_hops));
        if job.analytic {
            lines.push("  Estimated from tree depth 2 * (log2(size) + 1)".to_string());
        } else {
            lines.push(format!("  Pairs evaluated: {}", job.pair_count));
        }
        if let Some(ref histogram) = job.histogram {
            lines.push(format!("  Hop Count Breakdown: {}", format_histogram(histogram)));
        }
        if !job.params.is_empty() {
            lines.push(format!("  Motif arguments: {}", job.params));
        }
        lines.push(String::new());
    }

    lines.push("=".repeat(80));
    lines.push(format!(
        "Overall Average Hop Count: {:.2} (unweighted mean over {} jobs)",
        report.overall_average_hops,
        report.jobs.len()
    ));
    lines.push("=".repeat(80));

    lines.join("\n")
}
