//! Hop-count analysis CLI.
//!
//! Estimates the network hops travelled by collective communication jobs on
//! Dragonfly, Mesh and Torus topologies, and aggregates the simulator's own
//! hop-count statistics for comparison.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result};

use hopcount::analysis::{self, CsvLayout, StatsFilter};
use hopcount::config::Config;
use hopcount::config_loader::{self, AnalysisOverrides};
use hopcount::{orchestrator, presets};

#[derive(Parser, Debug)]
#[command(name = "hopcount")]
#[command(about = "Topology-aware hop-count analysis for multi-job workloads")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Number of parallel workers (0 = auto-detect)
    #[arg(short = 'j', long, default_value = "0", global = true)]
    threads: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyse a scenario and write the CSV, JSON and text reports
    Analyze {
        /// Path to the scenario YAML file
        #[arg(short, long, required_unless_present = "preset", conflicts_with = "preset")]
        config: Option<PathBuf>,

        /// Built-in scenario (dragonfly, torus, mesh)
        #[arg(long)]
        preset: Option<String>,

        /// Output directory for reports
        #[arg(short, long, default_value = "analysis_output")]
        output: PathBuf,

        /// CSV row granularity (default: per_rank for Mesh, per_job otherwise)
        #[arg(long, value_enum)]
        layout: Option<CsvLayout>,

        /// Place ranks randomly with this seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Load and validate a scenario without analysing it
    Validate {
        /// Path to the scenario YAML file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Aggregate hopcountN statistics from a simulator statistics CSV
    SimStats {
        /// Path to the statistics CSV file
        #[arg(short, long)]
        stats: PathBuf,

        /// Only include components whose name starts with this prefix
        #[arg(long)]
        component_prefix: Option<String>,

        /// Only include components whose name ends with this suffix
        #[arg(long)]
        component_suffix: Option<String>,
    },

    /// List the built-in scenarios
    Presets,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    // Set thread pool size
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Analyze {
            config,
            preset,
            output,
            layout,
            seed,
        } => {
            let mut config = load_scenario(config, preset)?;
            config_loader::apply_overrides(&mut config, &AnalysisOverrides { layout, seed })?;

            let (report, files) = orchestrator::run(&config, &output)?;
            analysis::print_summary(&report);

            log::info!(
                "Analysis complete. CSV table at {}",
                files.csv.display()
            );
        }
        Commands::Validate { config } => {
            let config = config_loader::load_config(&config)?;
            let jobs = config.build_jobs()?;
            println!(
                "Configuration is valid: {} with {} jobs over {} ranks",
                config.topology.summary(),
                jobs.len(),
                config.total_ranks()
            );
        }
        Commands::SimStats {
            stats,
            component_prefix,
            component_suffix,
        } => {
            let filter = StatsFilter {
                component_prefix,
                component_suffix,
            };
            let sim = analysis::load_hop_statistics(&stats, &filter)
                .wrap_err("Failed to aggregate simulator statistics")?;

            println!("\nSimulator Hop Count Statistics ({}):\n", stats.display());
            for (hops, count) in &sim.histogram {
                println!("  {} hops: {}", hops, count);
            }
            println!();
            println!("Rows matched: {}", sim.rows_matched);
            println!("Total packets: {}", sim.total_packets());
            println!("Average Hop Count: {:.2}\n", sim.average_hops());
        }
        Commands::Presets => {
            for name in presets::PRESET_NAMES {
                let config = presets::preset(name)?;
                println!(
                    "{:<10} {} ({} jobs, {} placement)",
                    name,
                    config.topology.summary(),
                    config.jobs.len(),
                    config.placement
                );
            }
        }
    }

    Ok(())
}

fn load_scenario(config: Option<PathBuf>, preset: Option<String>) -> Result<Config> {
    match (config, preset) {
        (Some(path), _) => config_loader::load_config(&path),
        (None, Some(name)) => {
            log::info!("Using built-in scenario '{}'", name);
            presets::preset(&name)
        }
        (None, None) => Err(color_eyre::eyre::eyre!(
            "Either --config or --preset is required"
        )),
    }
}
