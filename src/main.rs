//! `orbit-prep` command line
//!
//! ```sh
//! orbit-prep generate                      # Stage 0: raw trajectories
//! orbit-prep transform                     # Stage A: input_/output_<id>.txt
//! orbit-prep concatenate                   # Stage B: <kind>_<split>_concatenated.txt
//! orbit-prep --config pipeline.json --data-dir /scratch/data transform
//! orbit-prep --split validation --split test concatenate --kind input
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use orbit_prep::config::{PipelineConfig, Split, TableKind};
use orbit_prep::pipeline::{run_concat_stage, run_transform_stage};
use orbit_prep::simulate::run_generate_stage;

#[derive(Parser, Debug)]
#[command(
    name = "orbit-prep",
    version,
    about = "Turn simulated orbit trajectories into normalized training tables"
)]
struct Cli {
    /// JSON pipeline config; unspecified fields take their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the data root from the config
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Restrict every stage to these splits (repeatable)
    #[arg(long = "split", value_name = "SPLIT", global = true)]
    splits: Vec<Split>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Integrate seeded orbits into raw records `<split>/<id>.txt`
    Generate,
    /// Stage A: derive `input_<id>.txt` and `output_<id>.txt` per record
    Transform,
    /// Stage B: stack derived tables into one file per split and kind
    Concatenate {
        /// Only concatenate these table kinds (repeatable)
        #[arg(long = "kind", value_name = "KIND")]
        kinds: Vec<TableKind>,
    },
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let mut config = match &cli.data_dir {
        Some(root) => config.with_data_root(root),
        None => config,
    };
    if !cli.splits.is_empty() {
        config = config.with_splits(cli.splits.clone())?;
    }
    if let Command::Concatenate { kinds } = &cli.command {
        if !kinds.is_empty() {
            config = config.with_kinds(kinds.clone())?;
        }
    }
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    info!(?config, "orbit-prep starting");

    match cli.command {
        Command::Generate => {
            let summary = run_generate_stage(&config).context("trajectory generation failed")?;
            info!(
                records = summary.records,
                splits = summary.splits.len(),
                "generation finished"
            );
        }
        Command::Transform => {
            let summary = run_transform_stage(&config).context("Stage A failed")?;
            info!(
                records = summary.records,
                derived_rows = summary.derived_rows,
                "transform finished"
            );
        }
        Command::Concatenate { .. } => {
            let summary = run_concat_stage(&config).context("Stage B failed")?;
            for (split, kind, rows) in &summary.tables {
                info!(%split, %kind, rows, "wrote concatenated table");
            }
        }
    }
    Ok(())
}
