//! voxkit CLI - run voxel filter pipelines on synthetic volumes

mod phantom;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use voxkit_algorithms::pipeline::{Pipeline, OPERATIONS};
use voxkit_core::VoxelGrid;

use phantom::Phantom;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "voxkit")]
#[command(author, version, about = "Voxel image filter pipelines", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available operations and their parameters
    Ops,
    /// Run a pipeline on a synthetic phantom
    Run {
        /// Phantom shape
        #[arg(long, value_enum, default_value_t = Phantom::Sphere)]
        phantom: Phantom,
        /// Number of axes (2 or 3)
        #[arg(long, default_value = "3")]
        dims: usize,
        /// Voxels per axis
        #[arg(long, default_value = "32")]
        size: usize,
        /// Isotropic voxel spacing
        #[arg(long, default_value = "1.0")]
        spacing: f64,
        /// Seed for the noise phantom
        #[arg(long, default_value = "42")]
        seed: u64,
        /// Stage as "Name p1 p2 ..." (repeatable, applied after --json and --script)
        #[arg(long = "op", value_name = "STAGE")]
        ops: Vec<String>,
        /// Pipeline script file, one stage per line
        #[arg(long)]
        script: Option<PathBuf>,
        /// Pipeline JSON file
        #[arg(long)]
        json: Option<PathBuf>,
        /// Print the assembled pipeline as JSON instead of running it
        #[arg(long)]
        dump: bool,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install logger: {}", e);
    }
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Assemble a pipeline from a JSON file, a script file and inline stages, in that order
fn load_pipeline(json: Option<&Path>, script: Option<&Path>, ops: &[String]) -> Result<Pipeline> {
    let mut pipeline = match json {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Pipeline::from_json(&text).with_context(|| format!("Invalid pipeline in {}", path.display()))?
        }
        None => Pipeline::new(),
    };

    if let Some(path) = script {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let parsed = Pipeline::parse(&text).with_context(|| format!("Invalid script {}", path.display()))?;
        for stage in parsed.stages() {
            pipeline.append(stage.clone());
        }
    }

    for op in ops {
        let parsed = Pipeline::parse(op).with_context(|| format!("Invalid stage '{}'", op))?;
        for stage in parsed.stages() {
            pipeline.append(stage.clone());
        }
    }

    Ok(pipeline)
}

fn print_summary(grid: &VoxelGrid) {
    let stats = grid.statistics();
    println!("Extents: {:?} ({} voxels)", grid.extents(), grid.len());
    println!("Spacing: {:?}", grid.spacing());
    println!("Origin: {:?}", grid.origin());
    println!("\nStatistics:");
    if let Some(min) = stats.min {
        println!("  Min: {:.4}", min);
    }
    if let Some(max) = stats.max {
        println!("  Max: {:.4}", max);
    }
    if let Some(mean) = stats.mean {
        println!("  Mean: {:.4}", mean);
    }
    println!("  Non-zero voxels: {}", grid.foreground_count());
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Ops => {
            for (name, params) in OPERATIONS {
                if params.is_empty() {
                    println!("{}", name);
                } else {
                    println!("{:<24} {}", name, params);
                }
            }
        }

        Commands::Run {
            phantom,
            dims,
            size,
            spacing,
            seed,
            ops,
            script,
            json,
            dump,
        } => {
            let pipeline = load_pipeline(json.as_deref(), script.as_deref(), &ops)?;
            if dump {
                println!("{}", pipeline.to_json()?);
                return Ok(());
            }

            let input = phantom::build(phantom, dims, size, spacing, seed)
                .context("Failed to build phantom")?;
            info!("Phantom: {:?} {:?}", phantom, input.extents());

            let start = Instant::now();
            let pb = spinner(&format!("Running {} stage(s)...", pipeline.len()));
            let result = pipeline.execute(&input);
            pb.finish_and_clear();
            let output = result.context("Pipeline failed")?;
            info!("Pipeline finished in {:.2?}", start.elapsed());

            print_summary(&output);
        }
    }

    Ok(())
}
