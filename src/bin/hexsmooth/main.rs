//! Hexsmooth CLI - block mesh smoothing command-line tool.
//!
//! Usage: hexsmooth <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `hexsmooth --help` for available commands.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};

use hexsmooth::algo::quality::mesh_quality;
use hexsmooth::algo::smooth::getme_smooth_with_progress;
use hexsmooth::algo::{Progress, SmoothEvent};
use hexsmooth::config::SmootherConfig;
use hexsmooth::error::Result;
use hexsmooth::io;

#[derive(Parser)]
#[command(name = "hexsmooth")]
#[command(author, version, about = "Hexahedral block mesh smoothing CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information and quality statistics
    Info {
        /// Input mesh description file
        input: PathBuf,
    },

    /// Smooth a mesh
    Smooth {
        /// Input mesh description file
        input: PathBuf,

        /// Output mesh description file
        output: PathBuf,

        /// Read the smoother dictionary from a separate JSON file instead
        /// of the mesh description
        #[arg(long)]
        dict: Option<PathBuf>,

        /// Print per-sweep and per-step progress
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Info { input } => info(&input),
        Commands::Smooth {
            input,
            output,
            dict,
            verbose,
        } => smooth(&input, &output, dict.as_deref(), verbose),
    }
}

fn info(input: &std::path::Path) -> Result<()> {
    let (mesh, smoother) = io::load(input)?;
    let quality = mesh_quality(&mesh);

    println!("Points:        {}", mesh.num_points());
    println!("Cells:         {}", mesh.num_cells());
    println!("Patches:       {}", mesh.patches().len());
    for patch in mesh.patches() {
        println!("  {} ({} faces)", patch.name(), patch.faces().len());
    }
    println!("Min quality:   {:.6}", quality.min);
    println!("Avg quality:   {:.6}", quality.avg);
    println!("Invalid cells: {}", quality.invalid);
    println!(
        "Smoother:      {}",
        if smoother.is_some() {
            "configured"
        } else {
            "not configured"
        }
    );
    Ok(())
}

fn smooth(
    input: &std::path::Path,
    output: &std::path::Path,
    dict: Option<&std::path::Path>,
    verbose: bool,
) -> Result<()> {
    let (mut mesh, embedded) = io::load(input)?;

    let config = match dict {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            let value: serde_json::Value = serde_json::from_str(&text)?;
            SmootherConfig::from_dict(&value)?
        }
        None => embedded,
    };

    let Some(config) = config else {
        log::warn!("no smoother dictionary found; writing the mesh unchanged");
        io::save(output, &mesh)?;
        return Ok(());
    };

    let progress = if verbose {
        Progress::new(|event| match *event {
            SmoothEvent::SimultaneousSweep { sweep, total, stats } => {
                println!(
                    "[{}/{}] avg {:.6}  min {:.6}  invalid {}",
                    sweep + 1,
                    total,
                    stats.avg,
                    stats.min,
                    stats.invalid
                );
            }
            SmoothEvent::PointsReverted { sweep, count } => {
                println!("[{}] reverted {} points", sweep + 1, count);
            }
            SmoothEvent::SequentialStep {
                step,
                min_quality,
                no_effect_steps,
            } => {
                if step % 100 == 0 {
                    println!("step {}: min {:.6} (stalled {})", step, min_quality, no_effect_steps);
                }
            }
        })
    } else {
        Progress::none()
    };

    let start = Instant::now();
    let report = getme_smooth_with_progress(&mut mesh, &config, &progress);
    let elapsed = start.elapsed();

    let quality = mesh_quality(&mesh);
    println!(
        "Smoothed {} cells in {:.2?}: {} sweeps, {} sequential steps",
        mesh.num_cells(),
        elapsed,
        report.simultaneous.sweeps,
        report.sequential.steps
    );
    println!(
        "Final quality: min {:.6}, avg {:.6}, {} invalid cells",
        quality.min, quality.avg, quality.invalid
    );

    io::save(output, &mesh)?;
    Ok(())
}
