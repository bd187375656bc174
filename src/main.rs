//! bvh_hierarchy - inspect a .bvh file and optionally save it back.

use anyhow::{Context, Result};
use bvh_hierarchy::{read_as_hierarchy, write_hierarchy, BvhError, WriteOptions};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bvh_hierarchy")]
#[command(about = "Print the joint layout of a .bvh file and re-save it")]
#[command(version)]
struct Cli {
    /// Input .bvh file
    input: PathBuf,

    /// Write the (converted back) animation to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Decimal places of written numbers
    #[arg(short, long, default_value_t = 6)]
    precision: usize,

    /// Frame whose world positions are printed (negative counts from the end)
    #[arg(short, long, default_value_t = 0, allow_hyphen_values = true)]
    frame: i64,

    /// Print the rest pose instead of a frame
    #[arg(long)]
    rest: bool,
}

fn __log_error(error: &BvhError) {
    tracing::error!(category = error.category(), "{}", error);
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut skeleton = read_as_hierarchy(&cli.input)
        .inspect_err(__log_error)
        .with_context(|| format!("failed to load {}", cli.input.display()))?;
    let root = skeleton.root;

    if cli.rest {
        skeleton.hierarchy.read_rest_pose(root, true);
    } else {
        skeleton
            .hierarchy
            .read_pose(root, cli.frame, true)
            .inspect_err(__log_error)
            .with_context(|| format!("failed to load frame {}", cli.frame))?;
    }

    tracing::info!(
        "{} joints, {} frames at {:.2} fps",
        skeleton.hierarchy.len(),
        skeleton.frame_count,
        skeleton.fps()
    );
    for (id, index, depth) in skeleton.layout() {
        let joint = skeleton.hierarchy.joint(id);
        let position = skeleton.hierarchy.position_world(id);
        println!(
            "{:>3} {}{:<width$} ({:>10.4} {:>10.4} {:>10.4})",
            index,
            "  ".repeat(depth),
            joint.name,
            position.x,
            position.y,
            position.z,
            width = 24usize.saturating_sub(depth * 2),
        );
    }

    if let Some(output) = &cli.output {
        let options = WriteOptions::new().with_precision(cli.precision);
        write_hierarchy(output, &skeleton, &options)
            .inspect_err(__log_error)
            .with_context(|| format!("failed to write {}", output.display()))?;
        tracing::info!("Saved {}", output.display());
    }
    Ok(())
}
