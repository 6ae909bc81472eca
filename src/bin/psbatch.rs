// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Batch renderer CLI for photometric-stereo datasets

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use psbatch::batch::{
    BatchConfig, BatchDriver, BatchReporter, DryRunLauncher, Launcher, LimitMode, SystemLauncher,
};
use psbatch::RunLog;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "psbatch")]
#[command(version)]
#[command(about = "Render every mesh under a directory with headless Blender", long_about = None)]
struct Cli {
    /// Directory holding the objects, one subdirectory per object
    #[arg(short, long = "path", value_name = "DIR")]
    path: PathBuf,

    /// Root folder for rendered images
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Camera rotations per object
    #[arg(long)]
    views: Option<u32>,

    /// Light directions sampled per view
    #[arg(long)]
    lights: Option<u32>,

    /// Maximum number of objects to render, negative for no limit
    #[arg(long, allow_negative_numbers = true)]
    max_objects: Option<i64>,

    /// Stop after the object whose index equals --max-objects (renders one extra)
    #[arg(long)]
    inclusive_limit: bool,

    /// Script Blender runs for each object
    #[arg(short, long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Time budget per view in seconds
    #[arg(long, value_name = "SECS")]
    view_timeout: Option<u64>,

    /// Blender executable
    #[arg(long, value_name = "EXE")]
    blender: Option<String>,

    /// Mesh file extension
    #[arg(long, value_name = "EXT")]
    extension: Option<String>,

    /// Append-only run log
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// TOML config file (defaults to ./render_batch.toml when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the effective configuration to FILE and exit
    #[arg(long, value_name = "FILE")]
    write_config: Option<PathBuf>,

    /// Print the commands without running Blender
    #[arg(long)]
    dry_run: bool,

    /// Write batch_report.json and batch_report.md into DIR
    #[arg(long, value_name = "DIR")]
    report_dir: Option<PathBuf>,

    /// Model scaling factor passed to the render script
    #[arg(long)]
    scale: Option<f32>,

    /// Depth scaling passed to the render script
    #[arg(long)]
    depth_scale: Option<f32>,

    /// Bits per channel of the output images (8 or 16)
    #[arg(long)]
    color_depth: Option<u8>,

    /// Width and height of the output images
    #[arg(long)]
    resolution: Option<u32>,

    /// Show a progress bar
    #[arg(long)]
    progress: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let config = build_config(&cli, |key| std::env::var(key).ok())?;

    if let Some(ref path) = cli.write_config {
        config.save(path)?;
        println!("{} Wrote config to {}", "Success:".green(), path.display());
        return Ok(());
    }

    if cli.verbose {
        println!("{}", "Starting render batch...".bold());
        println!("  Objects: {}", config.object_root.display());
        println!("  Output:  {}", config.output_dir.display());
        println!("  Blender: {}", config.blender_path);
        println!("  Script:  {}", config.render_script.display());
        println!("  Log:     {}", config.log_file.display());
    }

    let log = RunLog::open(&config.log_file)
        .with_context(|| format!("Failed to open run log {:?}", config.log_file))?;

    if config.dry_run {
        run_batch(config, DryRunLauncher::new(true), log, cli.report_dir.as_ref())
    } else {
        let launcher = SystemLauncher::new().quiet(config.progress);
        run_batch(config, launcher, log, cli.report_dir.as_ref())
    }
}

/// File, then environment, then command-line flags
fn build_config(cli: &Cli, env: impl Fn(&str) -> Option<String>) -> Result<BatchConfig> {
    let mut config = BatchConfig::load(cli.config.as_deref(), env)?;

    config.object_root = cli.path.clone();
    if let Some(ref output) = cli.output {
        config.output_dir = output.clone();
    }
    if let Some(views) = cli.views {
        config.views = views;
    }
    if let Some(lights) = cli.lights {
        config.lights_per_view = lights;
    }
    if let Some(max) = cli.max_objects {
        config.max_objects = usize::try_from(max).ok();
    }
    if cli.inclusive_limit {
        config.limit_mode = LimitMode::Inclusive;
    }
    if let Some(ref script) = cli.script {
        config.render_script = script.clone();
    }
    if let Some(secs) = cli.view_timeout {
        config.view_timeout_secs = secs;
    }
    if let Some(ref blender) = cli.blender {
        config.blender_path = blender.clone();
    }
    if let Some(ref ext) = cli.extension {
        config.mesh_extension = ext.clone();
    }
    if let Some(ref log_file) = cli.log_file {
        config.log_file = log_file.clone();
    }
    if cli.scale.is_some() {
        config.render.scale = cli.scale;
    }
    if cli.depth_scale.is_some() {
        config.render.depth_scale = cli.depth_scale;
    }
    if cli.color_depth.is_some() {
        config.render.color_depth = cli.color_depth;
    }
    if cli.resolution.is_some() {
        config.render.resolution = cli.resolution;
    }
    config.dry_run |= cli.dry_run;
    config.progress |= cli.progress;
    config.verbose |= cli.verbose;

    config.validate()?;
    Ok(config)
}

fn run_batch<L: Launcher>(
    config: BatchConfig,
    launcher: L,
    log: RunLog,
    report_dir: Option<&PathBuf>,
) -> Result<()> {
    let mut driver = BatchDriver::new(config, launcher, log);
    let result = driver.run();

    let summary = driver.summary();
    BatchReporter::print_summary(summary);

    if let Some(dir) = report_dir {
        std::fs::create_dir_all(dir)?;
        BatchReporter::write_json(summary, dir.join("batch_report.json"))?;
        BatchReporter::write_markdown(summary, dir.join("batch_report.md"))?;
    }

    if let Err(e) = result {
        BatchReporter::report_error(&e.to_string());
        std::process::exit(1);
    }

    Ok(())
}
