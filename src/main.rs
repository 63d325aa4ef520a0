//! # Tiles-dl CLI
//!
//! Command-line interface for the tiles-dl library.
//! Harvests every tile image of the wiki into a local directory tree.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn, LevelFilter};
use tiles_dl::{Catalog, DownloadOptions, Harvester, SourceConfig};

mod cli;

/// Exit code used when the run was interrupted
const EXIT_INTERRUPTED: i32 = 130;

/// Command-line interface for tiles-dl
#[derive(Parser)]
#[command(name = "tiles-dl")]
#[command(about = "Bulk downloader for the mahjong tile images of the Lingshang wiki")]
#[command(long_about = "Downloads every tile image (full size and history thumbnail):
  tiles-dl                         # Harvest into ./images, log to ./logs
  tiles-dl --workers 8             # Use 8 concurrent workers
  tiles-dl --dry-run               # List the planned downloads
  tiles-dl --dry-run --json        # Same, as JSON

Output layout:
  <output-dir>/<m|p|s|z>/[thumb_]<index><category>.png
  <output-dir>/other/[thumb_]<name>.png")]
#[command(version)]
struct Cli {
    /// Directory the images are saved into
    #[arg(short, long, default_value = "images")]
    output_dir: PathBuf,

    /// Log file, appended to on every run
    #[arg(long, default_value = "logs/tiles_downloader.log")]
    log_file: PathBuf,

    /// Number of concurrent workers
    #[arg(short, long, default_value_t = 4)]
    workers: usize,

    /// Capacity of the task queue
    #[arg(long, default_value_t = 100)]
    queue_capacity: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Show what would be downloaded without downloading
    #[arg(long)]
    dry_run: bool,

    /// Print the dry-run plan as JSON
    #[arg(long, requires = "dry_run")]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            if log::max_level() == LevelFilter::Off {
                eprintln!("❌ Error: {e:#}");
            } else {
                error!("❌ Error: {e:#}");
            }
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let mut options = DownloadOptions {
        save_dir: cli.output_dir.clone(),
        workers: cli.workers,
        queue_capacity: cli.queue_capacity,
        request_timeout: Duration::from_secs(cli.timeout),
        ..Default::default()
    };

    if cli.dry_run {
        let harvester = Harvester::new(Catalog::default(), SourceConfig::default(), options)
            .context("Invalid configuration")?;
        print_plan(&harvester, cli.json)?;
        return Ok(0);
    }

    cli::logging::init(&cli.log_file, cli.verbose)
        .with_context(|| format!("Failed to open log file {}", cli.log_file.display()))?;

    let catalog = Catalog::default();
    let total = tiles_dl::plan_tasks(&catalog, &options.selectors)?.len() as u64;
    let progress_manager = cli::ProgressManager::new(total, "🀄 Harvesting tile images");
    options.progress = Some(progress_manager.callback());

    let cancel = options.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, waiting for in-flight downloads");
            cancel.cancel();
        }
    });

    let harvester = Harvester::new(catalog, SourceConfig::default(), options)
        .context("Invalid configuration")?;
    let report = harvester
        .run()
        .await
        .with_context(|| format!("Failed to prepare {}", harvester.base_dir().display()))?;

    progress_manager.finish("✅ Done");

    if report.cancelled > 0 {
        warn!(
            "Stopped early: {} downloaded, {} failed, {} not attempted",
            report.succeeded, report.failed, report.cancelled
        );
        return Ok(EXIT_INTERRUPTED);
    }

    if report.failed == 0 {
        info!("All images downloaded successfully.");
    } else {
        warn!(
            "All images attempted: {} downloaded, {} failed (see log for details)",
            report.succeeded, report.failed
        );
    }
    Ok(0)
}

/// Print the planned downloads to stdout
fn print_plan(harvester: &Harvester, json: bool) -> Result<()> {
    let planned = harvester
        .plan()?
        .iter()
        .map(|task| harvester.describe(task))
        .collect::<tiles_dl::Result<Vec<_>>>()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&planned)?);
    } else {
        eprintln!("🔍 [DRY RUN] Would download {} images:", planned.len());
        for entry in &planned {
            println!("{} -> {}", entry.page_url, entry.destination.display());
        }
    }
    Ok(())
}
