//! The `heifer convert` command.

mod progress;
mod setup;
pub mod types;

pub use types::{CollisionArg, ProgressMode, ReportFormatArg};

use clap::Args;
use heifer_core::{BatchConverter, BatchReport, LogProgress, ReportWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use progress::{print_summary, BarProgress};
use setup::build_config;

/// Arguments for the `convert` command.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Directory containing HEIF/HEIC files
    #[arg(env = "INPUT_DIRECTORY")]
    pub input: Option<PathBuf>,

    /// Directory for the JPEG files (created if absent)
    #[arg(env = "OUTPUT_DIRECTORY")]
    pub output: Option<PathBuf>,

    /// Longest edge of the output images, in pixels
    #[arg(short, long, env = "MAX_IMG_SIZE")]
    pub max_size: Option<u32>,

    /// Number of parallel workers (0 = all cores)
    #[arg(short, long, env = "HEIFER_WORKERS")]
    pub workers: Option<usize>,

    /// JPEG quality
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Per-file time limit in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// What to do when two inputs map to the same JPEG name
    #[arg(long, value_enum)]
    pub on_collision: Option<CollisionArg>,

    /// Write a per-file result report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value = "json")]
    pub report_format: ReportFormatArg,

    /// Progress display
    #[arg(long, value_enum, default_value = "log")]
    pub progress: ProgressMode,
}

/// Execute the convert command.
pub async fn execute(args: ConvertArgs, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = build_config(&args, config_path.as_deref())?;
    let converter = BatchConverter::new(config)?;

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let report = match args.progress {
        ProgressMode::Log => converter.run(cancel, &mut LogProgress).await?,
        ProgressMode::Bar => {
            let mut bar = BarProgress::new()?;
            let result = converter.run(cancel, &mut bar).await;
            bar.finish();
            result?
        }
    };

    print_summary(&report.summary);

    if let Some(path) = &args.report {
        write_report(&report, path, args.report_format)?;
    }

    if let Some(cancelled) = report.cancellation() {
        return Err(cancelled.into());
    }
    Ok(())
}

/// Exit status for a run stopped by a second interrupt (128 + SIGINT).
const FORCE_QUIT_EXIT_CODE: i32 = 130;

/// What to do about the n-th Ctrl-C.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InterruptAction {
    /// Stop submitting work; in-flight files stop at their next stage
    Cancel,
    /// Give up on in-flight files and exit immediately
    ForceQuit,
}

fn interrupt_action(count: usize) -> InterruptAction {
    if count <= 1 {
        InterruptAction::Cancel
    } else {
        InterruptAction::ForceQuit
    }
}

fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        let mut count = 0;
        while tokio::signal::ctrl_c().await.is_ok() {
            count += 1;
            match interrupt_action(count) {
                InterruptAction::Cancel => {
                    tracing::warn!(
                        "Interrupted, finishing in-flight files (press Ctrl-C again to quit now)"
                    );
                    cancel.cancel();
                }
                InterruptAction::ForceQuit => {
                    tracing::error!("Interrupted again, exiting without waiting");
                    std::process::exit(FORCE_QUIT_EXIT_CODE);
                }
            }
        }
    });
}

fn write_report(report: &BatchReport, path: &Path, format: ReportFormatArg) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let mut writer = ReportWriter::new(BufWriter::new(file), format.into(), true);
    writer.write_report(report)?;
    tracing::info!("Report written to {:?}", path);
    Ok(())
}
