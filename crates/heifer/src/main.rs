//! Heifer CLI - parallel HEIF/HEIC to JPEG batch conversion.
//!
//! Heifer converts every HEIF-family photo in a directory into a downscaled
//! progressive JPEG, using every CPU core by default.
//!
//! # Usage
//!
//! ```bash
//! # Convert a directory, longest edge at most 4096px
//! heifer convert ./photos ./jpegs --max-size 4096
//!
//! # Same, configured through the environment
//! INPUT_DIRECTORY=./photos OUTPUT_DIRECTORY=./jpegs MAX_IMG_SIZE=4096 heifer convert
//!
//! # View configuration
//! heifer config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio::runtime::Runtime;

mod cli;
mod logging;

/// Heifer - convert HEIF/HEIC photos into resized JPEGs, in parallel.
#[derive(Parser, Debug)]
#[command(name = "heifer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "HEIFER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert every HEIF file in a directory to JPEG
    Convert(cli::convert::ConvertArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

/// How long shutdown waits for blocking threads still inside a conversion
/// that already timed out.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln
    let config = match cli::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `heifer config path`."
            );
            heifer_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Heifer v{}", heifer_core::VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(cli.command, cli.config));
    shutdown(runtime);
    result
}

async fn run(command: Commands, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    match command {
        Commands::Convert(args) => cli::convert::execute(args, config_path).await,
        Commands::Config(args) => cli::config::execute(args, config_path).await,
    }
}

/// Stop the runtime without waiting out a decode that never returned.
///
/// A timed-out conversion keeps its blocking thread until the next stage
/// boundary; a hung decoder never reaches one, and dropping the runtime
/// would wait for it forever.
fn shutdown(runtime: Runtime) {
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use heifer_core::pipeline::{DispatchOptions, Dispatcher};
    use heifer_core::{
        ConversionTask, ConvertedImage, FileConverter, InputFile, TranscodeError,
        TranscodeResult,
    };
    use std::sync::Arc;
    use std::time::Instant;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_convert() {
        let cli = Cli::try_parse_from([
            "heifer",
            "convert",
            "in",
            "out",
            "--max-size",
            "2048",
            "--workers",
            "3",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Commands::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(args.input, Some(PathBuf::from("in")));
        assert_eq!(args.output, Some(PathBuf::from("out")));
        assert_eq!(args.max_size, Some(2048));
        assert_eq!(args.workers, Some(3));
    }

    /// Sleeps well past its timeout without looking at the cancel token.
    struct StuckConverter;

    impl FileConverter for StuckConverter {
        fn convert_task(
            &self,
            _task: &ConversionTask,
            _cancel: &CancellationToken,
        ) -> TranscodeResult<ConvertedImage> {
            std::thread::sleep(Duration::from_secs(3));
            Err(TranscodeError::Decode {
                path: PathBuf::from("stuck.heic"),
                message: "never finished".to_string(),
            })
        }
    }

    #[test]
    fn test_shutdown_does_not_wait_for_stuck_conversion() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();

        let results = runtime.block_on(async {
            let dispatcher = Dispatcher::new(
                Arc::new(StuckConverter),
                DispatchOptions {
                    workers: 1,
                    task_timeout: Duration::from_millis(50),
                    buffer_size: 4,
                },
            );
            let task = ConversionTask {
                input: InputFile {
                    path: PathBuf::from("/in/stuck.heic"),
                    size: 1,
                },
                output_path: PathBuf::from("/out/stuck.jpg"),
            };
            let (handle, mut rx) = dispatcher.spawn(vec![task], CancellationToken::new());
            let mut results = Vec::new();
            while let Some(result) = rx.recv().await {
                results.push(result);
            }
            handle.await.unwrap().unwrap();
            results
        });
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0].error(),
            Some(TranscodeError::Timeout { .. })
        ));

        let start = Instant::now();
        shutdown(runtime);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_quality_out_of_range_rejected() {
        let parsed = Cli::try_parse_from(["heifer", "convert", "in", "out", "--quality", "0"]);
        assert!(parsed.is_err());
    }
}
