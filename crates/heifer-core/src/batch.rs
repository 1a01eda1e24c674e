//! Batch orchestration: discover, plan, dispatch, aggregate.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{BatchError, ConfigError, Result};
use crate::pipeline::{
    plan_tasks, Aggregator, DispatchOptions, Dispatcher, FileConverter, FileDiscovery,
    ProgressObserver, Transcoder,
};
use crate::types::{BatchSummary, ConversionResult, InputFile};

/// Everything a finished batch produced.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub summary: BatchSummary,
    /// One result per discovered file, in completion order
    pub results: Vec<ConversionResult>,
}

impl BatchReport {
    /// The error to surface if the batch was interrupted.
    pub fn cancellation(&self) -> Option<BatchError> {
        (self.summary.cancelled > 0).then(|| BatchError::Cancelled {
            processed: self.summary.processed - self.summary.cancelled,
            total: self.summary.total,
        })
    }
}

/// Converts every HEIF file in the configured input directory.
pub struct BatchConverter {
    config: Config,
    discovery: FileDiscovery,
    converter: Arc<dyn FileConverter>,
}

impl BatchConverter {
    /// Validate `config` and build a converter backed by [`Transcoder`].
    ///
    /// Nothing touches the filesystem if validation fails.
    pub fn new(config: Config) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let converter = Arc::new(Transcoder::new(&config));
        Ok(Self::assemble(config, converter))
    }

    /// Like [`BatchConverter::new`], with a custom per-file converter.
    pub fn with_converter(
        config: Config,
        converter: Arc<dyn FileConverter>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::assemble(config, converter))
    }

    fn assemble(config: Config, converter: Arc<dyn FileConverter>) -> Self {
        Self {
            discovery: FileDiscovery::new(config.processing.clone()),
            config,
            converter,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// List the files the batch would convert.
    pub fn discover(&self) -> std::result::Result<Vec<InputFile>, BatchError> {
        self.discovery.discover(&self.config.input_dir())
    }

    /// Run the batch to completion.
    ///
    /// Per-file failures are part of the returned report. `Err` means the
    /// batch itself broke: unreadable input directory, unusable output
    /// directory, an output collision, or a crashed worker.
    pub async fn run(
        &self,
        cancel: CancellationToken,
        observer: &mut dyn ProgressObserver,
    ) -> Result<BatchReport> {
        let start = Instant::now();
        let input_dir = self.config.input_dir();
        let output_dir = self.config.output_dir();
        let options = DispatchOptions::from_config(&self.config);

        tracing::info!("Input directory: {}", input_dir.display());
        tracing::info!("Output directory: {}", output_dir.display());
        tracing::info!(
            "Max image size: {}",
            self.config.conversion.max_image_dimension
        );
        tracing::info!("Workers: {}", options.workers);

        let files = self.discovery.discover(&input_dir)?;
        tracing::info!(
            "Found {} file(s) to convert ({} bytes)",
            files.len(),
            FileDiscovery::total_size(&files)
        );

        ensure_output_dir(&output_dir)?;
        let tasks = plan_tasks(files, &output_dir, self.config.conversion.on_collision)?;

        let mut aggregator = Aggregator::new(tasks.len());
        let dispatcher = Dispatcher::new(self.converter.clone(), options);
        let (handle, mut rx) = dispatcher.spawn(tasks, cancel);
        aggregator.consume(&mut rx, observer).await;

        handle
            .await
            .map_err(|e| BatchError::WorkerPool(format!("dispatcher task failed: {e}")))??;

        let (mut summary, results) = aggregator.finish();
        summary.elapsed = start.elapsed();

        tracing::info!(
            "Conversion completed: {} converted, {} failed, {} cancelled in {:.1}s",
            summary.converted,
            summary.failed,
            summary.cancelled,
            summary.elapsed.as_secs_f64()
        );

        Ok(BatchReport { summary, results })
    }
}

fn ensure_output_dir(dir: &Path) -> std::result::Result<(), BatchError> {
    std::fs::create_dir_all(dir).map_err(|e| BatchError::OutputDirectory {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;
    if !dir.is_dir() {
        return Err(BatchError::OutputDirectory {
            path: dir.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }
    Ok(())
}
