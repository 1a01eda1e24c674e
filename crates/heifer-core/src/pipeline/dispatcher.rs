//! Worker pool that runs conversion tasks in parallel.
//!
//! At most `workers` conversions are in flight at once, bounded by a
//! semaphore. Each conversion runs on tokio's blocking pool since decode and
//! encode are CPU-bound. Results are sent over a bounded channel in completion
//! order; the dispatcher returns only after every worker has been joined.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{BatchError, TranscodeError, TranscodeResult};
use crate::types::{ConversionResult, ConversionTask, ConvertedImage};

use super::channel::bounded_channel;
use super::transcoder::Transcoder;

/// Something that can turn a task into a JPEG.
///
/// Implementations must be callable from several threads at once.
pub trait FileConverter: Send + Sync + 'static {
    fn convert_task(
        &self,
        task: &ConversionTask,
        cancel: &CancellationToken,
    ) -> TranscodeResult<ConvertedImage>;
}

impl FileConverter for Transcoder {
    fn convert_task(
        &self,
        task: &ConversionTask,
        cancel: &CancellationToken,
    ) -> TranscodeResult<ConvertedImage> {
        self.transcode(task, cancel)
    }
}

/// Pool sizing and per-task limits.
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Maximum conversions in flight
    pub workers: usize,
    /// Time allowed per file
    pub task_timeout: Duration,
    /// Result channel capacity
    pub buffer_size: usize,
}

impl DispatchOptions {
    /// Options derived from the batch configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            workers: config.processing.worker_count(),
            task_timeout: Duration::from_millis(config.limits.task_timeout_ms),
            buffer_size: config.processing.buffer_size,
        }
    }
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Distributes tasks across a bounded pool of workers.
pub struct Dispatcher {
    converter: Arc<dyn FileConverter>,
    options: DispatchOptions,
}

impl Dispatcher {
    pub fn new(converter: Arc<dyn FileConverter>, options: DispatchOptions) -> Self {
        Self { converter, options }
    }

    /// Start converting `tasks` in the background.
    ///
    /// Returns the pool handle and the result stream. The stream closes once
    /// the pool has drained; the handle then yields `Err` only for
    /// infrastructure failures (a crashed worker or a broken pool), never for a
    /// file that failed to convert.
    pub fn spawn(
        &self,
        tasks: Vec<ConversionTask>,
        cancel: CancellationToken,
    ) -> (
        JoinHandle<Result<(), BatchError>>,
        mpsc::Receiver<ConversionResult>,
    ) {
        let (tx, rx) = bounded_channel(self.options.buffer_size);
        let converter = self.converter.clone();
        let options = self.options.clone();
        let handle = tokio::spawn(run_pool(converter, options, tasks, cancel, tx));
        (handle, rx)
    }
}

async fn run_pool(
    converter: Arc<dyn FileConverter>,
    options: DispatchOptions,
    tasks: Vec<ConversionTask>,
    cancel: CancellationToken,
    tx: mpsc::Sender<ConversionResult>,
) -> Result<(), BatchError> {
    let workers = options.workers.max(1);
    let semaphore = Arc::new(Semaphore::new(workers));
    // Cancelled on a worker crash; also follows the caller's token
    let pool_cancel = cancel.child_token();
    let mut running: JoinSet<Result<(), BatchError>> = JoinSet::new();
    let mut failure: Option<BatchError> = None;
    let mut pending = tasks.into_iter();
    let mut unsubmitted: Vec<ConversionTask> = Vec::new();

    tracing::debug!("Starting worker pool with {workers} worker(s)");

    while let Some(task) = pending.next() {
        while let Some(joined) = running.try_join_next() {
            note_failure(&mut failure, joined, &pool_cancel);
        }

        let permit = tokio::select! {
            biased;
            _ = pool_cancel.cancelled() => None,
            permit = semaphore.clone().acquire_owned() => match permit {
                Ok(permit) => Some(permit),
                Err(_) => {
                    note_failure(
                        &mut failure,
                        Ok(Err(BatchError::WorkerPool("worker semaphore closed".to_string()))),
                        &pool_cancel,
                    );
                    None
                }
            },
        };

        let Some(permit) = permit else {
            unsubmitted.push(task);
            unsubmitted.extend(pending.by_ref());
            break;
        };

        running.spawn(run_task(
            converter.clone(),
            task,
            pool_cancel.child_token(),
            options.task_timeout,
            tx.clone(),
            permit,
        ));
    }

    while let Some(joined) = running.join_next().await {
        note_failure(&mut failure, joined, &pool_cancel);
    }

    if !unsubmitted.is_empty() {
        tracing::info!(
            "Skipping {} file(s) that were never started",
            unsubmitted.len()
        );
    }
    for task in unsubmitted {
        let result = ConversionResult::new(
            &task,
            Err(TranscodeError::Cancelled(task.input.path.clone())),
            Duration::ZERO,
        );
        if tx.send(result).await.is_err() {
            break;
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Keep the first infrastructure failure and stop the pool.
fn note_failure(
    failure: &mut Option<BatchError>,
    joined: Result<Result<(), BatchError>, tokio::task::JoinError>,
    pool_cancel: &CancellationToken,
) {
    let error = match joined {
        Ok(Ok(())) => return,
        Ok(Err(e)) => e,
        Err(e) => BatchError::WorkerPool(format!("worker task failed: {e}")),
    };
    tracing::error!("{error}");
    pool_cancel.cancel();
    failure.get_or_insert(error);
}

/// Convert one task on the blocking pool, under the per-task timeout.
async fn run_task(
    converter: Arc<dyn FileConverter>,
    task: ConversionTask,
    cancel: CancellationToken,
    timeout: Duration,
    tx: mpsc::Sender<ConversionResult>,
    permit: OwnedSemaphorePermit,
) -> Result<(), BatchError> {
    let start = Instant::now();
    let blocking = {
        let task = task.clone();
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || converter.convert_task(&task, &cancel))
    };

    let outcome = match tokio::time::timeout(timeout, blocking).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            return Err(BatchError::WorkerPanicked {
                path: task.input.path.clone(),
                message: e.to_string(),
            });
        }
        Err(_) => {
            // The blocking call stops at its next checkpoint without writing
            cancel.cancel();
            let timeout_ms = timeout.as_millis() as u64;
            tracing::debug!(
                "Timed out converting {} after {timeout_ms}ms",
                task.input.path.display()
            );
            Err(TranscodeError::Timeout {
                path: task.input.path.clone(),
                timeout_ms,
            })
        }
    };
    drop(permit);

    let result = ConversionResult::new(&task, outcome, start.elapsed());
    tx.send(result)
        .await
        .map_err(|_| BatchError::WorkerPool("result channel closed".to_string()))
}
