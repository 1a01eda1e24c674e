//! Collects worker results into a batch summary and reports progress.

use tokio::sync::mpsc;

use crate::types::{BatchSummary, ConversionResult, ProgressReport};

/// Receives progress as results arrive.
///
/// Called on the aggregating task, once per result, in completion order.
pub trait ProgressObserver: Send {
    fn on_progress(&mut self, report: &ProgressReport);

    /// Called after `on_progress` for a file that failed (not cancelled).
    fn on_failure(&mut self, _result: &ConversionResult) {}
}

/// `Failed to process <name>: <cause>` for a failed result.
pub fn failure_line(result: &ConversionResult) -> String {
    match result.error() {
        Some(e) => format!("Failed to process {}: {e}", result.file_name),
        None => format!("Failed to process {}", result.file_name),
    }
}

/// Observer that writes one log line per completed file.
#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_progress(&mut self, report: &ProgressReport) {
        tracing::info!(
            "Processing ({}/{}) [{}%]: {}",
            report.processed,
            report.total,
            report.percent,
            report.file_name
        );
    }

    fn on_failure(&mut self, result: &ConversionResult) {
        tracing::error!("{}", failure_line(result));
    }
}

/// Observer that ignores everything.
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _report: &ProgressReport) {}
}

/// Folds results into a [`BatchSummary`], keeping each result.
pub struct Aggregator {
    summary: BatchSummary,
    results: Vec<ConversionResult>,
}

impl Aggregator {
    pub fn new(total: usize) -> Self {
        Self {
            summary: BatchSummary::new(total),
            results: Vec::with_capacity(total),
        }
    }

    /// Record one result and notify the observer.
    pub fn record(&mut self, result: ConversionResult, observer: &mut dyn ProgressObserver) {
        let report = self.summary.record(&result);
        observer.on_progress(&report);

        if result.error().is_some_and(|e| !e.is_cancelled()) {
            observer.on_failure(&result);
        }
        self.results.push(result);
    }

    /// Drain the result channel until every sender is gone.
    pub async fn consume(
        &mut self,
        rx: &mut mpsc::Receiver<ConversionResult>,
        observer: &mut dyn ProgressObserver,
    ) {
        while let Some(result) = rx.recv().await {
            self.record(result, observer);
        }
    }

    pub fn summary(&self) -> &BatchSummary {
        &self.summary
    }

    /// Finish and hand back the summary and the results in completion order.
    pub fn finish(self) -> (BatchSummary, Vec<ConversionResult>) {
        (self.summary, self.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TranscodeError;
    use crate::pipeline::dispatcher::tests::tasks;
    use crate::types::ConvertedImage;
    use std::time::Duration;

    #[derive(Default)]
    struct Recording {
        reports: Vec<ProgressReport>,
        failures: Vec<String>,
    }

    impl ProgressObserver for Recording {
        fn on_progress(&mut self, report: &ProgressReport) {
            self.reports.push(report.clone());
        }

        fn on_failure(&mut self, result: &ConversionResult) {
            self.failures.push(result.file_name.clone());
        }
    }

    fn ok() -> Result<ConvertedImage, TranscodeError> {
        Ok(ConvertedImage {
            source_width: 4,
            source_height: 2,
            width: 4,
            height: 2,
            bytes: 10,
        })
    }

    #[test]
    fn test_progress_counts_up_to_total() {
        let tasks = tasks(&["a.heic", "b.heic", "c.heic"]);
        let mut aggregator = Aggregator::new(tasks.len());
        let mut observer = Recording::default();

        let outcomes = [
            ok(),
            Err(TranscodeError::Decode {
                path: tasks[1].input.path.clone(),
                message: "bad".to_string(),
            }),
            Err(TranscodeError::Cancelled(tasks[2].input.path.clone())),
        ];
        for (task, outcome) in tasks.iter().zip(outcomes) {
            aggregator.record(
                ConversionResult::new(task, outcome, Duration::ZERO),
                &mut observer,
            );
        }

        let percents: Vec<u8> = observer.reports.iter().map(|r| r.percent).collect();
        assert_eq!(percents, vec![33, 66, 100]);
        assert_eq!(observer.failures, vec!["b.heic".to_string()]);

        let (summary, results) = aggregator.finish();
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.converted, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.cancelled, 1);
        assert_eq!(summary.output_bytes, 10);
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_failure_line_names_file_and_cause() {
        let tasks = tasks(&["b.heif"]);
        let result = ConversionResult::new(
            &tasks[0],
            Err(TranscodeError::UnrecognizedFormat {
                path: tasks[0].input.path.clone(),
            }),
            Duration::ZERO,
        );
        assert_eq!(
            failure_line(&result),
            "Failed to process b.heif: Unrecognized image data in /in/b.heif"
        );
    }

    #[tokio::test]
    async fn test_consume_drains_channel() {
        let tasks = tasks(&["a.heic", "b.heic"]);
        let (tx, mut rx) = mpsc::channel(1);
        let producer = tokio::spawn(async move {
            for task in &tasks {
                tx.send(ConversionResult::new(task, ok(), Duration::ZERO))
                    .await
                    .unwrap();
            }
        });

        let mut aggregator = Aggregator::new(2);
        aggregator.consume(&mut rx, &mut NoProgress).await;
        producer.await.unwrap();

        assert!(aggregator.summary().is_complete());
        assert_eq!(aggregator.summary().converted, 2);
    }
}
