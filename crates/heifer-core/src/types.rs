//! Core data types for the Heifer conversion pipeline.
//!
//! A batch moves files through three shapes: [`InputFile`] from discovery,
//! [`ConversionTask`] once an output path is assigned, and
//! [`ConversionResult`] when a worker is done with it. [`BatchSummary`]
//! accumulates the results.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::TranscodeError;

/// A HEIF-family file found in the input directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl InputFile {
    /// File name portion of the path, lossily converted.
    pub fn file_name(&self) -> String {
        file_name_of(&self.path)
    }
}

/// One unit of work: an input and the JPEG it should become.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTask {
    pub input: InputFile,
    pub output_path: PathBuf,
}

/// Details of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertedImage {
    /// Decoded source width
    pub source_width: u32,
    /// Decoded source height
    pub source_height: u32,
    /// Written JPEG width
    pub width: u32,
    /// Written JPEG height
    pub height: u32,
    /// Size of the written JPEG in bytes
    pub bytes: u64,
}

/// The outcome of converting one file.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub file_name: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub outcome: Result<ConvertedImage, TranscodeError>,
    pub elapsed: Duration,
}

impl ConversionResult {
    /// Build a result for a task.
    pub fn new(
        task: &ConversionTask,
        outcome: Result<ConvertedImage, TranscodeError>,
        elapsed: Duration,
    ) -> Self {
        Self {
            file_name: task.input.file_name(),
            input_path: task.input.path.clone(),
            output_path: task.output_path.clone(),
            outcome,
            elapsed,
        }
    }

    /// Whether the JPEG was written.
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The failure, if any.
    pub fn error(&self) -> Option<&TranscodeError> {
        self.outcome.as_ref().err()
    }
}

/// Progress snapshot emitted once per completed result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressReport {
    pub processed: usize,
    pub total: usize,
    /// `floor(processed * 100 / total)`
    pub percent: u8,
    pub file_name: String,
    pub succeeded: bool,
}

/// A file that did not convert, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub file_name: String,
    pub reason: String,
}

/// Running totals for a batch.
///
/// `processed` counts every result; `failed` and `cancelled` are disjoint
/// subsets of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub processed: usize,
    pub converted: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Bytes of JPEG written
    pub output_bytes: u64,
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    pub failures: Vec<FailedFile>,
}

impl BatchSummary {
    /// Start a summary for `total` files.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Fold one result into the totals and describe the new progress.
    pub fn record(&mut self, result: &ConversionResult) -> ProgressReport {
        self.processed += 1;
        match &result.outcome {
            Ok(image) => {
                self.converted += 1;
                self.output_bytes += image.bytes;
            }
            Err(e) if e.is_cancelled() => self.cancelled += 1,
            Err(e) => {
                self.failed += 1;
                self.failures.push(FailedFile {
                    file_name: result.file_name.clone(),
                    reason: e.to_string(),
                });
            }
        }

        ProgressReport {
            processed: self.processed,
            total: self.total,
            percent: percent(self.processed, self.total),
            file_name: result.file_name.clone(),
            succeeded: result.succeeded(),
        }
    }

    /// Whether every discovered file has a result.
    pub fn is_complete(&self) -> bool {
        self.processed == self.total
    }

    /// Converted images per second over the batch.
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.converted as f64 / secs
        } else {
            0.0
        }
    }
}

/// Integer percentage, rounded down. An empty batch is 100% done.
pub fn percent(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((processed.min(total) * 100) / total) as u8
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}
