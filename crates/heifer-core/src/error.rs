//! Error types for the Heifer conversion pipeline.
//!
//! Errors are split by blast radius: configuration and batch errors stop the
//! whole run, transcode errors belong to a single file and are recorded in its
//! [`ConversionResult`](crate::types::ConversionResult).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Heifer operations.
#[derive(Error, Debug)]
pub enum HeiferError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Batch infrastructure errors
    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A single configuration value is invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// Every problem found while validating a configuration
    #[error("Invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl ConfigError {
    /// The individual validation problems, one message each.
    pub fn problems(&self) -> Vec<String> {
        match self {
            ConfigError::Invalid(problems) => problems.clone(),
            other => vec![other.to_string()],
        }
    }
}

/// Structural failures that abort the whole batch.
#[derive(Error, Debug)]
pub enum BatchError {
    /// Input directory is missing or cannot be listed
    #[error("Input directory not found or unreadable: {path} ({message})")]
    DirectoryNotFound { path: PathBuf, message: String },

    /// Output directory could not be created or is not a directory
    #[error("Output directory unusable: {path} ({message})")]
    OutputDirectory { path: PathBuf, message: String },

    /// Two inputs would be written to the same output file
    #[error("Output collision: {first} and {second} both map to {output}")]
    OutputCollision {
        first: PathBuf,
        second: PathBuf,
        output: PathBuf,
    },

    /// A worker panicked while converting a file
    #[error("Worker crashed while converting {path}: {message}")]
    WorkerPanicked { path: PathBuf, message: String },

    /// The worker pool itself failed (closed semaphore, dropped channel)
    #[error("Worker pool failure: {0}")]
    WorkerPool(String),

    /// The batch was cancelled before every file was converted
    #[error("Batch cancelled after {processed}/{total} file(s)")]
    Cancelled { processed: usize, total: usize },
}

/// Per-file conversion errors, organized by stage.
///
/// These never abort the batch; they become a failed result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscodeError {
    /// Source file does not exist
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Source file could not be read
    #[error("Read error for {path}: {message}")]
    Read { path: PathBuf, message: String },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Header matches no known image signature
    #[error("Unrecognized image data in {path}")]
    UnrecognizedFormat { path: PathBuf },

    /// Recognized container that this build cannot decode
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Decoded dimensions exceed the decode guard
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// JPEG encoding failed
    #[error("Encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// Output file could not be written
    #[error("Write error for {path}: {message}")]
    Write { path: PathBuf, message: String },

    /// Conversion exceeded the per-task timeout
    #[error("Timeout converting {path} after {timeout_ms}ms")]
    Timeout { path: PathBuf, timeout_ms: u64 },

    /// Conversion was cancelled before it finished
    #[error("Cancelled: {0}")]
    Cancelled(PathBuf),
}

impl TranscodeError {
    /// Whether this failure came from cancellation rather than the file itself.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TranscodeError::Cancelled(_))
    }
}

/// Convenience type alias for Heifer results.
pub type Result<T> = std::result::Result<T, HeiferError>;

/// Convenience type alias for per-file transcode results.
pub type TranscodeResult<T> = std::result::Result<T, TranscodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_lists_every_problem() {
        let err = ConfigError::Invalid(vec![
            "Input directory is not set".to_string(),
            "Output directory is not set".to_string(),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("Input directory is not set"));
        assert!(msg.contains("Output directory is not set"));
        assert_eq!(err.problems().len(), 2);
    }

    #[test]
    fn test_single_error_problems() {
        let err = ConfigError::ValidationError("bad".into());
        assert_eq!(err.problems(), vec!["Invalid configuration: bad".to_string()]);
    }

    #[test]
    fn test_cancelled_detection() {
        assert!(TranscodeError::Cancelled(PathBuf::from("a.heic")).is_cancelled());
        assert!(!TranscodeError::FileNotFound(PathBuf::from("a.heic")).is_cancelled());
    }
}
