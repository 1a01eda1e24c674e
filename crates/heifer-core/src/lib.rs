//! Heifer Core - parallel HEIF-to-JPEG batch conversion.
//!
//! Heifer scans a directory for HEIF/HEIC/HIF files, converts each one to a
//! downscaled progressive JPEG on a bounded worker pool, and reports progress
//! and per-file failures without letting one bad file stop the batch.
//!
//! # Architecture
//!
//! ```text
//! Discover → Plan outputs → Dispatch (N workers) → Aggregate → Summary
//!                               │
//!              Validate → Decode → Resize → Encode → Atomic write
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use heifer_core::{BatchConverter, Config, LogProgress};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> heifer_core::Result<()> {
//!     let mut config = Config::load()?;
//!     config.conversion.input_dir = "./photos".into();
//!     config.conversion.output_dir = "./jpegs".into();
//!     config.conversion.max_image_dimension = 4096;
//!
//!     let converter = BatchConverter::new(config)?;
//!     let report = converter.run(CancellationToken::new(), &mut LogProgress).await?;
//!     println!("{} converted, {} failed", report.summary.converted, report.summary.failed);
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod types;

pub use batch::{BatchConverter, BatchReport};
pub use config::{CollisionPolicy, Config, ResizeFilter};
pub use error::{
    BatchError, ConfigError, HeiferError, Result, TranscodeError, TranscodeResult,
};
pub use output::{ReportFormat, ReportWriter, ResultRecord};
pub use pipeline::{FileConverter, LogProgress, NoProgress, ProgressObserver, Transcoder};
pub use types::{
    BatchSummary, ConversionResult, ConversionTask, ConvertedImage, FailedFile, InputFile,
    ProgressReport,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
