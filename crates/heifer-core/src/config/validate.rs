//! Configuration validation.
//!
//! Range checks run when a config file is loaded. The full check, which also
//! requires the conversion paths, runs once every override has been applied.

use crate::error::ConfigError;

use super::Config;

/// JPEG frame headers store dimensions as 16-bit values.
pub const MAX_JPEG_DIMENSION: u32 = u16::MAX as u32;

impl Config {
    /// Validate value ranges that a config file alone can get wrong.
    pub(crate) fn check_ranges(&self) -> Result<(), ConfigError> {
        match self.range_problems().into_iter().next() {
            Some(problem) => Err(ConfigError::ValidationError(problem)),
            None => Ok(()),
        }
    }

    /// Validate the complete configuration before a batch starts.
    ///
    /// Collects every problem instead of stopping at the first one. Only reads
    /// the filesystem; nothing is created.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();
        let input = self.input_dir();
        let output = self.output_dir();

        if self.conversion.input_dir.as_os_str().is_empty() {
            problems.push("Input directory is not set".to_string());
        } else if !input.is_dir() {
            problems.push(format!(
                "Input directory does not exist: {}",
                input.display()
            ));
        }

        if self.conversion.output_dir.as_os_str().is_empty() {
            problems.push("Output directory is not set".to_string());
        } else if output.exists() && !output.is_dir() {
            problems.push(format!(
                "Output path exists and is not a directory: {}",
                output.display()
            ));
        }

        if self.conversion.max_image_dimension == 0 {
            problems.push("Max image size is not set".to_string());
        }

        problems.extend(self.range_problems());

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }

    fn range_problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.conversion.max_image_dimension > MAX_JPEG_DIMENSION {
            problems.push(format!(
                "conversion.max_image_dimension must be <= {MAX_JPEG_DIMENSION}"
            ));
        }
        if self.processing.buffer_size == 0 {
            problems.push("processing.buffer_size must be > 0".to_string());
        }
        if self.processing.supported_formats.is_empty() {
            problems.push("processing.supported_formats must not be empty".to_string());
        }
        if self.encoding.quality == 0 || self.encoding.quality > 100 {
            problems.push("encoding.quality must be between 1 and 100".to_string());
        }
        if self.limits.max_file_size_mb == 0 {
            problems.push("limits.max_file_size_mb must be > 0".to_string());
        }
        if self.limits.max_decoded_dimension == 0 {
            problems.push("limits.max_decoded_dimension must be > 0".to_string());
        }
        if self.limits.task_timeout_ms == 0 {
            problems.push("limits.task_timeout_ms must be > 0".to_string());
        }
        problems
    }
}
