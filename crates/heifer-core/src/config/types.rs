//! Sub-configuration structs with their defaults.

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What to do when two inputs map to the same output file name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// Abort the batch before anything is written
    #[default]
    Fail,
    /// Name each colliding output `<stem>_<ext>.jpg`
    KeepExtension,
}

/// Resampling filter used when shrinking images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    #[default]
    CatmullRom,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// What to convert and where to put it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Directory scanned for HEIF files (not recursive)
    pub input_dir: PathBuf,

    /// Directory receiving the JPEG files, created if absent
    pub output_dir: PathBuf,

    /// Longest allowed edge of an output image; 0 means unset
    pub max_image_dimension: u32,

    /// Behavior when two inputs share an output name
    pub on_collision: CollisionPolicy,
}

/// Worker pool and discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of parallel workers; 0 uses every core
    pub parallel_workers: usize,

    /// Accepted input extensions, compared case-insensitively
    pub supported_formats: Vec<String>,

    /// Capacity of the result channel between workers and the aggregator
    pub buffer_size: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 0,
            supported_formats: vec!["heic".to_string(), "heif".to_string(), "hif".to_string()],
            buffer_size: 64,
        }
    }
}

impl ProcessingConfig {
    /// Resolved pool size.
    pub fn worker_count(&self) -> usize {
        if self.parallel_workers == 0 {
            num_cpus::get().max(1)
        } else {
            self.parallel_workers
        }
    }
}

/// JPEG output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    /// JPEG quality, 1-100
    pub quality: u8,

    /// Multi-scan (progressive) layout
    pub progressive: bool,

    /// Optimized Huffman tables
    pub optimize: bool,

    /// Downscaling filter
    pub filter: ResizeFilter,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            quality: 95,
            progressive: true,
            optimize: true,
            filter: ResizeFilter::default(),
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum input file size in megabytes
    pub max_file_size_mb: u64,

    /// Largest decoded width or height accepted
    pub max_decoded_dimension: u32,

    /// Time allowed for one file, decode through write
    pub task_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 512,
            max_decoded_dimension: 65_535,
            task_timeout_ms: 300_000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,

    /// Log format (pretty, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
