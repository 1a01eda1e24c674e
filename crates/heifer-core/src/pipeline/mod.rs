//! Conversion pipeline components.
//!
//! Per-file stages, run by a worker on the blocking pool:
//! - **validate**: Existence, size and content sniffing
//! - **decode**: HEIF (libheif) or image-crate decoding
//! - **thumbnail**: Aspect-preserving downscale
//! - **encode**: Progressive JPEG encoding
//! - **transcoder**: Runs the stages and writes the output atomically
//!
//! Batch plumbing:
//! - **discovery**: Find HEIF-family files in the input directory
//! - **plan**: Map inputs to output paths and detect collisions
//! - **dispatcher**: Bounded worker pool
//! - **aggregator**: Progress reporting and the batch summary
//! - **channel**: Bounded result channel

pub mod aggregator;
pub mod channel;
pub mod decode;
pub mod discovery;
pub mod dispatcher;
pub mod encode;
pub mod plan;
pub mod thumbnail;
pub mod transcoder;
pub mod validate;

pub use aggregator::{failure_line, Aggregator, LogProgress, NoProgress, ProgressObserver};
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::FileDiscovery;
pub use dispatcher::{DispatchOptions, Dispatcher, FileConverter};
pub use encode::{EncodedJpeg, JpegWriter};
pub use plan::{output_name, plan_tasks};
pub use thumbnail::{fit_dimensions, ThumbnailGenerator};
pub use transcoder::Transcoder;
pub use validate::{SourceFormat, Validator};
