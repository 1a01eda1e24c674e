//! Single-file transcoder: validate, decode, resize, encode, write.

use std::io::Write;
use std::path::Path;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{TranscodeError, TranscodeResult};
use crate::types::{ConversionTask, ConvertedImage};

use super::decode::ImageDecoder;
use super::encode::JpegWriter;
use super::thumbnail::ThumbnailGenerator;
use super::validate::Validator;

/// Converts one HEIF file into one JPEG.
///
/// Holds only read-only settings, so a single instance can be shared by every
/// worker. Each call owns its image buffers and drops them before returning.
pub struct Transcoder {
    validator: Validator,
    decoder: ImageDecoder,
    thumbnail_gen: ThumbnailGenerator,
    writer: JpegWriter,
}

impl Transcoder {
    /// Create a transcoder from the batch configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            validator: Validator::new(config.limits.clone()),
            decoder: ImageDecoder::new(config.limits.clone()),
            thumbnail_gen: ThumbnailGenerator::new(
                config.conversion.max_image_dimension,
                config.encoding.filter,
            ),
            writer: JpegWriter::new(config.encoding.clone()),
        }
    }

    /// Run a task, tracing any failure at debug level.
    pub fn transcode(
        &self,
        task: &ConversionTask,
        cancel: &CancellationToken,
    ) -> TranscodeResult<ConvertedImage> {
        let result = self.convert(&task.input.path, &task.output_path, cancel);
        match &result {
            Err(e) if e.is_cancelled() => {
                tracing::debug!("Cancelled {}", task.input.path.display());
            }
            // Reported once, by the progress observer
            Err(e) => tracing::debug!("Conversion of {} failed: {e}", task.input.path.display()),
            Ok(_) => {}
        }
        result
    }

    /// Convert `input` into a JPEG at `output`.
    ///
    /// `cancel` is checked between stages; once it fires nothing is written.
    /// On any error `output` is left as it was.
    pub fn convert(
        &self,
        input: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> TranscodeResult<ConvertedImage> {
        let start = Instant::now();
        let checkpoint = || {
            if cancel.is_cancelled() {
                Err(TranscodeError::Cancelled(input.to_path_buf()))
            } else {
                Ok(())
            }
        };

        checkpoint()?;
        let format = self.validator.validate(input)?;

        let decode_start = Instant::now();
        let decoded = self.decoder.decode(input, format)?;
        let (source_width, source_height) = (decoded.width, decoded.height);
        tracing::trace!("  Decode ({}): {:?}", format.name(), decode_start.elapsed());
        checkpoint()?;

        let resize_start = Instant::now();
        let resized = self.thumbnail_gen.generate(decoded.image);
        tracing::trace!("  Resize: {:?}", resize_start.elapsed());
        checkpoint()?;

        let encode_start = Instant::now();
        let encoded = self
            .writer
            .encode(resized)
            .map_err(|message| TranscodeError::Encode {
                path: input.to_path_buf(),
                message,
            })?;
        tracing::trace!("  Encode: {:?}", encode_start.elapsed());

        let bytes = encoded.bytes.len() as u64;
        write_atomic(output, &encoded.bytes, &checkpoint)?;

        tracing::debug!(
            "Converted {} in {:?} ({}x{} -> {}x{})",
            input.display(),
            start.elapsed(),
            source_width,
            source_height,
            encoded.width,
            encoded.height
        );

        Ok(ConvertedImage {
            source_width,
            source_height,
            width: encoded.width,
            height: encoded.height,
            bytes,
        })
    }
}

/// Write through a temp file in the destination directory, then rename.
fn write_atomic(
    output: &Path,
    bytes: &[u8],
    checkpoint: &dyn Fn() -> TranscodeResult<()>,
) -> TranscodeResult<()> {
    let write_err = |e: std::io::Error| TranscodeError::Write {
        path: output.to_path_buf(),
        message: e.to_string(),
    };

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".heifer-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;

    // Dropping the temp file removes it
    checkpoint()?;
    tmp.persist(output).map_err(|e| write_err(e.error))?;

    // A timeout that fired during the rename has already reported this file
    // as failed, so the JPEG must not stay behind
    if let Err(e) = checkpoint() {
        if let Err(remove) = std::fs::remove_file(output) {
            tracing::warn!("Cannot remove {}: {remove}", output.display());
        }
        return Err(e);
    }
    Ok(())
}
