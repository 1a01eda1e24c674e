//! Image decoding: HEIF through libheif, anything else by content sniffing.

use image::{DynamicImage, GenericImageView, ImageDecoder as _, ImageReader};
use std::io::Cursor;
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::TranscodeError;

use super::validate::SourceFormat;

/// Image decoder with configurable limits.
pub struct ImageDecoder {
    limits: LimitsConfig,
}

/// Result of decoding an image.
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected source format
    pub format: SourceFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Read and decode a file whose format was already sniffed.
    pub fn decode(&self, path: &Path, format: SourceFormat) -> Result<DecodedImage, TranscodeError> {
        let bytes = std::fs::read(path).map_err(|e| TranscodeError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        self.decode_bytes(&bytes, path, format)
    }

    /// Decode an in-memory file.
    pub fn decode_bytes(
        &self,
        bytes: &[u8],
        path: &Path,
        format: SourceFormat,
    ) -> Result<DecodedImage, TranscodeError> {
        let image = match format {
            SourceFormat::Heif { .. } => self.decode_heif(bytes, path)?,
            SourceFormat::Image(image_format) => {
                tracing::debug!(
                    "{} holds {} data, decoding by content",
                    path.display(),
                    format.name()
                );
                self.decode_image_crate(bytes, path, image_format)?
            }
            SourceFormat::OtherIsoBmff { brand } => {
                return Err(TranscodeError::UnsupportedFormat {
                    path: path.to_path_buf(),
                    format: String::from_utf8_lossy(&brand).into_owned(),
                });
            }
        };

        let (width, height) = image.dimensions();
        self.check_dimensions(path, width, height)?;
        Ok(DecodedImage {
            image,
            format,
            width,
            height,
        })
    }

    fn check_dimensions(&self, path: &Path, width: u32, height: u32) -> Result<(), TranscodeError> {
        let max_dim = self.limits.max_decoded_dimension;
        if width > max_dim || height > max_dim {
            return Err(TranscodeError::ImageTooLarge {
                path: path.to_path_buf(),
                width,
                height,
                max_dim,
            });
        }
        Ok(())
    }

    #[cfg(feature = "heif")]
    fn decode_heif(&self, bytes: &[u8], path: &Path) -> Result<DynamicImage, TranscodeError> {
        use libheif_rs::{ColorSpace, HeifContext, HeifError, LibHeif, RgbChroma};

        let decode_err = |e: HeifError| TranscodeError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let lib_heif = LibHeif::new();
        let ctx = HeifContext::read_from_bytes(bytes).map_err(decode_err)?;
        let handle = ctx.primary_image_handle().map_err(decode_err)?;

        // Reject before allocating the pixel buffer
        self.check_dimensions(path, handle.width(), handle.height())?;

        // Alpha and HDR planes are dropped by asking for 8-bit interleaved RGB
        let decoded = lib_heif
            .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
            .map_err(decode_err)?;
        let planes = decoded.planes();
        let plane = planes.interleaved.ok_or_else(|| TranscodeError::Decode {
            path: path.to_path_buf(),
            message: "decoder returned no interleaved RGB plane".to_string(),
        })?;

        let row_len = plane.width as usize * 3;
        let mut pixels = Vec::with_capacity(row_len * plane.height as usize);
        for row in plane.data.chunks(plane.stride).take(plane.height as usize) {
            let row = row.get(..row_len).ok_or_else(|| TranscodeError::Decode {
                path: path.to_path_buf(),
                message: "truncated pixel row".to_string(),
            })?;
            pixels.extend_from_slice(row);
        }

        image::RgbImage::from_raw(plane.width, plane.height, pixels)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| TranscodeError::Decode {
                path: path.to_path_buf(),
                message: "pixel buffer does not match image size".to_string(),
            })
    }

    #[cfg(not(feature = "heif"))]
    fn decode_heif(&self, _bytes: &[u8], path: &Path) -> Result<DynamicImage, TranscodeError> {
        Err(TranscodeError::UnsupportedFormat {
            path: path.to_path_buf(),
            format: "heif (built without the `heif` feature)".to_string(),
        })
    }

    /// Decode with the `image` crate, applying EXIF orientation.
    fn decode_image_crate(
        &self,
        bytes: &[u8],
        path: &Path,
        format: image::ImageFormat,
    ) -> Result<DynamicImage, TranscodeError> {
        let decode_err = |e: image::ImageError| TranscodeError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let mut decoder = ImageReader::with_format(Cursor::new(bytes), format)
            .into_decoder()
            .map_err(decode_err)?;

        // Header dimensions, checked before the pixel buffer is allocated
        let (width, height) = decoder.dimensions();
        self.check_dimensions(path, width, height)?;

        let orientation = decoder.orientation().map_err(decode_err)?;
        let mut image = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
        image.apply_orientation(orientation);
        Ok(image)
    }
}
