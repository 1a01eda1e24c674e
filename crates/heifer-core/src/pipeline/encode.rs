//! JPEG encoding with progressive scans and optimized Huffman tables.

use image::DynamicImage;
use jpeg_encoder::{ColorType, Encoder};

use crate::config::EncodingConfig;

/// Encodes images as JPEG.
pub struct JpegWriter {
    config: EncodingConfig,
}

/// An encoded JPEG and its dimensions.
pub struct EncodedJpeg {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl JpegWriter {
    /// Create a new writer with the given encoding settings.
    pub fn new(config: EncodingConfig) -> Self {
        Self { config }
    }

    /// Encode `image` as JPEG, flattening it to 8-bit RGB first.
    ///
    /// Returns the encoder's message on failure.
    pub fn encode(&self, image: DynamicImage) -> Result<EncodedJpeg, String> {
        // JPEG has no alpha channel; into_rgb8 drops it along with >8-bit depth
        let rgb = image.into_rgb8();
        let (width, height) = rgb.dimensions();
        let (w16, h16) = match (u16::try_from(width), u16::try_from(height)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => return Err(format!("{width}x{height} exceeds the JPEG size limit")),
        };

        let mut bytes = Vec::new();
        let mut encoder = Encoder::new(&mut bytes, self.config.quality);
        encoder.set_progressive(self.config.progressive);
        encoder.set_optimized_huffman_tables(self.config.optimize);
        encoder
            .encode(rgb.as_raw(), w16, h16, ColorType::Rgb)
            .map_err(|e| e.to_string())?;

        Ok(EncodedJpeg {
            bytes,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageFormat};

    #[test]
    fn test_encode_produces_jpeg() {
        let writer = JpegWriter::new(EncodingConfig::default());
        let img = DynamicImage::new_rgb8(120, 80);

        let encoded = writer.encode(img).unwrap();
        assert_eq!((encoded.width, encoded.height), (120, 80));
        // SOI marker
        assert_eq!(&encoded.bytes[0..2], &[0xFF, 0xD8]);
        assert_eq!(
            image::guess_format(&encoded.bytes).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_encode_progressive_uses_sof2() {
        let writer = JpegWriter::new(EncodingConfig::default());
        let encoded = writer.encode(DynamicImage::new_rgb8(32, 32)).unwrap();
        // SOF2 marks a progressive DCT frame
        assert!(encoded.bytes.windows(2).any(|w| w == [0xFF, 0xC2]));
    }

    #[test]
    fn test_encode_drops_alpha() {
        let writer = JpegWriter::new(EncodingConfig::default());
        let img = DynamicImage::new_rgba8(16, 16);

        let encoded = writer.encode(img).unwrap();
        let decoded = image::load_from_memory(&encoded.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (16, 16));
        assert_eq!(decoded.color().channel_count(), 3);
    }

    #[test]
    fn test_encode_baseline() {
        let config = EncodingConfig {
            progressive: false,
            ..Default::default()
        };
        let writer = JpegWriter::new(config);
        let encoded = writer.encode(DynamicImage::new_rgb8(32, 32)).unwrap();
        assert!(encoded.bytes.windows(2).any(|w| w == [0xFF, 0xC0]));
    }
}
