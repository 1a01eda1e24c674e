//! Input validation and format sniffing before decode.

use image::ImageFormat;
use std::io::Read;
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::TranscodeError;

/// `ftyp` brands that mark an ISO-BMFF file as a HEIF image or sequence.
const HEIF_BRANDS: &[&[u8; 4]] = &[
    b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis", b"hevm", b"hevs", b"mif1", b"msf1",
    b"mif2",
];

/// How a file's bytes identify themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// HEIF container; `brand` is the major brand from the `ftyp` box
    Heif { brand: [u8; 4] },
    /// Any other ISO-BMFF file (MP4, MOV, ...)
    OtherIsoBmff { brand: [u8; 4] },
    /// A format the `image` crate recognizes by signature
    Image(ImageFormat),
}

impl SourceFormat {
    /// Identify a file from its leading bytes.
    pub fn sniff(header: &[u8]) -> Option<Self> {
        if header.len() >= 12 && &header[4..8] == b"ftyp" {
            let mut brand = [0u8; 4];
            brand.copy_from_slice(&header[8..12]);
            return if is_heif_ftyp(header) {
                Some(SourceFormat::Heif { brand })
            } else {
                Some(SourceFormat::OtherIsoBmff { brand })
            };
        }
        image::guess_format(header).ok().map(SourceFormat::Image)
    }

    /// Short name for logs and errors.
    pub fn name(&self) -> String {
        match self {
            SourceFormat::Heif { brand } | SourceFormat::OtherIsoBmff { brand } => {
                String::from_utf8_lossy(brand).into_owned()
            }
            SourceFormat::Image(format) => format!("{format:?}").to_lowercase(),
        }
    }
}

/// Check the major brand and the compatible brands of an `ftyp` box.
fn is_heif_ftyp(header: &[u8]) -> bool {
    let box_size = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let end = box_size.min(header.len());

    let major = &header[8..12];
    if HEIF_BRANDS.iter().any(|b| &b[..] == major) {
        return true;
    }
    // Compatible brands start after the 4-byte minor version
    header
        .get(16..end)
        .map(|compat| {
            compat
                .chunks_exact(4)
                .any(|brand| HEIF_BRANDS.iter().any(|b| &b[..] == brand))
        })
        .unwrap_or(false)
}

/// Validates files before processing.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Perform quick validation before full decode.
    ///
    /// Checks:
    /// - File exists and is readable
    /// - File size is within limits
    /// - Header is a HEIF container or a known image signature
    pub fn validate(&self, path: &Path) -> Result<SourceFormat, TranscodeError> {
        if !path.exists() {
            return Err(TranscodeError::FileNotFound(path.to_path_buf()));
        }

        let metadata = std::fs::metadata(path).map_err(|e| TranscodeError::Read {
            path: path.to_path_buf(),
            message: format!("Cannot read metadata: {}", e),
        })?;

        // Huge limits mean "no limit", not an overflow
        let max_bytes = self.limits.max_file_size_mb.saturating_mul(1024 * 1024);
        if metadata.len() > max_bytes {
            return Err(TranscodeError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: metadata.len() / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        self.check_magic_bytes(path)
    }

    fn check_magic_bytes(&self, path: &Path) -> Result<SourceFormat, TranscodeError> {
        let file = std::fs::File::open(path).map_err(|e| TranscodeError::Read {
            path: path.to_path_buf(),
            message: format!("Cannot open file: {}", e),
        })?;

        // Large enough for an ftyp box with a handful of compatible brands
        let mut header = Vec::with_capacity(64);
        file.take(64)
            .read_to_end(&mut header)
            .map_err(|e| TranscodeError::Read {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        match SourceFormat::sniff(&header) {
            Some(SourceFormat::OtherIsoBmff { brand }) => Err(TranscodeError::UnsupportedFormat {
                path: path.to_path_buf(),
                format: String::from_utf8_lossy(&brand).into_owned(),
            }),
            Some(format) => Ok(format),
            None => Err(TranscodeError::UnrecognizedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}
