//! File discovery for finding HEIF images in a directory.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;
use crate::error::BatchError;
use crate::types::InputFile;

/// Discovers convertible files in a single directory level.
pub struct FileDiscovery {
    config: ProcessingConfig,
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// List the supported files directly inside `dir`.
    ///
    /// Subdirectories and non-matching names are skipped. A missing or
    /// unreadable directory is an error; there is nothing to convert.
    pub fn discover(&self, dir: &Path) -> Result<Vec<InputFile>, BatchError> {
        if !dir.is_dir() {
            return Err(BatchError::DirectoryNotFound {
                path: dir.to_path_buf(),
                message: "not a directory".to_string(),
            });
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(BatchError::DirectoryNotFound {
                        path: dir.to_path_buf(),
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    // Keep matching names so the failure shows up per file
                    if let Some(path) = e.path().filter(|p| self.is_supported(p)) {
                        tracing::warn!("Cannot resolve {}: {e}", path.display());
                        files.push(InputFile {
                            path: absolute(path),
                            size: 0,
                        });
                    }
                    continue;
                }
            };

            let entry_path = entry.path();
            if entry.file_type().is_dir() || !self.is_supported(entry_path) {
                continue;
            }
            let size = match entry.metadata() {
                Ok(meta) => meta.len(),
                Err(e) => {
                    tracing::warn!("Cannot read metadata for {}: {e}", entry_path.display());
                    0
                }
            };
            files.push(InputFile {
                path: absolute(entry_path),
                size,
            });
        }

        // Sort by path for deterministic submission order
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    /// Check whether a file name ends in a supported extension.
    pub fn is_supported(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| {
                let name = name.to_string_lossy().to_lowercase();
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| name.ends_with(&format!(".{}", fmt.to_lowercase())))
            })
            .unwrap_or(false)
    }

    /// Get total size of all discovered files.
    pub fn total_size(files: &[InputFile]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
