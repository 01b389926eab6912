//! # File Management Module
//!
//! Questo modulo gestisce il riconoscimento dei file sorgente e la loro discovery.
//!
//! ## Responsabilità:
//! - Classificazione dei file HEIC/HEIF per estensione (case-insensitive)
//! - Discovery dei file sorgente in una directory (ricorsiva o meno)
//! - Utilità per calcoli dimensioni e percentuali
//! - Formattazione human-readable delle dimensioni
//!
//! ## Formati supportati:
//! - **Sorgente**: HEIC, HEIF
//!
//! ## Discovery:
//! - Root file: restituisce il file se è un HEIC, altrimenti sequenza vuota
//! - Root directory: figli immediati, oppure tutto il sottoalbero con `recursive`
//! - Ordine deterministico (ordinamento per nome dentro ogni directory)
//! - I symlink a directory non vengono seguiti (nessun loop)
//!
//! ## Esempio:
//! ```rust,ignore
//! let files = FileManager::discover(Path::new("photos"), true)?;
//! for file in files {
//!     println!("{}", file.path().display());
//! }
//! ```

use crate::converter::types::SourceFile;
use crate::error::ConvertError;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extensions recognized as source images, lowercase
pub const SOURCE_EXTENSIONS: &[&str] = &["heic", "heif"];

/// Extension of every produced file
pub const TARGET_EXTENSION: &str = "webp";

/// Source classification and discovery
pub struct FileManager;

impl FileManager {
    /// Check if the path's final extension is a source extension (no filesystem access)
    pub fn has_source_extension(path: &Path) -> bool {
        if let Some(ext) = path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            SOURCE_EXTENSIONS.contains(&ext_lower.as_str())
        } else {
            false
        }
    }

    /// Check if a path is a regular file with a source extension.
    /// Symlinks are resolved once by the regular-file check.
    pub fn is_source_file(path: &Path) -> bool {
        path.is_file() && Self::has_source_extension(path)
    }

    /// Find the source files under `root`
    pub fn discover(root: &Path, recursive: bool) -> Result<Vec<SourceFile>, ConvertError> {
        let root = root.canonicalize().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConvertError::NotFound(root.to_path_buf())
            } else {
                ConvertError::Config(format!("Cannot access {}: {}", root.display(), e))
            }
        })?;

        if !root.is_dir() {
            return Ok(if Self::is_source_file(&root) {
                vec![SourceFile::new(root)]
            } else {
                debug!("Input is not a HEIC file: {}", root.display());
                Vec::new()
            });
        }

        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();

        for entry in WalkDir::new(&root)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };

            let path = entry.path();
            if Self::is_source_file(path) {
                files.push(SourceFile::new(path.to_path_buf()));
            }
        }

        debug!("Discovered {} source file(s) in {}", files.len(), root.display());
        Ok(files)
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.1} {}", size, UNITS[unit_index])
        }
    }

    /// Calculate percentage reduction
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            (1.0 - new_size as f64 / original_size as f64) * 100.0
        }
    }
}
