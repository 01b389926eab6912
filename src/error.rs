//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `ConvertError` enum per categorizzare tutti gli errori possibili
//! - Distingue errori fatali (abortiscono il batch) da errori per-file
//! - Integra con `thiserror` per messaggi ed error chaining
//!
//! ## Categorie di errori:
//! - **Fatali**: `Config`, `NotFound`, `OutputDirectory`
//! - **Per-file**: `Decode`, `Encode`, `Write`, `Worker`
//! - `MissingTool`: tool esterno mancante (heif-dec, cwebp)
//!
//! ## Esempio:
//! ```rust,ignore
//! if !input.exists() {
//!     return Err(ConvertError::NotFound(input.to_path_buf()));
//! }
//! ```

use std::path::PathBuf;

/// Process exit status when every file converted (or there was nothing to do)
pub const EXIT_SUCCESS: u8 = 0;

/// Process exit status for fatal errors and batches with at least one failed file
pub const EXIT_FAILURE: u8 = 1;

/// Custom error types for HEIC to WebP conversion
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to create output directory {}: {source}", path.display())]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Write error: {0}")]
    Write(String),

    #[error("Worker error: {0}")]
    Worker(String),

    #[error("Dependency missing: {0}")]
    MissingTool(String),
}

impl ConvertError {
    /// True for errors that abort the whole batch before any file is processed
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::NotFound(_) | Self::OutputDirectory { .. }
        )
    }

    /// Exit status for a run that ended with this error
    pub fn exit_code(&self) -> u8 {
        EXIT_FAILURE
    }

    /// Short machine-friendly name of the error kind (used by JSON output)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::NotFound(_) => "not_found",
            Self::OutputDirectory { .. } => "output_directory",
            Self::Decode(_) => "decode",
            Self::Encode(_) => "encode",
            Self::Write(_) => "write",
            Self::Worker(_) => "worker",
            Self::MissingTool(_) => "missing_tool",
        }
    }
}
