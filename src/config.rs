//! # Configuration Management Module
//!
//! Questo modulo gestisce la configurazione di una conversione batch.
//!
//! ## Responsabilità:
//! - Definisce la struct `ConversionOptions` con tutti i parametri di conversione
//! - Valida i parametri al momento della costruzione (mai durante il batch)
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//!
//! ## Parametri di configurazione:
//! - `quality`: Qualità WebP (1-100, default: 85)
//! - `output_directory`: Directory di output (default: None = accanto al file sorgente)
//! - `recursive`: Scansione ricorsiva delle sottodirectory (default: false)
//! - `verbose`: Output dettagliato per file (default: false)
//! - `workers`: Numero di worker paralleli (default: 4)
//! - `json_output`: Eventi JSON su stdout (default: false)
//!
//! Una volta costruite, le opzioni sono read-only e condivise da tutti i worker.
//!
//! ## Esempio:
//! ```rust,ignore
//! let options = ConversionOptions::new(90)?
//!     .with_output_directory("converted/")
//!     .with_recursive(true);
//! ```

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_QUALITY: u8 = 85;
pub const DEFAULT_WORKERS: usize = 4;

/// Options for a conversion batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    quality: u8,
    output_directory: Option<PathBuf>,
    recursive: bool,
    verbose: bool,
    workers: usize,
    json_output: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            output_directory: None,
            recursive: false,
            verbose: false,
            workers: DEFAULT_WORKERS,
            json_output: false,
        }
    }
}

impl ConversionOptions {
    /// Build options with the given WebP quality, rejecting values outside 1-100
    pub fn new(quality: i64) -> Result<Self, ConvertError> {
        Ok(Self {
            quality: Self::check_quality(quality)?,
            ..Self::default()
        })
    }

    fn check_quality(quality: i64) -> Result<u8, ConvertError> {
        if (1..=100).contains(&quality) {
            Ok(quality as u8)
        } else {
            Err(ConvertError::Config(format!(
                "Quality must be between 1 and 100 (got {})",
                quality
            )))
        }
    }

    /// Replace the quality of already-built options
    pub fn with_quality(mut self, quality: i64) -> Result<Self, ConvertError> {
        self.quality = Self::check_quality(quality)?;
        Ok(self)
    }

    /// An empty path means "alongside the source file"
    pub fn with_output_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.output_directory = if dir.as_os_str().is_empty() {
            None
        } else {
            Some(dir)
        };
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_json_output(mut self, json_output: bool) -> Self {
        self.json_output = json_output;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Result<Self, ConvertError> {
        if workers == 0 {
            return Err(ConvertError::Config(
                "Number of workers must be greater than 0".to_string(),
            ));
        }
        self.workers = workers;
        Ok(self)
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn output_directory(&self) -> Option<&Path> {
        self.output_directory.as_deref()
    }

    pub fn recursive(&self) -> bool {
        self.recursive
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn json_output(&self) -> bool {
        self.json_output
    }

    /// Validate configuration parameters (needed after deserialization)
    pub fn validate(&self) -> Result<(), ConvertError> {
        Self::check_quality(self.quality as i64)?;

        if self.workers == 0 {
            return Err(ConvertError::Config(
                "Number of workers must be greater than 0".to_string(),
            ));
        }

        if matches!(self.output_directory, Some(ref dir) if dir.as_os_str().is_empty()) {
            return Err(ConvertError::Config(
                "Output directory must not be an empty path".to_string(),
            ));
        }

        Ok(())
    }

    /// Load configuration from a JSON file
    pub async fn from_file(path: &Path) -> Result<Self, ConvertError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            ConvertError::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        let options: ConversionOptions = serde_json::from_str(&content).map_err(|e| {
            ConvertError::Config(format!("Invalid config file {}: {}", path.display(), e))
        })?;
        options.validate()?;
        Ok(options)
    }

    /// Save configuration to a JSON file
    pub async fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
