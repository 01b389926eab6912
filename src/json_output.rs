//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per l'uso programmatico.
//!
//! ## Responsabilità:
//! - Emette un oggetto JSON per riga su stdout (flag `--json`)
//! - Utilizza le strutture esistenti di `ConversionResult` e `BatchSummary`
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio del batch
//! - `file_complete`: Fine conversione di un file (successo o errore)
//! - `complete`: Fine batch con statistiche finali
//! - `error`: Errore fatale

use crate::config::ConversionOptions;
use crate::converter::types::{BatchSummary, ConversionResult, Outcome};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    /// Inizio del batch
    Start {
        input: PathBuf,
        output_dir: Option<PathBuf>,
        total_files: usize,
        config: JsonConfig,
    },

    /// Fine conversione di un file specifico
    FileComplete {
        index: usize,
        total: usize,
        source: PathBuf,
        destination: PathBuf,
        success: bool,
        input_bytes: Option<u64>,
        output_bytes: Option<u64>,
        width: Option<u32>,
        height: Option<u32>,
        reduction_percent: Option<f64>,
        error_kind: Option<String>,
        error: Option<String>,
    },

    /// Batch completato
    Complete {
        total: usize,
        succeeded: usize,
        failed: usize,
        input_bytes: u64,
        output_bytes: u64,
        average_reduction: f64,
        duration_seconds: f64,
    },

    /// Errore fatale
    Error {
        message: String,
        kind: Option<String>,
    },
}

/// Configurazione per output JSON
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct JsonConfig {
    pub quality: u8,
    pub recursive: bool,
    pub workers: usize,
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn start(input: PathBuf, total_files: usize, options: &ConversionOptions) -> Self {
        Self::Start {
            input,
            output_dir: options.output_directory().map(PathBuf::from),
            total_files,
            config: JsonConfig::from(options),
        }
    }

    pub fn file_complete(result: &ConversionResult, index: usize, total: usize) -> Self {
        let (input_bytes, output_bytes, width, height, error_kind, error) = match result.outcome() {
            Outcome::Success {
                input_bytes,
                output_bytes,
                width,
                height,
            } => (
                Some(*input_bytes),
                Some(*output_bytes),
                Some(*width),
                Some(*height),
                None,
                None,
            ),
            Outcome::Failure { reason } => (
                None,
                None,
                None,
                None,
                Some(reason.kind().to_string()),
                Some(reason.to_string()),
            ),
        };

        Self::FileComplete {
            index,
            total,
            source: result.source().to_path_buf(),
            destination: result.destination().to_path_buf(),
            success: result.is_success(),
            input_bytes,
            output_bytes,
            width,
            height,
            reduction_percent: result.reduction_percent(),
            error_kind,
            error,
        }
    }

    pub fn complete(summary: &BatchSummary, duration_seconds: f64) -> Self {
        Self::Complete {
            total: summary.total(),
            succeeded: summary.success_count(),
            failed: summary.failure_count(),
            input_bytes: summary.total_input_bytes(),
            output_bytes: summary.total_output_bytes(),
            average_reduction: summary.overall_reduction_percent(),
            duration_seconds,
        }
    }

    pub fn error(err: &crate::error::ConvertError) -> Self {
        Self::Error {
            message: err.to_string(),
            kind: Some(err.kind().to_string()),
        }
    }
}

impl From<&ConversionOptions> for JsonConfig {
    fn from(options: &ConversionOptions) -> Self {
        Self {
            quality: options.quality(),
            recursive: options.recursive(),
            workers: options.workers(),
        }
    }
}
