//! # heic2webp Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Opzioni di conversione e validazione parametri
//! - `error`: Tipi di errore custom (fatali e per-file)
//! - `file_manager`: Classificazione file HEIC e discovery
//! - `codec`: Confine verso decoder/encoder esterni
//! - `converter`: Orchestratore del batch, worker, path di output, report
//! - `tool_resolver`: Ricerca dei tool esterni
//! - `progress` / `json_output`: Presentazione dei risultati
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use heic2webp::{BatchRunner, ConversionOptions, ExternalToolCodec};
//! use std::sync::Arc;
//!
//! let options = ConversionOptions::new(85)?.with_recursive(true);
//! let runner = BatchRunner::new(Arc::new(ExternalToolCodec::new()));
//! let summary = runner.run(&path, &options).await?;
//! println!("{}/{}", summary.success_count(), summary.total());
//! ```

pub mod utils;

pub mod codec;
pub mod config;
pub mod converter;
pub mod error;
pub mod file_manager;
pub mod json_output;
pub mod progress;
pub mod tool_resolver;

pub use codec::{CodecAdapter, DecodedImage, ExternalToolCodec};
pub use config::ConversionOptions;
pub use converter::{BatchRunner, BatchSummary, ConversionResult, ConversionWorker, Outcome, SourceFile};
pub use error::ConvertError;
pub use file_manager::FileManager;
