//! # Converter Module
//!
//! Modulo che separa le responsabilità della conversione batch in sottomoduli:
//! - `batch_runner`: Orchestratore principale
//! - `worker`: Worker per singoli file
//! - `progress_tracker`: Report per-file e finale
//! - `path_resolver`: Calcolo del path di output
//! - `types`: Risultati e summary

pub mod batch_runner;
pub mod path_resolver;
pub mod progress_tracker;
pub mod types;
pub mod worker;

pub use batch_runner::BatchRunner;
pub use path_resolver::PathResolver;
pub use progress_tracker::ProgressTracker;
pub use types::{BatchSummary, ConversionResult, Outcome, SourceFile};
pub use worker::ConversionWorker;
