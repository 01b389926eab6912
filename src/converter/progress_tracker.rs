//! # Progress Tracking Module
//!
//! Report per-file e finale del batch. Gestisce sia output JSON che output
//! testuale con barra di progresso. Ogni risultato viene riportato appena il
//! worker termina, quindi prima che il summary sia finalizzato.

use crate::{
    config::ConversionOptions,
    converter::types::{BatchSummary, ConversionResult, Outcome},
    file_manager::FileManager,
    json_output::JsonMessage,
    progress::ProgressManager,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Tracker condiviso (clonabile) tra i worker del batch
#[derive(Clone)]
pub struct ProgressTracker {
    total_files: usize,
    completed: Arc<AtomicUsize>,
    verbose: bool,
    json_output: bool,
    progress_manager: ProgressManager,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

/// One line per converted file; verbose mode adds dimensions and sizes
fn success_line(result: &ConversionResult, verbose: bool) -> String {
    let line = format!(
        "✅ {} → {}",
        file_name(result.source()),
        file_name(result.destination())
    );

    match result.outcome() {
        Outcome::Success {
            input_bytes,
            output_bytes,
            width,
            height,
        } if verbose => format!(
            "{} ({}x{}, {} → {}, {:.1}% smaller)",
            line,
            width,
            height,
            FileManager::format_size(*input_bytes),
            FileManager::format_size(*output_bytes),
            FileManager::calculate_reduction(*input_bytes, *output_bytes)
        ),
        _ => line,
    }
}

impl ProgressTracker {
    /// Crea un nuovo tracker
    pub fn new(total_files: usize, options: &ConversionOptions) -> Self {
        let progress_manager = if options.verbose() || options.json_output() || total_files == 0 {
            ProgressManager::hidden()
        } else {
            ProgressManager::new(total_files as u64)
        };

        Self {
            total_files,
            completed: Arc::new(AtomicUsize::new(0)),
            verbose: options.verbose(),
            json_output: options.json_output(),
            progress_manager,
        }
    }

    /// Numero di file già riportati
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Annuncia l'inizio del batch
    pub fn announce_start(&self, root: &Path, options: &ConversionOptions) {
        if self.json_output {
            JsonMessage::start(root.to_path_buf(), self.total_files, options).emit();
            return;
        }

        if root.is_dir() {
            self.progress_manager
                .println(&format!("📂 Found {} HEIC file(s)", self.total_files));
        }
        if let Some(dir) = options.output_directory() {
            info!("Output directory: {}", dir.display());
        }
        debug!(
            "Quality: {}, workers: {}, recursive: {}",
            options.quality(),
            options.workers(),
            options.recursive()
        );
    }

    /// Directory senza file HEIC
    pub fn report_empty(&self) {
        if !self.json_output {
            self.progress_manager.println("📭 No HEIC files found");
        }
    }

    /// Riporta il risultato di un file appena convertito
    pub fn handle_file_completion(&self, result: &ConversionResult) {
        let index = self.completed.fetch_add(1, Ordering::SeqCst);
        let source_name = file_name(result.source());

        if self.json_output {
            JsonMessage::file_complete(result, index, self.total_files).emit();
            return;
        }

        match result.outcome() {
            Outcome::Success { .. } => {
                self.progress_manager
                    .println(&success_line(result, self.verbose));
                self.progress_manager.update(&format!("✅ {}", source_name));
            }
            Outcome::Failure { reason } => {
                self.progress_manager
                    .eprintln(&format!("❌ Failed: {}: {}", source_name, reason));
                self.progress_manager.update(&format!("❌ {}", source_name));
            }
        }
    }

    /// Chiude la barra e stampa il riepilogo finale
    pub fn finish(&self, summary: &BatchSummary, elapsed: Duration) {
        self.progress_manager.finish();

        if self.json_output {
            JsonMessage::complete(summary, elapsed.as_secs_f64()).emit();
            return;
        }

        if summary.total() == 0 {
            return;
        }

        println!(
            "\n📊 Converted: {}/{} files",
            summary.success_count(),
            summary.total()
        );

        if self.verbose && summary.success_count() > 0 {
            info!(
                "Total: {} → {} ({:.1}% smaller) in {:.2}s",
                FileManager::format_size(summary.total_input_bytes()),
                FileManager::format_size(summary.total_output_bytes()),
                summary.overall_reduction_percent(),
                elapsed.as_secs_f64()
            );
        }
    }
}
