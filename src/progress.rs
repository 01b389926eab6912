//! # Progress Bar Module
//!
//! Barra di progresso `indicatif` per il feedback real-time durante il batch.
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:12] [========================>---------------] 12/20 (60%) ✅ IMG_0012.heic
//! ```
//!
//! La barra è nascosta in modalità verbose o JSON (l'output è già riga per riga)
//! e quando stderr non è un terminale.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Manages the progress bar of a conversion batch
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        ) {
            bar.set_style(style.progress_chars("=>-"));
        }

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// A manager that never draws
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Print a line above the bar (printed normally when the bar is hidden)
    pub fn println(&self, line: &str) {
        self.bar.suspend(|| println!("{}", line));
    }

    /// Print an error line above the bar
    pub fn eprintln(&self, line: &str) {
        self.bar.suspend(|| eprintln!("{}", line));
    }

    /// Finish and clear the bar
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
