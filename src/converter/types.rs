//! Data types shared by the conversion pipeline.

use crate::error::{ConvertError, EXIT_FAILURE, EXIT_SUCCESS};
use std::path::{Path, PathBuf};

/// An absolute path known to denote a HEIC/HEIF source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceFile(PathBuf);

impl SourceFile {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn into_path(self) -> PathBuf {
        self.0
    }
}

/// Outcome of a single conversion attempt.
#[derive(Debug)]
pub enum Outcome {
    Success {
        input_bytes: u64,
        output_bytes: u64,
        width: u32,
        height: u32,
    },
    Failure {
        reason: ConvertError,
    },
}

/// Result of converting one source file. Created once by the worker, never mutated.
#[derive(Debug)]
pub struct ConversionResult {
    source: PathBuf,
    destination: PathBuf,
    outcome: Outcome,
}

impl ConversionResult {
    pub fn success(
        source: PathBuf,
        destination: PathBuf,
        input_bytes: u64,
        output_bytes: u64,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            source,
            destination,
            outcome: Outcome::Success {
                input_bytes,
                output_bytes,
                width,
                height,
            },
        }
    }

    pub fn failure(source: PathBuf, destination: PathBuf, reason: ConvertError) -> Self {
        Self {
            source,
            destination,
            outcome: Outcome::Failure { reason },
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }

    pub fn failure_reason(&self) -> Option<&ConvertError> {
        match &self.outcome {
            Outcome::Failure { reason } => Some(reason),
            Outcome::Success { .. } => None,
        }
    }

    /// `1 - output/input`, None for failures or empty inputs
    pub fn compression_ratio(&self) -> Option<f64> {
        match self.outcome {
            Outcome::Success {
                input_bytes,
                output_bytes,
                ..
            } if input_bytes > 0 => Some(1.0 - output_bytes as f64 / input_bytes as f64),
            _ => None,
        }
    }

    pub fn reduction_percent(&self) -> Option<f64> {
        self.compression_ratio().map(|ratio| ratio * 100.0)
    }
}

/// Aggregate of a batch run. Counts are always derived from `results`.
#[derive(Debug, Default)]
pub struct BatchSummary {
    results: Vec<ConversionResult>,
}

impl BatchSummary {
    pub fn new(results: Vec<ConversionResult>) -> Self {
        Self { results }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn results(&self) -> &[ConversionResult] {
        &self.results
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn successes(&self) -> impl Iterator<Item = &ConversionResult> {
        self.results.iter().filter(|r| r.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ConversionResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// 0 when nothing failed (an empty batch included), 1 otherwise
    pub fn exit_code(&self) -> u8 {
        if self.has_failures() {
            EXIT_FAILURE
        } else {
            EXIT_SUCCESS
        }
    }

    pub fn total_input_bytes(&self) -> u64 {
        self.successes()
            .map(|r| match r.outcome {
                Outcome::Success { input_bytes, .. } => input_bytes,
                Outcome::Failure { .. } => 0,
            })
            .sum()
    }

    pub fn total_output_bytes(&self) -> u64 {
        self.successes()
            .map(|r| match r.outcome {
                Outcome::Success { output_bytes, .. } => output_bytes,
                Outcome::Failure { .. } => 0,
            })
            .sum()
    }

    pub fn overall_reduction_percent(&self) -> f64 {
        let input = self.total_input_bytes();
        if input == 0 {
            0.0
        } else {
            (1.0 - self.total_output_bytes() as f64 / input as f64) * 100.0
        }
    }
}
