//! # Path Resolution Module
//!
//! Centralizza il calcolo del path di output di ogni file convertito.
//! Funzione pura: nessun accesso al filesystem.

use crate::file_manager::TARGET_EXTENSION;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Utility per calcolare i path di output in modo centralizzato
pub struct PathResolver;

impl PathResolver {
    /// Calcola il path di output per un file sorgente.
    ///
    /// Senza override (o con override vuoto) il file finisce accanto al sorgente,
    /// altrimenti nella directory indicata. Solo l'ultima estensione viene sostituita.
    pub fn resolve(source: &Path, output_dir: Option<&Path>) -> PathBuf {
        let dir = match output_dir {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => source.parent().unwrap_or(Path::new("")),
        };

        dir.join(Self::output_file_name(source))
    }

    fn output_file_name(source: &Path) -> OsString {
        let mut name = source
            .file_stem()
            .unwrap_or(source.as_os_str())
            .to_os_string();
        name.push(".");
        name.push(TARGET_EXTENSION);
        name
    }
}
