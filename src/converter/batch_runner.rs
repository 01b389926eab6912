//! # Batch Runner
//!
//! Orchestratore principale del batch: discovery → risoluzione path →
//! conversione parallela → summary.
//!
//! ## Garanzie:
//! - Errori fatali (`NotFound`, `Config`, `OutputDirectory`) prima di toccare i file
//! - La directory di output esiste prima che parta qualsiasi worker
//! - Isolamento per-file: il fallimento di un file non ferma gli altri
//! - Risultati nell'ordine di discovery, conteggi derivati dai risultati

use crate::{
    codec::CodecAdapter,
    config::ConversionOptions,
    converter::{
        path_resolver::PathResolver,
        progress_tracker::ProgressTracker,
        types::{BatchSummary, ConversionResult, SourceFile},
        worker::ConversionWorker,
    },
    error::ConvertError,
    file_manager::FileManager,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Drives a whole conversion batch
pub struct BatchRunner {
    codec: Arc<dyn CodecAdapter>,
}

impl BatchRunner {
    pub fn new(codec: Arc<dyn CodecAdapter>) -> Self {
        Self { codec }
    }

    /// Converte tutti i file sorgente sotto `root`
    pub async fn run(
        &self,
        root: &Path,
        options: &ConversionOptions,
    ) -> Result<BatchSummary, ConvertError> {
        let start_time = Instant::now();
        options.validate()?;

        let files = Self::collect_sources(root, options.recursive())?;

        if let Some(output_dir) = options.output_directory() {
            Self::ensure_output_directory(output_dir).await?;
        }

        let tracker = ProgressTracker::new(files.len(), options);

        if files.is_empty() {
            tracker.report_empty();
            let summary = BatchSummary::empty();
            tracker.finish(&summary, start_time.elapsed());
            return Ok(summary);
        }

        tracker.announce_start(root, options);

        let planned: Vec<(PathBuf, PathBuf)> = files
            .into_iter()
            .map(|file| {
                let destination = PathResolver::resolve(file.path(), options.output_directory());
                (file.into_path(), destination)
            })
            .collect();
        Self::warn_duplicate_destinations(&planned);

        let results = self.convert_all(planned, options, &tracker).await;
        let summary = BatchSummary::new(results);

        tracker.finish(&summary, start_time.elapsed());
        if summary.has_failures() {
            warn!(
                "{} of {} file(s) failed to convert",
                summary.failure_count(),
                summary.total()
            );
        }

        Ok(summary)
    }

    /// Discovery, più il caso di un singolo file passato esplicitamente
    /// con un'estensione non riconosciuta: viene comunque tentato.
    fn collect_sources(root: &Path, recursive: bool) -> Result<Vec<SourceFile>, ConvertError> {
        let files = FileManager::discover(root, recursive)?;

        if files.is_empty() && !root.is_dir() {
            let path = root
                .canonicalize()
                .map_err(|_| ConvertError::NotFound(root.to_path_buf()))?;
            warn!(
                "{} does not have a HEIC/HEIF extension, converting anyway",
                path.display()
            );
            return Ok(vec![SourceFile::new(path)]);
        }

        Ok(files)
    }

    /// Crea la directory di output (ricorsivamente) prima di ogni conversione
    async fn ensure_output_directory(output_dir: &Path) -> Result<(), ConvertError> {
        if !output_dir.is_dir() {
            tokio::fs::create_dir_all(output_dir)
                .await
                .map_err(|source| ConvertError::OutputDirectory {
                    path: output_dir.to_path_buf(),
                    source,
                })?;
            info!("Created output directory: {}", output_dir.display());
        }

        if !output_dir.is_dir() {
            return Err(ConvertError::OutputDirectory {
                path: output_dir.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "path exists and is not a directory",
                ),
            });
        }

        Ok(())
    }

    fn warn_duplicate_destinations(planned: &[(PathBuf, PathBuf)]) {
        let mut seen: HashMap<&Path, &Path> = HashMap::new();
        for (source, destination) in planned {
            if let Some(previous) = seen.insert(destination.as_path(), source.as_path()) {
                warn!(
                    "{} and {} both convert to {}; the last one written wins",
                    previous.display(),
                    source.display(),
                    destination.display()
                );
            }
        }
    }

    /// Esegue i worker con concorrenza limitata e raccoglie i risultati in ordine
    async fn convert_all(
        &self,
        planned: Vec<(PathBuf, PathBuf)>,
        options: &ConversionOptions,
        tracker: &ProgressTracker,
    ) -> Vec<ConversionResult> {
        let options = Arc::new(options.clone());
        let semaphore = Arc::new(Semaphore::new(options.workers()));
        let mut tasks = Vec::with_capacity(planned.len());

        for (source, destination) in planned {
            let worker = ConversionWorker::new(Arc::clone(&self.codec));
            let options = Arc::clone(&options);
            let tracker = tracker.clone();
            let semaphore = Arc::clone(&semaphore);
            let (task_source, task_destination) = (source.clone(), destination.clone());

            let task = tokio::spawn(async move {
                // Il permesso viene rilasciato quando il task finisce
                let _permit = semaphore.acquire_owned().await.ok();
                let result = worker
                    .convert(&task_source, &task_destination, &options)
                    .await;
                tracker.handle_file_completion(&result);
                result
            });

            tasks.push((source, destination, task));
        }

        debug!(
            "Spawned {} conversion task(s) using {}",
            tasks.len(),
            self.codec.name()
        );

        let (paths, handles): (Vec<_>, Vec<_>) = tasks
            .into_iter()
            .map(|(source, destination, task)| ((source, destination), task))
            .unzip();

        futures::future::join_all(handles)
            .await
            .into_iter()
            .zip(paths)
            .map(|(joined, (source, destination))| match joined {
                Ok(result) => result,
                Err(e) => {
                    error!("Conversion task for {} crashed: {}", source.display(), e);
                    let result = ConversionResult::failure(
                        source,
                        destination,
                        ConvertError::Worker(e.to_string()),
                    );
                    tracker.handle_file_completion(&result);
                    result
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::test_support::{MockCodec, CORRUPT_MARKER};
    use crate::error::{EXIT_FAILURE, EXIT_SUCCESS};
    use std::collections::BTreeSet;
    use std::fs;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    fn runner() -> BatchRunner {
        BatchRunner::new(Arc::new(MockCodec::default()))
    }

    fn write(path: &Path, content: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_photos_directory_to_output_override() {
        let dir = TempDir::new().unwrap();
        let photos = dir.path().join("photos");
        write(&photos.join("a.heic"), b"heic-a");
        write(&photos.join("b.heif"), b"heif-b");
        write(&photos.join("notes.txt"), b"not an image");
        let out = dir.path().join("out");

        let options = ConversionOptions::default().with_output_directory(&out);
        let summary = assert_ok!(runner().run(&photos, &options).await);

        assert_eq!(summary.total(), 2);
        assert_eq!(summary.success_count(), 2);
        assert_eq!(summary.failure_count(), 0);
        assert!(out.join("a.webp").is_file());
        assert!(out.join("b.webp").is_file());
        assert!(!out.join("notes.webp").exists());
        assert!(!photos.join("a.webp").exists());
    }

    #[tokio::test]
    async fn test_empty_directory_is_valid_summary() {
        let dir = TempDir::new().unwrap();
        let summary = assert_ok!(runner().run(dir.path(), &ConversionOptions::default()).await);

        assert_eq!(summary.total(), 0);
        assert_eq!(summary.success_count(), 0);
        assert_eq!(summary.failure_count(), 0);
        assert!(!summary.has_failures());
        assert_eq!(summary.exit_code(), EXIT_SUCCESS);
    }

    #[tokio::test]
    async fn test_nonexistent_input_is_fatal() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.heic");
        let out = dir.path().join("out");
        let options = ConversionOptions::default().with_output_directory(&out);

        let err = assert_err!(runner().run(&missing, &options).await);
        assert!(matches!(err, ConvertError::NotFound(_)));
        assert!(err.is_fatal());
        assert_eq!(err.exit_code(), EXIT_FAILURE);
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_failure_isolation() {
        let dir = TempDir::new().unwrap();
        let names = ["f0.heic", "f1.heic", "f2.heic", "f3.heic", "f4.heic"];
        let failing = "f2.heic";
        for name in names {
            let content: &[u8] = if name == failing { CORRUPT_MARKER } else { b"heic" };
            write(&dir.path().join(name), content);
        }

        let codec = Arc::new(MockCodec::default());
        let runner = BatchRunner::new(codec.clone());
        let options = ConversionOptions::default().with_workers(2).unwrap();
        let summary = assert_ok!(runner.run(dir.path(), &options).await);

        assert_eq!(summary.total(), names.len());
        assert_eq!(summary.success_count(), names.len() - 1);
        assert_eq!(summary.failure_count(), 1);
        assert_eq!(summary.exit_code(), EXIT_FAILURE);
        assert_eq!(codec.decode_calls.load(Ordering::SeqCst), names.len());

        for result in summary.results() {
            let name = result.source().file_name().unwrap().to_string_lossy().into_owned();
            let stem = name.trim_end_matches(".heic");
            assert_eq!(
                result.destination().file_name().unwrap().to_string_lossy(),
                format!("{}.webp", stem)
            );
            if name == failing {
                assert!(matches!(result.failure_reason(), Some(ConvertError::Decode(_))));
                assert!(!dir.path().join("f2.webp").exists());
            } else {
                assert!(result.is_success(), "{} should have converted", name);
            }
        }

        let sources: BTreeSet<_> = summary
            .results()
            .iter()
            .map(|r| r.source().file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(sources.len(), names.len());
    }

    #[tokio::test]
    async fn test_results_follow_discovery_order() {
        let dir = TempDir::new().unwrap();
        for name in ["c.heic", "a.heic", "b.heic", "d.heic"] {
            write(&dir.path().join(name), b"heic");
        }

        let options = ConversionOptions::default().with_workers(4).unwrap();
        let summary = assert_ok!(runner().run(dir.path(), &options).await);
        let discovered = FileManager::discover(dir.path(), false).unwrap();

        let ordered: Vec<&Path> = summary.results().iter().map(|r| r.source()).collect();
        let expected: Vec<&Path> = discovered.iter().map(|f| f.path()).collect();
        assert_eq!(ordered, expected);
    }

    #[tokio::test]
    async fn test_recursive_flag() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("top.heic"), b"heic");
        write(&dir.path().join("sub/inner.heic"), b"heic");

        let flat = assert_ok!(runner().run(dir.path(), &ConversionOptions::default()).await);
        assert_eq!(flat.total(), 1);
        assert!(!dir.path().join("sub/inner.webp").exists());

        let options = ConversionOptions::default().with_recursive(true);
        let deep = assert_ok!(runner().run(dir.path(), &options).await);
        assert_eq!(deep.total(), 2);
        assert!(dir.path().join("sub/inner.webp").is_file());
    }

    #[tokio::test]
    async fn test_reconversion_overwrites_same_destination() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.heic");
        write(&source, b"heic");

        let first = assert_ok!(runner().run(&source, &ConversionOptions::default()).await);
        let destination = first.results()[0].destination().to_path_buf();
        fs::write(&destination, b"edited by hand").unwrap();

        let second = assert_ok!(runner().run(&source, &ConversionOptions::default()).await);
        assert_eq!(second.results()[0].destination(), destination.as_path());
        assert!(second.results()[0].is_success());
        assert_eq!(fs::read(&destination).unwrap(), MockCodec::OUTPUT);
    }

    #[tokio::test]
    async fn test_output_directory_created_recursively() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("a.heic"), b"heic");
        let out = dir.path().join("deep/nested/out");

        let options = ConversionOptions::default().with_output_directory(&out);
        let summary = assert_ok!(runner().run(dir.path(), &options).await);

        assert_eq!(summary.success_count(), 1);
        assert!(out.join("a.webp").is_file());
    }

    #[tokio::test]
    async fn test_output_directory_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("a.heic"), b"heic");
        let blocker = dir.path().join("blocker");
        write(&blocker, b"i am a file");

        let options = ConversionOptions::default().with_output_directory(&blocker);
        let err = assert_err!(runner().run(dir.path(), &options).await);

        assert!(matches!(err, ConvertError::OutputDirectory { .. }));
        assert!(!dir.path().join("a.webp").exists());
    }

    #[tokio::test]
    async fn test_explicit_non_heic_file_is_attempted() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("picture.jpg");
        write(&source, CORRUPT_MARKER);

        let summary = assert_ok!(runner().run(&source, &ConversionOptions::default()).await);
        assert_eq!(summary.total(), 1);
        assert_eq!(summary.failure_count(), 1);
        assert!(matches!(
            summary.results()[0].failure_reason(),
            Some(ConvertError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_every_file_fails_on_encode() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("a.heic"), b"heic");
        write(&dir.path().join("b.heic"), b"heic");

        let runner = BatchRunner::new(Arc::new(MockCodec::failing_encode()));
        let summary = assert_ok!(runner.run(dir.path(), &ConversionOptions::default()).await);

        assert_eq!(summary.total(), 2);
        assert_eq!(summary.failure_count(), 2);
        assert!(summary
            .failures()
            .all(|r| matches!(r.failure_reason(), Some(ConvertError::Encode(_)))));
    }

    #[tokio::test]
    async fn test_colliding_destinations_still_convert() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("a.heic"), b"heic");
        write(&dir.path().join("sub/a.heic"), b"heic");
        let out = dir.path().join("out");

        let options = ConversionOptions::default()
            .with_recursive(true)
            .with_output_directory(&out);
        let summary = assert_ok!(runner().run(dir.path(), &options).await);

        assert_eq!(summary.success_count(), 2);
        assert!(out.join("a.webp").is_file());
    }
}
