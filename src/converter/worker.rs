//! # Conversion Worker Module
//!
//! Worker per la conversione di un singolo file: decode → encode → write.
//! Ogni passo può fallire; il fallimento diventa un `ConversionResult` di
//! tipo `Failure` e il worker non propaga mai errori al chiamante.

use crate::{
    codec::CodecAdapter,
    config::ConversionOptions,
    converter::types::ConversionResult,
    error::ConvertError,
};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

struct Converted {
    input_bytes: u64,
    output_bytes: u64,
    width: u32,
    height: u32,
}

/// Worker per la conversione di singoli file
#[derive(Clone)]
pub struct ConversionWorker {
    codec: Arc<dyn CodecAdapter>,
}

impl ConversionWorker {
    pub fn new(codec: Arc<dyn CodecAdapter>) -> Self {
        Self { codec }
    }

    /// Converte `source` in `destination`. Restituisce sempre un risultato.
    pub async fn convert(
        &self,
        source: &Path,
        destination: &Path,
        options: &ConversionOptions,
    ) -> ConversionResult {
        match self.try_convert(source, destination, options).await {
            Ok(done) => ConversionResult::success(
                source.to_path_buf(),
                destination.to_path_buf(),
                done.input_bytes,
                done.output_bytes,
                done.width,
                done.height,
            ),
            Err(reason) => {
                debug!("Conversion of {} failed: {}", source.display(), reason);
                ConversionResult::failure(source.to_path_buf(), destination.to_path_buf(), reason)
            }
        }
    }

    async fn try_convert(
        &self,
        source: &Path,
        destination: &Path,
        options: &ConversionOptions,
    ) -> Result<Converted, ConvertError> {
        debug!("📸 Decoding: {}", source.display());

        let input_bytes = tokio::fs::metadata(source)
            .await
            .map_err(|e| ConvertError::Decode(format!("Cannot read {}: {}", source.display(), e)))?
            .len();

        let image = self.codec.decode(source).await.map_err(|e| match e {
            ConvertError::Decode(_) => e,
            other => ConvertError::Decode(other.to_string()),
        })?;

        debug!("   Dimensions: {}x{}", image.width, image.height);
        debug!("💾 Encoding WebP: {}", destination.display());

        let encoded = self
            .codec
            .encode(&image, options.quality())
            .await
            .map_err(|e| match e {
                ConvertError::Encode(_) => e,
                other => ConvertError::Encode(other.to_string()),
            })?;

        if encoded.is_empty() {
            return Err(ConvertError::Encode("Encoder produced no output".to_string()));
        }

        let output_bytes = encoded.len() as u64;
        Self::write_output(destination, encoded).await?;

        Ok(Converted {
            input_bytes,
            output_bytes,
            width: image.width,
            height: image.height,
        })
    }

    /// Scrive i byte in un file temporaneo nella directory di destinazione e lo
    /// rinomina atomicamente. In caso di errore il temporaneo viene rimosso.
    async fn write_output(destination: &Path, bytes: Vec<u8>) -> Result<(), ConvertError> {
        let target = destination.to_path_buf();
        tokio::task::spawn_blocking(move || Self::persist_output(&target, &bytes))
            .await
            .map_err(|e| ConvertError::Write(format!("Write task failed: {}", e)))?
    }

    fn persist_output(destination: &Path, bytes: &[u8]) -> Result<(), ConvertError> {
        let parent = match destination.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let mut part = tempfile::Builder::new()
            .prefix(".heic2webp-")
            .suffix(".part")
            .tempfile_in(parent)
            .map_err(|e| write_error(destination, e))?;

        part.write_all(bytes)
            .map_err(|e| write_error(destination, e))?;

        // NamedTempFile is created 0600
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            part.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o644))
                .map_err(|e| write_error(destination, e))?;
        }

        part.persist(destination)
            .map_err(|e| write_error(destination, e.error))?;

        Ok(())
    }
}

fn write_error(destination: &Path, e: std::io::Error) -> ConvertError {
    ConvertError::Write(format!("Cannot write {}: {}", destination.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::test_support::{MockCodec, CORRUPT_MARKER};
    use crate::converter::types::Outcome;
    use std::fs;
    use tempfile::TempDir;

    fn worker(codec: MockCodec) -> ConversionWorker {
        ConversionWorker::new(Arc::new(codec))
    }

    fn leftovers(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".part"))
            .collect()
    }

    #[tokio::test]
    async fn test_successful_conversion() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.heic");
        fs::write(&source, vec![7u8; 100]).unwrap();
        let destination = dir.path().join("a.webp");

        let result = worker(MockCodec::default())
            .convert(&source, &destination, &ConversionOptions::default())
            .await;

        match result.outcome() {
            Outcome::Success {
                input_bytes,
                output_bytes,
                width,
                height,
            } => {
                assert_eq!(*input_bytes, 100);
                assert_eq!(*output_bytes, MockCodec::OUTPUT.len() as u64);
                assert_eq!((*width, *height), (2, 2));
            }
            other => panic!("expected success, got {:?}", other),
        }
        assert_eq!(fs::read(&destination).unwrap(), MockCodec::OUTPUT);
        assert_eq!(result.source(), source.as_path());
        assert!(leftovers(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_decode_failure_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("bad.heic");
        fs::write(&source, CORRUPT_MARKER).unwrap();
        let destination = dir.path().join("bad.webp");

        let result = worker(MockCodec::default())
            .convert(&source, &destination, &ConversionOptions::default())
            .await;

        assert!(matches!(result.failure_reason(), Some(ConvertError::Decode(_))));
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn test_missing_source_is_decode_failure() {
        let dir = TempDir::new().unwrap();
        let result = worker(MockCodec::default())
            .convert(
                &dir.path().join("gone.heic"),
                &dir.path().join("gone.webp"),
                &ConversionOptions::default(),
            )
            .await;
        assert!(matches!(result.failure_reason(), Some(ConvertError::Decode(_))));
    }

    #[tokio::test]
    async fn test_encode_failures() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.heic");
        fs::write(&source, b"heic").unwrap();
        let destination = dir.path().join("a.webp");

        for codec in [MockCodec::failing_encode(), MockCodec::empty_encode()] {
            let result = worker(codec)
                .convert(&source, &destination, &ConversionOptions::default())
                .await;
            assert!(matches!(result.failure_reason(), Some(ConvertError::Encode(_))));
            assert!(!destination.exists());
        }
    }

    #[tokio::test]
    async fn test_write_failure_leaves_no_partial_file() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.heic");
        fs::write(&source, b"heic").unwrap();
        let destination = dir.path().join("missing-dir").join("a.webp");

        let result = worker(MockCodec::default())
            .convert(&source, &destination, &ConversionOptions::default())
            .await;

        match result.failure_reason() {
            Some(ConvertError::Write(msg)) => assert!(msg.contains("a.webp")),
            other => panic!("expected write error, got {:?}", other),
        }
        assert!(!destination.exists());
        assert!(leftovers(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_rename_onto_directory_cleans_up() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.heic");
        fs::write(&source, b"heic").unwrap();
        let destination = dir.path().join("a.webp");
        fs::create_dir(&destination).unwrap();
        fs::write(destination.join("keep"), b"x").unwrap();

        let result = worker(MockCodec::default())
            .convert(&source, &destination, &ConversionOptions::default())
            .await;

        assert!(matches!(result.failure_reason(), Some(ConvertError::Write(_))));
        assert!(destination.is_dir());
        assert!(leftovers(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_existing_destination_is_overwritten() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.heic");
        fs::write(&source, b"heic").unwrap();
        let destination = dir.path().join("a.webp");
        fs::write(&destination, b"stale output that is longer than the new one").unwrap();

        let result = worker(MockCodec::default())
            .convert(&source, &destination, &ConversionOptions::default())
            .await;

        assert!(result.is_success());
        assert_eq!(fs::read(&destination).unwrap(), MockCodec::OUTPUT);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_output_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.heic");
        fs::write(&source, b"heic").unwrap();
        let destination = dir.path().join("a.webp");

        let result = worker(MockCodec::default())
            .convert(&source, &destination, &ConversionOptions::default())
            .await;

        assert!(result.is_success());
        let mode = fs::metadata(&destination).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
        assert!(leftovers(dir.path()).is_empty());
    }
}
