//! # External Tool Codec
//!
//! Implementazione di `CodecAdapter` che delega a tool esterni:
//!
//! | Operazione | Tool                              | Interscambio |
//! |------------|-----------------------------------|--------------|
//! | decode     | `heif-dec` (fallback `heif-convert`) | PNG temporaneo letto con `image` |
//! | encode     | `cwebp -q <quality> -m 4 -mt`     | PNG temporaneo scritto con `image` |
//!
//! I file temporanei vivono in una `TempDir` rimossa alla fine di ogni chiamata.
//! Nessun retry: se il tool fallisce, l'errore (con lo stderr del tool) è terminale
//! per quel file.

use super::{CodecAdapter, DecodedImage};
use crate::args;
use crate::error::ConvertError;
use crate::tool_resolver::ToolPathResolver;
use async_trait::async_trait;
use image::{ColorType, ImageFormat};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, warn};

/// HEIF decoders in order of preference (libheif >= 1.17 ships `heif-dec`)
pub const DECODER_TOOLS: &[&str] = &["heif-dec", "heif-convert"];

/// WebP encoder (libwebp)
pub const ENCODER_TOOLS: &[&str] = &["cwebp"];

/// Codec backed by the libheif and libwebp command line tools
#[derive(Debug, Clone, Default)]
pub struct ExternalToolCodec {
    resolver: ToolPathResolver,
}

impl ExternalToolCodec {
    pub fn new() -> Self {
        Self {
            resolver: ToolPathResolver::new(),
        }
    }

    pub fn with_resolver(resolver: ToolPathResolver) -> Self {
        Self { resolver }
    }

    fn scratch_dir() -> std::io::Result<TempDir> {
        tempfile::Builder::new().prefix("heic2webp-").tempdir()
    }

    /// Runs a tool to completion, returning its stderr as the error message on failure
    async fn run_tool(tool_path: &Path, args: &[OsString]) -> Result<(), String> {
        debug!("Running {:?} {:?}", tool_path, args);
        let start_time = Instant::now();

        let output = Command::new(tool_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| format!("Failed to start {}: {}", tool_path.display(), e))?;

        debug!("{} finished in {:?}", tool_path.display(), start_time.elapsed());

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("{} failed ({}): {}", tool_path.display(), output.status, stderr.trim());
            Err(format!(
                "{} exited with {}: {}",
                tool_path.display(),
                output.status,
                stderr.trim()
            ))
        }
    }

    async fn decode_with_tool(&self, source: &Path) -> Result<DecodedImage, String> {
        let metadata = tokio::fs::metadata(source)
            .await
            .map_err(|e| format!("Cannot read {}: {}", source.display(), e))?;
        if !metadata.is_file() {
            return Err(format!("Not a regular file: {}", source.display()));
        }

        let tool = self.resolver.check_tool_with_instructions(DECODER_TOOLS)?;
        let scratch = Self::scratch_dir().map_err(|e| format!("Cannot create temp dir: {}", e))?;
        let png_path = scratch.path().join("decoded.png");

        Self::run_tool(
            &tool,
            &args![source, &png_path],
        )
        .await?;

        let png = tokio::fs::read(&png_path)
            .await
            .map_err(|e| format!("Decoder produced no image for {}: {}", source.display(), e))?;

        let rgb = tokio::task::spawn_blocking(move || {
            image::load_from_memory_with_format(&png, ImageFormat::Png).map(|img| img.to_rgb8())
        })
        .await
        .map_err(|e| format!("Decode task failed: {}", e))?
        .map_err(|e| format!("Invalid decoder output for {}: {}", source.display(), e))?;

        let (width, height) = rgb.dimensions();
        Ok(DecodedImage {
            pixels: rgb.into_raw(),
            width,
            height,
        })
    }

    async fn encode_with_tool(&self, image: &DecodedImage, quality: u8) -> Result<Vec<u8>, String> {
        if !image.is_consistent() {
            return Err(format!(
                "Pixel buffer of {} bytes does not match {}x{} RGB",
                image.pixels.len(),
                image.width,
                image.height
            ));
        }

        let tool = self.resolver.check_tool_with_instructions(ENCODER_TOOLS)?;
        let scratch = Self::scratch_dir().map_err(|e| format!("Cannot create temp dir: {}", e))?;
        let png_path: PathBuf = scratch.path().join("pixels.png");
        let webp_path: PathBuf = scratch.path().join("encoded.webp");

        let (pixels, width, height) = (image.pixels.clone(), image.width, image.height);
        let png_target = png_path.clone();
        tokio::task::spawn_blocking(move || {
            image::save_buffer_with_format(
                &png_target,
                &pixels,
                width,
                height,
                ColorType::Rgb8,
                ImageFormat::Png,
            )
        })
        .await
        .map_err(|e| format!("Encode task failed: {}", e))?
        .map_err(|e| format!("Cannot stage pixels for encoder: {}", e))?;

        Self::run_tool(
            &tool,
            &args![
                "-q",
                quality.to_string(),
                "-m",
                "4",
                "-mt",
                &png_path,
                "-o",
                &webp_path,
            ],
        )
        .await?;

        let bytes = tokio::fs::read(&webp_path)
            .await
            .map_err(|e| format!("Encoder produced no file: {}", e))?;
        if bytes.is_empty() {
            return Err("Encoder produced no output".to_string());
        }
        Ok(bytes)
    }
}

#[async_trait]
impl CodecAdapter for ExternalToolCodec {
    fn name(&self) -> &str {
        "libheif+libwebp (external tools)"
    }

    async fn decode(&self, source: &Path) -> Result<DecodedImage, ConvertError> {
        self.decode_with_tool(source).await.map_err(ConvertError::Decode)
    }

    async fn encode(&self, image: &DecodedImage, quality: u8) -> Result<Vec<u8>, ConvertError> {
        self.encode_with_tool(image, quality)
            .await
            .map_err(ConvertError::Encode)
    }

    async fn validate(&self) -> Result<(), ConvertError> {
        let missing: Vec<String> = [DECODER_TOOLS, ENCODER_TOOLS]
            .iter()
            .filter_map(|tools| self.resolver.check_tool_with_instructions(tools).err())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConvertError::MissingTool(missing.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec_without_tools() -> (ExternalToolCodec, TempDir) {
        // Empty bundled dir; system PATH is still consulted, so tests below never
        // depend on tools being absent.
        let dir = TempDir::new().unwrap();
        (
            ExternalToolCodec::with_resolver(ToolPathResolver::with_tools_dir(dir.path())),
            dir,
        )
    }

    #[tokio::test]
    async fn test_decode_missing_source_is_decode_error() {
        let (codec, dir) = codec_without_tools();
        let result = codec.decode(&dir.path().join("missing.heic")).await;
        match result {
            Err(ConvertError::Decode(msg)) => assert!(msg.contains("missing.heic")),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_decode_directory_is_decode_error() {
        let (codec, dir) = codec_without_tools();
        let result = codec.decode(dir.path()).await;
        assert!(matches!(result, Err(ConvertError::Decode(_))));
    }

    #[tokio::test]
    async fn test_encode_rejects_inconsistent_buffer() {
        let (codec, _dir) = codec_without_tools();
        let image = DecodedImage {
            pixels: vec![0; 5],
            width: 2,
            height: 2,
        };
        match codec.encode(&image, 85).await {
            Err(ConvertError::Encode(msg)) => assert!(msg.contains("does not match")),
            other => panic!("expected encode error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_decode_non_utf8_file_name() {
        use crate::file_manager::FileManager;
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;
        use std::os::unix::fs::PermissionsExt;

        // Stand-in decoder: copies a prepared 2x2 PNG to its second argument
        let tools = TempDir::new().unwrap();
        let fixture = tools.path().join("fixture.png");
        image::save_buffer_with_format(
            &fixture,
            &[200u8; 12],
            2,
            2,
            ColorType::Rgb8,
            ImageFormat::Png,
        )
        .unwrap();
        let decoder = tools.path().join("heif-dec");
        std::fs::write(
            &decoder,
            format!("#!/bin/sh\ncp '{}' \"$2\"\n", fixture.display()),
        )
        .unwrap();
        std::fs::set_permissions(&decoder, std::fs::Permissions::from_mode(0o755)).unwrap();

        let photos = TempDir::new().unwrap();
        let source = photos.path().join(OsStr::from_bytes(b"caf\xE9.heic"));
        std::fs::write(&source, b"heic").unwrap();
        assert!(FileManager::is_source_file(&source));

        let codec =
            ExternalToolCodec::with_resolver(ToolPathResolver::with_tools_dir(tools.path()));
        let image = codec.decode(&source).await.unwrap();
        assert_eq!((image.width, image.height), (2, 2));
        assert!(image.is_consistent());
    }
}
