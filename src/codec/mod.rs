//! # Codec Module
//!
//! Confine verso i codec esterni. Il core conosce solo il trait `CodecAdapter`:
//! decodifica di un file sorgente in pixel RGB e codifica dei pixel in WebP.
//!
//! - `external`: implementazione basata su tool esterni (heif-dec, cwebp)

pub mod external;

pub use external::ExternalToolCodec;

use crate::error::ConvertError;
use async_trait::async_trait;
use std::path::Path;

/// Decoded image: interleaved 8-bit RGB pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl DecodedImage {
    pub const CHANNELS: usize = 3;

    /// Number of bytes an RGB buffer of these dimensions must hold
    pub fn expected_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * Self::CHANNELS
    }

    pub fn is_consistent(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.pixels.len() == Self::expected_len(self.width, self.height)
    }
}

/// A decoder/encoder pair the conversion core delegates pixel work to.
///
/// Both calls are single-shot: a failure is terminal for the file being converted.
#[async_trait]
pub trait CodecAdapter: Send + Sync {
    /// Returns the name of this codec implementation.
    fn name(&self) -> &str;

    /// Decodes a source file. Fails with `ConvertError::Decode`.
    async fn decode(&self, source: &Path) -> Result<DecodedImage, ConvertError>;

    /// Encodes pixels at the given quality (1-100). Fails with `ConvertError::Encode`,
    /// including when the encoder produces no bytes.
    async fn encode(&self, image: &DecodedImage, quality: u8) -> Result<Vec<u8>, ConvertError>;

    /// Checks that the codec is ready to be used.
    async fn validate(&self) -> Result<(), ConvertError> {
        Ok(())
    }
}
