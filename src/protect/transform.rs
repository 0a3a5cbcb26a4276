use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::ImageEncoder;
use tracing::debug;

use crate::catalog::TrustTier;
use crate::error::ProtectError;

use super::forensic::ForensicIdentity;
use super::metadata::{self, ImageKind};
use super::watermark::composite_identity_mark;

/// JPEG quality used when a watermarked image is re-encoded.
pub const DEFAULT_REENCODE_QUALITY: u8 = 90;

/// How much work the protection transform performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectionMode {
    /// Decode, composite the visible watermark, re-encode, tag.
    Full,
    /// Tag the container without touching pixel data.
    Light,
}

impl ProtectionMode {
    /// Select the mode for a caller's trust tier.
    ///
    /// Only the Untrusted boundary matters; every trusted gradation and the
    /// operator tier get the light path.
    pub fn for_tier(tier: TrustTier) -> Self {
        if tier.is_trusted() {
            ProtectionMode::Light
        } else {
            ProtectionMode::Full
        }
    }
}

/// Applies the protection transform to raw image bytes.
#[derive(Debug, Clone)]
pub struct Protector {
    jpeg_quality: u8,
}

impl Default for Protector {
    fn default() -> Self {
        Self::new()
    }
}

impl Protector {
    pub fn new() -> Self {
        Self {
            jpeg_quality: DEFAULT_REENCODE_QUALITY,
        }
    }

    pub fn with_quality(jpeg_quality: u8) -> Self {
        Self { jpeg_quality }
    }

    /// Transform one image for delivery.
    ///
    /// Returns the protected bytes plus the container kind (the caller needs
    /// the kind for the archive entry extension). Any failure here means the
    /// image must be skipped; there is no downgrade to a weaker mode.
    pub fn protect(
        &self,
        source: &[u8],
        mode: ProtectionMode,
        identity: &ForensicIdentity,
        requester_id: &str,
    ) -> Result<(Bytes, ImageKind), ProtectError> {
        let kind = ImageKind::sniff(source)?;

        let pixels_done = match mode {
            ProtectionMode::Light => Bytes::copy_from_slice(source),
            ProtectionMode::Full => self.watermark_and_encode(source, kind, requester_id)?,
        };

        let tagged = metadata::embed_tag(&pixels_done, kind, identity)?;
        debug!(
            mode = ?mode,
            kind = kind.extension(),
            bytes = tagged.len(),
            "Protected image"
        );
        Ok((tagged, kind))
    }

    fn watermark_and_encode(
        &self,
        source: &[u8],
        kind: ImageKind,
        requester_id: &str,
    ) -> Result<Bytes, ProtectError> {
        let decoded = image::load_from_memory_with_format(source, kind.format()).map_err(|e| {
            ProtectError::Decode {
                message: e.to_string(),
            }
        })?;

        let mut rgb = decoded.to_rgb8();
        composite_identity_mark(&mut rgb, requester_id);

        let mut out = Vec::new();
        match kind {
            ImageKind::Jpeg => {
                let mut encoder = JpegEncoder::new_with_quality(&mut out, self.jpeg_quality);
                encoder.encode_image(&rgb).map_err(|e| ProtectError::Encode {
                    message: e.to_string(),
                })?;
            }
            ImageKind::Png => {
                let encoder = PngEncoder::new(&mut out);
                encoder
                    .write_image(
                        rgb.as_raw(),
                        rgb.width(),
                        rgb.height(),
                        image::ExtendedColorType::Rgb8,
                    )
                    .map_err(|e| ProtectError::Encode {
                        message: e.to_string(),
                    })?;
            }
        }
        Ok(Bytes::from(out))
    }
}
