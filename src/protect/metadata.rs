//! Metadata tag embedding via container-level byte surgery.
//!
//! The tag is spliced into the container without decoding any pixel data:
//! a COM segment directly after SOI for JPEG, a tEXt chunk directly after
//! IHDR for PNG. Both placements are valid per the respective formats and
//! survive naive re-saves by common viewers.

use bytes::Bytes;

use crate::error::ProtectError;

use super::forensic::ForensicIdentity;

/// Producer string embedded in every delivered image.
pub const SOFTWARE_TAG: &str = "gallery-vault";

/// Rights notice embedded in every delivered image.
pub const COPYRIGHT_TAG: &str = "Protected content. Redistribution prohibited.";

// ============================================================================
// JPEG markers
// ============================================================================

/// Start of image
const SOI: [u8; 2] = [0xFF, 0xD8];

/// Comment segment
const COM: u8 = 0xFE;

// ============================================================================
// PNG layout
// ============================================================================

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// tEXt keyword under which the tag is stored.
const PNG_KEYWORD: &[u8] = b"Comment";

/// Container formats the pipeline delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl ImageKind {
    /// Identify the container from its magic bytes.
    pub fn sniff(data: &[u8]) -> Result<Self, ProtectError> {
        if data.len() >= 3 && data[0] == 0xFF && data[1] == 0xD8 && data[2] == 0xFF {
            return Ok(ImageKind::Jpeg);
        }
        if data.len() >= 8 && data[..8] == PNG_SIGNATURE {
            return Ok(ImageKind::Png);
        }
        Err(ProtectError::UnsupportedFormat {
            reason: "image is neither JPEG nor PNG".to_string(),
        })
    }

    /// File extension used for archive entry names.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
        }
    }

    pub fn format(&self) -> image::ImageFormat {
        match self {
            ImageKind::Jpeg => image::ImageFormat::Jpeg,
            ImageKind::Png => image::ImageFormat::Png,
        }
    }
}

/// Human-readable tag text carrying the forensic token.
pub fn tag_payload(identity: &ForensicIdentity) -> String {
    format!("{} | {} | fid:{}", SOFTWARE_TAG, COPYRIGHT_TAG, identity)
}

/// Splice the tag into `source` and return the tagged bytes.
///
/// Pure container surgery; pixel data passes through untouched.
pub fn embed_tag(
    source: &[u8],
    kind: ImageKind,
    identity: &ForensicIdentity,
) -> Result<Bytes, ProtectError> {
    let payload = tag_payload(identity);
    match kind {
        ImageKind::Jpeg => embed_jpeg_comment(source, payload.as_bytes()),
        ImageKind::Png => embed_png_text(source, payload.as_bytes()),
    }
}

/// Insert a COM segment immediately after SOI.
fn embed_jpeg_comment(source: &[u8], payload: &[u8]) -> Result<Bytes, ProtectError> {
    if source.len() < 2 || source[..2] != SOI {
        return Err(ProtectError::Malformed {
            message: "JPEG stream does not start with SOI".to_string(),
        });
    }
    // Segment length field covers itself plus the payload.
    if payload.len() > u16::MAX as usize - 2 {
        return Err(ProtectError::Malformed {
            message: "comment payload exceeds segment capacity".to_string(),
        });
    }
    let seg_len = (payload.len() + 2) as u16;

    let mut out = Vec::with_capacity(source.len() + payload.len() + 4);
    out.extend_from_slice(&SOI);
    out.push(0xFF);
    out.push(COM);
    out.extend_from_slice(&seg_len.to_be_bytes());
    out.extend_from_slice(payload);
    out.extend_from_slice(&source[2..]);
    Ok(Bytes::from(out))
}

/// Insert a tEXt chunk immediately after IHDR.
fn embed_png_text(source: &[u8], payload: &[u8]) -> Result<Bytes, ProtectError> {
    if source.len() < 16 || source[..8] != PNG_SIGNATURE {
        return Err(ProtectError::Malformed {
            message: "PNG stream does not start with signature".to_string(),
        });
    }
    let ihdr_len = u32::from_be_bytes([source[8], source[9], source[10], source[11]]) as usize;
    if &source[12..16] != b"IHDR" {
        return Err(ProtectError::Malformed {
            message: "first PNG chunk is not IHDR".to_string(),
        });
    }
    // signature + length/type fields + IHDR data + CRC
    let insert_at = 8 + 8 + ihdr_len + 4;
    if source.len() < insert_at {
        return Err(ProtectError::Malformed {
            message: "PNG stream truncated inside IHDR".to_string(),
        });
    }

    // tEXt data: keyword, NUL separator, Latin-1 text.
    let mut chunk_data = Vec::with_capacity(PNG_KEYWORD.len() + 1 + payload.len());
    chunk_data.extend_from_slice(PNG_KEYWORD);
    chunk_data.push(0);
    chunk_data.extend_from_slice(payload);

    let mut crc = flate2::Crc::new();
    crc.update(b"tEXt");
    crc.update(&chunk_data);

    let mut out = Vec::with_capacity(source.len() + chunk_data.len() + 12);
    out.extend_from_slice(&source[..insert_at]);
    out.extend_from_slice(&(chunk_data.len() as u32).to_be_bytes());
    out.extend_from_slice(b"tEXt");
    out.extend_from_slice(&chunk_data);
    out.extend_from_slice(&crc.sum().to_be_bytes());
    out.extend_from_slice(&source[insert_at..]);
    Ok(Bytes::from(out))
}
