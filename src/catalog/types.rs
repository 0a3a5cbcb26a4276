use serde::{Deserialize, Serialize};

/// Caller trust classification, ordered from least to most trusted.
///
/// Only the Untrusted/Trusted boundary changes behavior (it selects the
/// protection mode); the finer gradations are carried through unchanged for
/// audit metadata and event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrustTier {
    Untrusted,
    TrustedLow,
    TrustedMid,
    TrustedHigh,
    TrustedMax,
    Operator,
}

impl TrustTier {
    /// Whether this tier sits above the Untrusted boundary.
    pub fn is_trusted(&self) -> bool {
        *self > TrustTier::Untrusted
    }

    /// Short stable name used in query params, logs and embedded metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustTier::Untrusted => "untrusted",
            TrustTier::TrustedLow => "trusted-low",
            TrustTier::TrustedMid => "trusted-mid",
            TrustTier::TrustedHigh => "trusted-high",
            TrustTier::TrustedMax => "trusted-max",
            TrustTier::Operator => "operator",
        }
    }

    /// Parse the short name back into a tier.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "untrusted" => Some(TrustTier::Untrusted),
            "trusted-low" => Some(TrustTier::TrustedLow),
            "trusted-mid" => Some(TrustTier::TrustedMid),
            "trusted-high" => Some(TrustTier::TrustedHigh),
            "trusted-max" => Some(TrustTier::TrustedMax),
            "operator" => Some(TrustTier::Operator),
            _ => None,
        }
    }
}

impl std::fmt::Display for TrustTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One image in a set, as resolved by the catalog.
///
/// Immutable once the set is resolved. `order_index` is unique within a set
/// and drives the archive entry name; `primary_key` points at a pre-protected
/// variant in blob storage when one exists, `fallback_key` at the original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    /// Image identifier, unique within the set
    pub id: String,

    /// Position of the image within the set (non-negative, unique per set)
    pub order_index: u32,

    /// Storage key of the pre-protected variant, if one was generated
    #[serde(default)]
    pub primary_key: Option<String>,

    /// Storage key of the original image
    pub fallback_key: String,
}

/// A resolved gallery set: title plus the ordered image list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GallerySet {
    /// Set identifier
    pub id: String,

    /// Human-readable title; used to derive the archive filename
    pub title: String,

    /// Images sorted by `order_index`
    pub images: Vec<ImageDescriptor>,
}

impl GallerySet {
    /// Derive the attachment filename stem from the title.
    ///
    /// Every non-alphanumeric character is replaced so the result is safe in
    /// a `Content-Disposition` header without quoting games.
    pub fn filename_slug(&self) -> String {
        let slug: String = self
            .title
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        if slug.is_empty() {
            self.id
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .collect()
        } else {
            slug
        }
    }
}
