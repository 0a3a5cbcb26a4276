//! Protection transforms for delivered images.
//!
//! Every image that leaves the server carries a per-download forensic token
//! in its metadata; untrusted callers additionally get a visible watermark
//! composited over the pixels. The transform is a pure function of the
//! caller's trust tier:
//!
//! ```text
//! ┌─────────────┐     Untrusted      ┌────────────────────────────────┐
//! │  TrustTier  │ ─────────────────▶ │ Full: watermark + re-encode    │
//! │             │                    │       + metadata tag           │
//! │             │  Trusted/Operator  ├────────────────────────────────┤
//! │             │ ─────────────────▶ │ Light: metadata tag only       │
//! └─────────────┘                    └────────────────────────────────┘
//! ```
//!
//! Light protection deliberately skips decode and re-encode; the pixel work
//! dominates per-image cost, and trusted callers have earned the cheaper
//! path. A failed Full transform never falls back to Light or raw bytes;
//! the task is skipped instead.

mod forensic;
mod metadata;
mod transform;
mod watermark;

pub use forensic::{request_stamp, ForensicIdentity};
pub use metadata::{embed_tag, tag_payload, ImageKind, COPYRIGHT_TAG, SOFTWARE_TAG};
pub use transform::{ProtectionMode, Protector, DEFAULT_REENCODE_QUALITY};
pub use watermark::composite_identity_mark;
