use thiserror::Error;

/// I/O errors that can occur when reading from remote storage
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Error from S3 or S3-compatible storage
    #[error("S3 error: {0}")]
    S3(String),

    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Object not found
    #[error("Object not found: {0}")]
    NotFound(String),
}

/// Errors raised while resolving a gallery set and its image list
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// I/O error while reading the manifest
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// The set does not exist (manifest missing; should map to HTTP 404)
    #[error("Set not found: {set_id}")]
    SetNotFound { set_id: String },

    /// The manifest exists but could not be parsed
    #[error("Invalid manifest for set {set_id}: {message}")]
    InvalidManifest { set_id: String, message: String },
}

/// Errors from the protection transform.
///
/// Any of these converts the owning pipeline task to a Skip; a failed Full
/// protection must never degrade to delivering weaker-protected bytes.
#[derive(Debug, Clone, Error)]
pub enum ProtectError {
    /// Source bytes are not a supported image format
    #[error("Unsupported image format: {reason}")]
    UnsupportedFormat { reason: String },

    /// Failed to decode the source image for compositing
    #[error("Failed to decode image: {message}")]
    Decode { message: String },

    /// Failed to re-encode the protected image
    #[error("Failed to encode image: {message}")]
    Encode { message: String },

    /// Source bytes are structurally broken (truncated markers/chunks)
    #[error("Malformed image stream: {message}")]
    Malformed { message: String },
}

/// Errors from the streaming archive sink.
///
/// These are fatal to the download: once streaming has started they can only
/// surface as an aborted transport stream.
#[derive(Debug, Clone, Error)]
pub enum ArchiveError {
    /// The zip writer failed (header, deflate or central directory write)
    #[error("Archive write error: {0}")]
    Zip(String),

    /// The consumer of the archive stream went away (client disconnect)
    #[error("Archive stream closed by consumer")]
    StreamClosed,
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(err: zip::result::ZipError) -> Self {
        ArchiveError::Zip(err.to_string())
    }
}

impl From<std::io::Error> for ArchiveError {
    fn from(err: std::io::Error) -> Self {
        ArchiveError::Zip(err.to_string())
    }
}

/// Errors surfaced to the HTTP layer before streaming begins
#[derive(Debug, Clone, Error)]
pub enum DownloadError {
    /// Set resolution failed (404/500 depending on variant)
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Storage failure before the first byte was streamed
    #[error("I/O error: {0}")]
    Io(#[from] IoError),
}
