//! Error types for jocus-storage.

/// Result type alias using our error type.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur while publishing to the object store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Service account credentials could not be loaded or parsed.
    #[error("invalid storage credentials: {0}")]
    Credentials(String),

    /// Signed URL generation failed.
    #[error("failed to sign storage URL: {0}")]
    Signing(String),

    /// The HTTP request could not be completed.
    #[error("storage transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("storage request failed with status {status}: {message}")]
    Status { status: u16, message: String },
}
