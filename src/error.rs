//! Packaging error taxonomy.

use crate::fetch::FetchError;
use jocus_storage::StorageError;

/// Errors that abort a packaging run.
///
/// There is no partial-success mode: any of these means the whole run
/// failed, though already-uploaded artifacts stay behind at the
/// destination prefix.
#[derive(Debug, thiserror::Error)]
pub enum PackagingError {
    /// The source media could not be retrieved.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Transcoding failed, including a rendition that verified without audio.
    #[error(transparent)]
    Transcode(#[from] jocus_av::Error),

    /// An artifact upload kept failing after all retry attempts.
    #[error("upload failed for {object} after {attempts} attempts")]
    Upload {
        object: String,
        attempts: u32,
        #[source]
        source: StorageError,
    },

    /// The publish walk finished without producing a manifest address.
    #[error("no manifest address produced")]
    Manifest,

    /// The caller passed an empty destination prefix.
    #[error("destination prefix must not be empty")]
    EmptyPrefix,

    /// Scratch file I/O failed.
    #[error("scratch I/O error: {0}")]
    Io(#[from] std::io::Error),
}
