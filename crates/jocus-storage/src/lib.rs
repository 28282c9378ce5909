//! # jocus-storage
//!
//! Object storage for published HLS artifacts.
//!
//! The packaging pipeline publishes through the [`ObjectStore`] trait;
//! [`GcsStore`] implements it against Google Cloud Storage using V4 signed
//! URLs, so no SDK or ambient credentials are involved. [`ArtifactKind`]
//! maps each artifact's file role to its content type and cache policy, and
//! [`retry`] bounds re-attempts around a fallible upload.

mod error;
mod gcs;
mod object;
mod retry;

pub use error::{Result, StorageError};
pub use gcs::{GcsConfig, GcsStore};
pub use object::ArtifactKind;
pub use retry::retry;

use async_trait::async_trait;
use bytes::Bytes;

/// Destination for published artifacts.
///
/// Implementations set content type and cache policy from the artifact's
/// [`ArtifactKind`] and make the object publicly readable. `public_url`
/// must be a deterministic function of the object path alone.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write one object. A returned error is retryable by the caller.
    async fn put(&self, object_path: &str, data: Bytes, kind: ArtifactKind) -> Result<()>;

    /// Public address of an object under this store.
    fn public_url(&self, object_path: &str) -> String;
}
