//! The stream packager: fetch, transcode, verify, publish.
//!
//! One call to [`StreamPackager::package`] turns a source video URL into a
//! published adaptive-bitrate HLS stream and returns the manifest's public
//! address. The run is all-or-nothing from the caller's perspective; a
//! failure after partial publish leaves whatever was already uploaded at
//! the destination prefix (re-running the same prefix overwrites it).

use crate::error::PackagingError;
use crate::fetch::Fetcher;
use bytes::Bytes;
use jocus_av::{Transcoder, Workspace, PLAYLIST_NAME, RENDITIONS};
use jocus_hls::{MasterPlaylist, VariantStream};
use jocus_storage::{retry, ArtifactKind, ObjectStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Upload attempts per artifact before the run fails.
pub const UPLOAD_ATTEMPTS: u32 = 3;

/// File name of the multivariant playlist.
pub const MANIFEST_NAME: &str = "master.m3u8";

const SOURCE_FILE: &str = "input.mp4";

/// An artifact staged for publishing.
struct PendingArtifact {
    local: PathBuf,
    object_path: String,
    kind: ArtifactKind,
}

/// Packages a source video into a published HLS stream.
///
/// All collaborators are passed in explicitly, so the pipeline runs against
/// fakes in tests and against ffmpeg + GCS in production.
pub struct StreamPackager {
    fetcher: Arc<dyn Fetcher>,
    transcoder: Arc<dyn Transcoder>,
    store: Arc<dyn ObjectStore>,
}

impl StreamPackager {
    /// Create a packager from its collaborators.
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        transcoder: Arc<dyn Transcoder>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            fetcher,
            transcoder,
            store,
        }
    }

    /// Package the media at `source_url` and publish it under
    /// `destination_prefix`, returning the manifest's public address.
    ///
    /// The prefix must be unique per source record; concurrent runs against
    /// the same prefix are unsupported. Scratch storage is removed on every
    /// exit path.
    pub async fn package(
        &self,
        source_url: &str,
        destination_prefix: &str,
    ) -> Result<String, PackagingError> {
        let prefix = destination_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            return Err(PackagingError::EmptyPrefix);
        }

        let workspace = Workspace::new()?;
        info!(source_url, prefix, "starting packaging run");

        // Fetch the source into scratch storage.
        let source = workspace.file(SOURCE_FILE);
        let byte_len = self.fetcher.fetch(source_url, &source).await?;
        info!(bytes = byte_len, "fetched source media");

        // Diagnostic probe; a silent source is only a hard failure once a
        // transcoded rendition verifies without audio.
        match self.transcoder.probe(&source).await {
            Ok(probe) => {
                if probe.has_audio() {
                    debug!(audio_tracks = probe.audio_tracks.len(), "probed source");
                } else {
                    warn!("source has no audio stream");
                }
            }
            Err(e) => warn!(error = %e, "source probe failed"),
        }

        // Transcode and verify each rendition, lowest quality first, and
        // stage its artifacts: segments before the playlist that references
        // them, so nothing publishable ever dangles.
        let mut uploads: Vec<PendingArtifact> = Vec::new();
        let mut master = MasterPlaylist::new();

        for spec in &RENDITIONS {
            let out_dir = workspace.subdir(Path::new("hls").join(spec.name))?;
            let output = self.transcoder.transcode(&source, &out_dir, spec).await?;

            let verified = self.transcoder.probe(&output.playlist).await?;
            if !verified.has_audio() {
                return Err(jocus_av::Error::MissingAudio {
                    path: output.playlist,
                }
                .into());
            }

            for segment in &output.segments {
                uploads.push(stage(prefix, Some(spec.name), segment));
            }
            uploads.push(stage(prefix, Some(spec.name), &output.playlist));

            master = master.add_variant(VariantStream {
                name: spec.name.to_string(),
                uri: format!("{}/{}", spec.name, PLAYLIST_NAME),
                bandwidth: spec.bandwidth(),
                width: spec.width,
                height: spec.height,
            });
        }

        // Synthesize the manifest and stage it strictly last.
        let manifest_path = workspace.subdir("hls")?.join(MANIFEST_NAME);
        std::fs::write(&manifest_path, master.render())?;
        uploads.push(stage(prefix, None, &manifest_path));

        // Publish in dependency order.
        let mut manifest_url = None;
        for artifact in &uploads {
            let data = Bytes::from(tokio::fs::read(&artifact.local).await?);
            debug!(object = %artifact.object_path, size = data.len(), "uploading artifact");

            retry(UPLOAD_ATTEMPTS, || {
                self.store.put(&artifact.object_path, data.clone(), artifact.kind)
            })
            .await
            .map_err(|source| PackagingError::Upload {
                object: artifact.object_path.clone(),
                attempts: UPLOAD_ATTEMPTS,
                source,
            })?;

            if artifact.kind == ArtifactKind::Manifest {
                manifest_url = Some(self.store.public_url(&artifact.object_path));
            }
        }

        let manifest_url = manifest_url.ok_or(PackagingError::Manifest)?;
        info!(manifest_url, "packaging run complete");
        Ok(manifest_url)
    }
}

fn stage(prefix: &str, rendition: Option<&str>, local: &Path) -> PendingArtifact {
    let file_name = local
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let object_path = match rendition {
        Some(rendition) => format!("{prefix}/{rendition}/{file_name}"),
        None => format!("{prefix}/{file_name}"),
    };

    PendingArtifact {
        local: local.to_path_buf(),
        object_path,
        kind: ArtifactKind::for_path(local),
    }
}
