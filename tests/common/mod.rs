//! Shared test harness for packaging pipeline tests.
//!
//! Provides in-memory fakes for every collaborator of the packager: an
//! object store that records uploads in order (with scriptable failures per
//! object), a fetcher serving canned payloads or statuses, and a transcoder
//! that writes playlist + segment files without touching ffmpeg.

use async_trait::async_trait;
use bytes::Bytes;
use jocus::fetch::{FetchError, Fetcher};
use jocus_av::{
    AudioTrack, MediaInfo, RenditionOutput, RenditionSpec, Result as AvResult, Transcoder,
    VideoTrack, PLAYLIST_NAME,
};
use jocus_storage::{ArtifactKind, ObjectStore, Result as StorageResult, StorageError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One successful upload recorded by [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct UploadRecord {
    pub object_path: String,
    pub kind: ArtifactKind,
    pub data: Vec<u8>,
}

/// In-memory object store recording uploads in arrival order.
#[derive(Default)]
pub struct MemoryStore {
    bucket: String,
    uploads: Mutex<Vec<UploadRecord>>,
    attempts: Mutex<HashMap<String, u32>>,
    failures: Mutex<HashMap<String, u32>>,
}

impl MemoryStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            ..Default::default()
        }
    }

    /// Make the next `count` puts of `object_path` fail with a 503.
    pub fn fail_next(&self, object_path: &str, count: u32) {
        self.failures
            .lock()
            .unwrap()
            .insert(object_path.to_string(), count);
    }

    pub fn uploads(&self) -> Vec<UploadRecord> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn uploaded_paths(&self) -> Vec<String> {
        self.uploads()
            .into_iter()
            .map(|r| r.object_path)
            .collect()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    /// Total put calls for one object, failed attempts included.
    pub fn attempts_for(&self, object_path: &str) -> u32 {
        self.attempts
            .lock()
            .unwrap()
            .get(object_path)
            .copied()
            .unwrap_or(0)
    }

    /// Position of an object in the upload order.
    pub fn position_of(&self, object_path: &str) -> Option<usize> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .position(|r| r.object_path == object_path)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, object_path: &str, data: Bytes, kind: ArtifactKind) -> StorageResult<()> {
        *self
            .attempts
            .lock()
            .unwrap()
            .entry(object_path.to_string())
            .or_insert(0) += 1;

        let mut failures = self.failures.lock().unwrap();
        if let Some(remaining) = failures.get_mut(object_path) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(StorageError::Status {
                    status: 503,
                    message: "injected failure".to_string(),
                });
            }
        }
        drop(failures);

        self.uploads.lock().unwrap().push(UploadRecord {
            object_path: object_path.to_string(),
            kind,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn public_url(&self, object_path: &str) -> String {
        format!(
            "https://storage.googleapis.com/{}/{}",
            self.bucket, object_path
        )
    }
}

/// Fetcher serving a canned payload or a canned HTTP status.
pub struct FakeFetcher {
    payload: Option<Vec<u8>>,
    status: u16,
    /// Destination the packager asked for, kept for cleanup assertions.
    pub dest: Mutex<Option<PathBuf>>,
}

impl FakeFetcher {
    pub fn with_payload(payload: &[u8]) -> Self {
        Self {
            payload: Some(payload.to_vec()),
            status: 200,
            dest: Mutex::new(None),
        }
    }

    pub fn with_status(status: u16) -> Self {
        Self {
            payload: None,
            status,
            dest: Mutex::new(None),
        }
    }

    /// Scratch directory the source was (or would have been) written to.
    pub fn scratch_dir(&self) -> Option<PathBuf> {
        self.dest
            .lock()
            .unwrap()
            .as_ref()
            .and_then(|p| p.parent().map(Path::to_path_buf))
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        *self.dest.lock().unwrap() = Some(dest.to_path_buf());

        match &self.payload {
            Some(payload) if self.status == 200 => {
                tokio::fs::write(dest, payload)
                    .await
                    .map_err(|source| FetchError::Io {
                        path: dest.to_path_buf(),
                        source,
                    })?;
                Ok(payload.len() as u64)
            }
            _ => Err(FetchError::Status {
                url: url.to_string(),
                status: self.status,
            }),
        }
    }
}

/// Transcoder writing fake playlist + segment files, no ffmpeg involved.
pub struct FakeTranscoder {
    pub segments_per_rendition: usize,
    /// Probing anything under these rendition names reports no audio.
    pub silent_renditions: Vec<&'static str>,
    /// The source itself probes without audio.
    pub silent_source: bool,
    /// Rendition names in transcode order.
    pub transcoded: Mutex<Vec<String>>,
}

impl FakeTranscoder {
    pub fn new(segments_per_rendition: usize) -> Self {
        Self {
            segments_per_rendition,
            silent_renditions: Vec::new(),
            silent_source: false,
            transcoded: Mutex::new(Vec::new()),
        }
    }

    /// A transcoder whose source and every rendition probe without audio,
    /// like a video-only upload.
    pub fn silent(segments_per_rendition: usize) -> Self {
        Self {
            segments_per_rendition,
            silent_renditions: vec!["240p", "480p", "720p"],
            silent_source: true,
            transcoded: Mutex::new(Vec::new()),
        }
    }

    pub fn transcoded_renditions(&self) -> Vec<String> {
        self.transcoded.lock().unwrap().clone()
    }

    fn media_info(&self, path: &Path, with_audio: bool) -> MediaInfo {
        MediaInfo {
            file_path: path.to_path_buf(),
            file_size: 1024,
            container: "mov,mp4,m4a,3gp,3g2,mj2".to_string(),
            duration: Some(std::time::Duration::from_secs(10)),
            video_tracks: vec![VideoTrack {
                index: 0,
                codec: "h264".to_string(),
                width: 1280,
                height: 720,
                frame_rate: Some(30.0),
            }],
            audio_tracks: if with_audio {
                vec![AudioTrack {
                    index: 0,
                    codec: "aac".to_string(),
                    channels: 2,
                    sample_rate: Some(44100),
                }]
            } else {
                Vec::new()
            },
        }
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn probe(&self, path: &Path) -> AvResult<MediaInfo> {
        let path_str = path.to_string_lossy();
        let silent_rendition = self
            .silent_renditions
            .iter()
            .any(|name| path_str.contains(name));
        let is_source = path_str.ends_with(".mp4");
        let with_audio = if is_source {
            !self.silent_source
        } else {
            !silent_rendition
        };
        Ok(self.media_info(path, with_audio))
    }

    async fn transcode(
        &self,
        _input: &Path,
        out_dir: &Path,
        spec: &RenditionSpec,
    ) -> AvResult<RenditionOutput> {
        std::fs::create_dir_all(out_dir)?;
        self.transcoded.lock().unwrap().push(spec.name.to_string());

        let mut segments = Vec::new();
        for i in 0..self.segments_per_rendition {
            let segment = out_dir.join(format!("segment_{:03}.ts", i));
            std::fs::write(&segment, format!("{} segment {}", spec.name, i))?;
            segments.push(segment);
        }

        let playlist = out_dir.join(PLAYLIST_NAME);
        std::fs::write(&playlist, format!("#EXTM3U\n# {} rendition\n", spec.name))?;

        Ok(RenditionOutput { playlist, segments })
    }
}
