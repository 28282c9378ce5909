//! Probed media metadata types.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Metadata extracted from a media file.
#[derive(Debug, Clone, Serialize)]
pub struct MediaInfo {
    /// Path to the probed file.
    pub file_path: PathBuf,
    /// File size in bytes.
    pub file_size: u64,
    /// Container format name (e.g. "mov,mp4,m4a,3gp,3g2,mj2").
    pub container: String,
    /// Total duration, if reported.
    pub duration: Option<Duration>,
    /// Video streams.
    pub video_tracks: Vec<VideoTrack>,
    /// Audio streams.
    pub audio_tracks: Vec<AudioTrack>,
}

impl MediaInfo {
    /// Whether the media has at least one audio stream.
    pub fn has_audio(&self) -> bool {
        !self.audio_tracks.is_empty()
    }

    /// The first video track, if any.
    pub fn primary_video(&self) -> Option<&VideoTrack> {
        self.video_tracks.first()
    }
}

/// A single video stream.
#[derive(Debug, Clone, Serialize)]
pub struct VideoTrack {
    /// Stream index among video streams.
    pub index: u32,
    /// Codec name (e.g. "h264").
    pub codec: String,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frame rate, if reported.
    pub frame_rate: Option<f64>,
}

/// A single audio stream.
#[derive(Debug, Clone, Serialize)]
pub struct AudioTrack {
    /// Stream index among audio streams.
    pub index: u32,
    /// Codec name (e.g. "aac").
    pub codec: String,
    /// Channel count.
    pub channels: u32,
    /// Sample rate in Hz, if reported.
    pub sample_rate: Option<u32>,
}
