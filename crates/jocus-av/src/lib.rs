//! # jocus-av
//!
//! Media probing and transcoding library for the Jocus pipeline.
//!
//! This crate provides functionality for:
//! - Probing media files to extract stream metadata (codecs, audio layout, duration)
//! - Transcoding a source video into fixed-quality HLS renditions
//! - Scratch-workspace management for a single packaging run
//!
//! All media processing shells out to the ffmpeg/ffprobe CLI; the tools are
//! resolved from `PATH` or from explicitly configured paths.
//!
//! ## Example
//!
//! ```no_run
//! # async fn run() -> jocus_av::Result<()> {
//! let info = jocus_av::probe("/path/to/video.mp4").await?;
//! println!("Container: {}", info.container);
//! if !info.has_audio() {
//!     println!("source has no audio stream");
//! }
//! # Ok(())
//! # }
//! ```

mod error;
pub mod probe;
pub mod tools;
pub mod transcode;
pub mod workspace;

// Re-exports
pub use error::{Error, Result};
pub use probe::{AudioTrack, MediaInfo, VideoTrack};
pub use tools::{check_tool, check_tools, require_tool, ToolInfo};
pub use transcode::{
    FfmpegTranscoder, RenditionOutput, RenditionSpec, Transcoder, PLAYLIST_NAME, RENDITIONS,
    SEGMENT_SECONDS,
};
pub use workspace::Workspace;

/// Probe a media file and return its metadata.
///
/// Resolves `ffprobe` from `PATH`. Use [`FfmpegTranscoder`] when the tool
/// paths come from configuration.
pub async fn probe<P: AsRef<std::path::Path>>(path: P) -> Result<MediaInfo> {
    let ffprobe = tools::require_tool("ffprobe")?;
    probe::probe_with_ffprobe(&ffprobe, path.as_ref()).await
}
