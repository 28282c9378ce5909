//! Media probing via ffprobe.

mod ffprobe;
mod types;

pub use ffprobe::probe_with_ffprobe;
pub use types::{AudioTrack, MediaInfo, VideoTrack};
