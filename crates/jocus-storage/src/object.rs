//! Artifact roles and their upload metadata.

use std::path::Path;

/// Role of a published artifact, derived from its file name.
///
/// Playlists and the manifest are regenerated on re-processing, so they get
/// a short cache lifetime; segments are immutable once produced and can be
/// cached effectively forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// The multivariant playlist (`master.m3u8`), published last.
    Manifest,
    /// A per-rendition media playlist.
    Playlist,
    /// An MPEG-TS media segment.
    Segment,
    /// Anything else.
    Other,
}

impl ArtifactKind {
    /// Classify a local file by name.
    pub fn for_path(path: &Path) -> Self {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if name == "master.m3u8" {
            Self::Manifest
        } else if name.ends_with(".m3u8") {
            Self::Playlist
        } else if name.ends_with(".ts") {
            Self::Segment
        } else {
            Self::Other
        }
    }

    /// MIME content type for the object.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Manifest | Self::Playlist => "application/vnd.apple.mpegurl",
            Self::Segment => "video/mp2t",
            Self::Other => "application/octet-stream",
        }
    }

    /// Cache-Control header for the object.
    pub fn cache_control(&self) -> &'static str {
        match self {
            // Playlists may be rewritten when a video is re-processed.
            Self::Manifest | Self::Playlist => "public, max-age=3600",
            Self::Segment | Self::Other => "public, max-age=31536000",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_classify_by_file_name() {
        assert_eq!(
            ArtifactKind::for_path(&PathBuf::from("/tmp/hls/master.m3u8")),
            ArtifactKind::Manifest
        );
        assert_eq!(
            ArtifactKind::for_path(&PathBuf::from("/tmp/hls/240p/stream.m3u8")),
            ArtifactKind::Playlist
        );
        assert_eq!(
            ArtifactKind::for_path(&PathBuf::from("/tmp/hls/240p/segment_000.ts")),
            ArtifactKind::Segment
        );
        assert_eq!(
            ArtifactKind::for_path(&PathBuf::from("/tmp/hls/thumb.jpg")),
            ArtifactKind::Other
        );
    }

    #[test]
    fn test_content_types() {
        assert_eq!(
            ArtifactKind::Manifest.content_type(),
            "application/vnd.apple.mpegurl"
        );
        assert_eq!(
            ArtifactKind::Playlist.content_type(),
            "application/vnd.apple.mpegurl"
        );
        assert_eq!(ArtifactKind::Segment.content_type(), "video/mp2t");
        assert_eq!(
            ArtifactKind::Other.content_type(),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_cache_policy() {
        assert_eq!(
            ArtifactKind::Manifest.cache_control(),
            "public, max-age=3600"
        );
        assert_eq!(
            ArtifactKind::Playlist.cache_control(),
            "public, max-age=3600"
        );
        assert_eq!(
            ArtifactKind::Segment.cache_control(),
            "public, max-age=31536000"
        );
    }
}
