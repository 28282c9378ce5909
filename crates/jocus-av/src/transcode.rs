//! HLS rendition transcoding via the ffmpeg CLI.

use crate::probe::{probe_with_ffprobe, MediaInfo};
use crate::tools::resolve_tool;
use crate::{Error, Result};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Segment duration in seconds.
pub const SEGMENT_SECONDS: u32 = 4;

/// File name of each rendition's media playlist.
pub const PLAYLIST_NAME: &str = "stream.m3u8";

/// ffmpeg segment file name template, zero-indexed.
const SEGMENT_TEMPLATE: &str = "segment_%03d.ts";

/// One fixed-quality output of the packaging pipeline.
///
/// The set is static and ordered lowest quality first; callers iterate
/// [`RENDITIONS`] rather than constructing specs of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenditionSpec {
    /// Rendition name, used as the output subdirectory ("240p").
    pub name: &'static str,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Target video bitrate in kbit/s.
    pub bitrate_kbps: u32,
}

impl RenditionSpec {
    /// Peak bandwidth advertised in the multivariant playlist, in bits/s.
    pub const fn bandwidth(&self) -> u32 {
        self.bitrate_kbps * 1000
    }

    /// "WxH" resolution string.
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// The fixed rendition ladder, ascending quality.
pub const RENDITIONS: [RenditionSpec; 3] = [
    RenditionSpec {
        name: "240p",
        width: 426,
        height: 240,
        bitrate_kbps: 400,
    },
    RenditionSpec {
        name: "480p",
        width: 854,
        height: 480,
        bitrate_kbps: 800,
    },
    RenditionSpec {
        name: "720p",
        width: 1280,
        height: 720,
        bitrate_kbps: 1800,
    },
];

/// Files produced by transcoding one rendition.
#[derive(Debug, Clone)]
pub struct RenditionOutput {
    /// The rendition's media playlist (`stream.m3u8`).
    pub playlist: PathBuf,
    /// Segment files in playback order.
    pub segments: Vec<PathBuf>,
}

/// Media engine seam: probing and per-rendition transcoding.
///
/// The packaging pipeline only talks to this trait, so it runs against a
/// fake engine in tests and against [`FfmpegTranscoder`] in production.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Probe a media file (or rendition playlist) for stream metadata.
    async fn probe(&self, path: &Path) -> Result<MediaInfo>;

    /// Transcode `input` into one HLS rendition under `out_dir`.
    async fn transcode(
        &self,
        input: &Path,
        out_dir: &Path,
        spec: &RenditionSpec,
    ) -> Result<RenditionOutput>;
}

/// Transcoder backed by the ffmpeg/ffprobe CLI tools.
pub struct FfmpegTranscoder {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegTranscoder {
    /// Create a transcoder, resolving the tools from `PATH`.
    pub fn new() -> Result<Self> {
        Self::with_tool_paths(None, None)
    }

    /// Create a transcoder, preferring explicitly configured tool paths.
    pub fn with_tool_paths(ffmpeg: Option<&Path>, ffprobe: Option<&Path>) -> Result<Self> {
        Ok(Self {
            ffmpeg: resolve_tool("ffmpeg", ffmpeg)?,
            ffprobe: resolve_tool("ffprobe", ffprobe)?,
        })
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn probe(&self, path: &Path) -> Result<MediaInfo> {
        probe_with_ffprobe(&self.ffprobe, path).await
    }

    async fn transcode(
        &self,
        input: &Path,
        out_dir: &Path,
        spec: &RenditionSpec,
    ) -> Result<RenditionOutput> {
        if !input.exists() {
            return Err(Error::file_not_found(input));
        }
        std::fs::create_dir_all(out_dir)?;

        let playlist = out_dir.join(PLAYLIST_NAME);
        let args = hls_args(input, out_dir, spec);

        info!(
            rendition = spec.name,
            bitrate_kbps = spec.bitrate_kbps,
            "transcoding rendition"
        );
        debug!(ffmpeg = %self.ffmpeg.display(), ?args, "running ffmpeg");

        let output = Command::new(&self.ffmpeg)
            .args(&args)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::tool_not_found("ffmpeg")
                } else {
                    Error::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::tool_failed("ffmpeg", stderr.to_string()));
        }

        if !playlist.exists() {
            return Err(Error::tool_failed(
                "ffmpeg",
                format!("no playlist produced at {}", playlist.display()),
            ));
        }

        let segments = collect_segments(out_dir)?;
        info!(
            rendition = spec.name,
            segments = segments.len(),
            "rendition transcoded"
        );

        Ok(RenditionOutput { playlist, segments })
    }
}

/// Build the ffmpeg argument list for one HLS rendition.
///
/// Video is scaled with a plain `scale=w:h` filter (stretch, no padding)
/// and encoded as H.264 at the target bitrate. Audio is always stereo AAC at
/// 128 kbit/s / 44.1 kHz, regardless of the source layout. Output is
/// 4-second MPEG-TS segments, each independently decodable, with
/// program-date-time tags, and an unbounded playlist starting at segment 0.
fn hls_args(input: &Path, out_dir: &Path, spec: &RenditionSpec) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), input.into()];

    args.extend([
        "-vf".into(),
        format!("scale={}:{}", spec.width, spec.height).into(),
        "-c:v".into(),
        "libx264".into(),
        "-b:v".into(),
        format!("{}k", spec.bitrate_kbps).into(),
        "-c:a".into(),
        "aac".into(),
        "-b:a".into(),
        "128k".into(),
        "-ac".into(),
        "2".into(),
        "-ar".into(),
        "44100".into(),
        "-hls_time".into(),
        SEGMENT_SECONDS.to_string().into(),
        "-hls_list_size".into(),
        "0".into(),
        "-hls_flags".into(),
        "independent_segments+program_date_time".into(),
        "-hls_segment_type".into(),
        "mpegts".into(),
        "-start_number".into(),
        "0".into(),
        "-hls_segment_filename".into(),
        out_dir.join(SEGMENT_TEMPLATE).into(),
        "-f".into(),
        "hls".into(),
    ]);
    args.push(out_dir.join(PLAYLIST_NAME).into());

    args
}

/// Collect a rendition's segment files in playback order.
///
/// The zero-padded `segment_%03d.ts` naming makes lexical order equal
/// playback order.
fn collect_segments(out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut segments: Vec<PathBuf> = std::fs::read_dir(out_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "ts"))
        .collect();
    segments.sort();
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_arg_pair(args: &[OsString], flag: &str, value: &str) -> bool {
        args.windows(2)
            .any(|pair| pair[0] == *flag && pair[1] == *value)
    }

    #[test]
    fn test_rendition_ladder_ascending() {
        assert_eq!(RENDITIONS.len(), 3);
        assert_eq!(RENDITIONS[0].name, "240p");
        assert_eq!(RENDITIONS[1].name, "480p");
        assert_eq!(RENDITIONS[2].name, "720p");
        assert!(RENDITIONS.windows(2).all(|w| w[0].height < w[1].height));
        assert!(RENDITIONS
            .windows(2)
            .all(|w| w[0].bitrate_kbps < w[1].bitrate_kbps));
    }

    #[test]
    fn test_bandwidth_is_kbps_times_1000() {
        assert_eq!(RENDITIONS[0].bandwidth(), 400_000);
        assert_eq!(RENDITIONS[1].bandwidth(), 800_000);
        assert_eq!(RENDITIONS[2].bandwidth(), 1_800_000);
    }

    #[test]
    fn test_resolution_string() {
        assert_eq!(RENDITIONS[2].resolution(), "1280x720");
    }

    #[test]
    fn test_hls_args() {
        let args = hls_args(
            Path::new("/tmp/work/input.mp4"),
            Path::new("/tmp/work/hls/480p"),
            &RENDITIONS[1],
        );

        assert_eq!(args[0], "-y");
        assert!(has_arg_pair(&args, "-vf", "scale=854:480"));
        assert!(has_arg_pair(&args, "-c:v", "libx264"));
        assert!(has_arg_pair(&args, "-b:v", "800k"));
        assert!(has_arg_pair(&args, "-c:a", "aac"));
        assert!(has_arg_pair(&args, "-b:a", "128k"));
        assert!(has_arg_pair(&args, "-ac", "2"));
        assert!(has_arg_pair(&args, "-ar", "44100"));
        assert!(has_arg_pair(&args, "-hls_time", "4"));
        assert!(has_arg_pair(&args, "-hls_list_size", "0"));
        assert!(has_arg_pair(
            &args,
            "-hls_flags",
            "independent_segments+program_date_time"
        ));
        assert!(has_arg_pair(&args, "-start_number", "0"));
        assert_eq!(args[args.len() - 3], "-f");
        assert_eq!(args[args.len() - 2], "hls");
        assert_eq!(
            args.last().unwrap(),
            &OsString::from("/tmp/work/hls/480p/stream.m3u8")
        );
    }

    #[test]
    fn test_collect_segments_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["segment_002.ts", "segment_000.ts", "segment_001.ts"] {
            std::fs::write(dir.path().join(name), b"ts").unwrap();
        }
        std::fs::write(dir.path().join(PLAYLIST_NAME), b"#EXTM3U").unwrap();

        let segments = collect_segments(dir.path()).unwrap();
        let names: Vec<_> = segments
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["segment_000.ts", "segment_001.ts", "segment_002.ts"]);
    }
}
