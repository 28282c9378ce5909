//! HLS playlist structures.

use std::fmt::Write;

/// One variant entry of a multivariant playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantStream {
    /// Rendition name ("240p").
    pub name: String,
    /// Playlist URI, relative to the manifest.
    pub uri: String,
    /// Peak bandwidth in bits per second.
    pub bandwidth: u32,
    /// Video width.
    pub width: u32,
    /// Video height.
    pub height: u32,
}

/// Multivariant (master) playlist.
///
/// Variants are rendered in insertion order; the packager inserts them in
/// ascending quality order, which players rely on for initial selection.
#[derive(Debug, Clone, Default)]
pub struct MasterPlaylist {
    /// Stream variants.
    pub variants: Vec<VariantStream>,
}

impl MasterPlaylist {
    /// Create an empty multivariant playlist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stream variant.
    pub fn add_variant(mut self, variant: VariantStream) -> Self {
        self.variants.push(variant);
        self
    }

    /// Render to M3U8 string.
    pub fn render(&self) -> String {
        let mut out = String::new();

        writeln!(out, "#EXTM3U").unwrap();
        writeln!(out, "#EXT-X-VERSION:3").unwrap();

        for variant in &self.variants {
            writeln!(
                out,
                "#EXT-X-STREAM-INF:BANDWIDTH={},RESOLUTION={}x{}",
                variant.bandwidth, variant.width, variant.height
            )
            .unwrap();
            writeln!(out, "{}", variant.uri).unwrap();
        }

        out
    }
}
