pub mod timecode;
pub mod writer;

use image::Rgb;

/// One timestamped, positioned, colored block destined for the subtitle
/// output. Grid position is in block units; the writer maps it to a pixel
/// offset.
#[derive(Debug, Clone, Copy)]
pub struct OverlayRecord {
    /// Window start, seconds from stream start.
    pub start_seconds: f64,
    /// Window end, seconds from stream start. Always >= start.
    pub end_seconds: f64,
    /// Grid column (block units, counted along the horizontal stride).
    pub col: u32,
    /// Grid row (block units).
    pub row: u32,
    /// Sampled color of the block's source cell.
    pub color: Rgb<u8>,
}
