use std::io::{self, Write};

use image::Rgb;

use super::timecode::format_timecode;
use super::OverlayRecord;

/// Glyph rendered for every block: U+2588 FULL BLOCK.
const BLOCK_GLYPH: char = '█';

/// ASS primary colour override: `&H` + six hex digits with the component
/// order swapped relative to RGB (blue first, red last).
fn ass_color(color: Rgb<u8>) -> String {
    let Rgb([r, g, b]) = color;
    format!("&H{b:02X}{g:02X}{r:02X}&")
}

/// Serializes the static script header and one Dialogue line per overlay
/// record.
///
/// Any write failure on the sink is fatal to the run; the writer itself has
/// no error conditions of its own.
pub struct AssWriter<W: Write> {
    out: W,
    width: u32,
    height: u32,
    block_size: u32,
    horizontal_stride: u32,
}

impl<W: Write> AssWriter<W> {
    /// `horizontal_stride` is the pixel distance between adjacent block
    /// columns (block size minus the configured overlap).
    pub fn new(out: W, width: u32, height: u32, block_size: u32, horizontal_stride: u32) -> Self {
        assert!(block_size > 0, "block size must be positive");
        assert!(horizontal_stride > 0, "horizontal stride must be positive");
        Self {
            out,
            width,
            height,
            block_size,
            horizontal_stride,
        }
    }

    /// Write the `[Script Info]`, `[V4+ Styles]` and `[Events]` preamble.
    /// The style's font size equals the block size so each glyph covers
    /// one block.
    pub fn write_header(&mut self) -> io::Result<()> {
        writeln!(self.out, "[Script Info]")?;
        writeln!(self.out, "Title: Pixelated Video Subtitles")?;
        writeln!(self.out, "ScriptType: v4.00+")?;
        writeln!(self.out, "PlayResX: {}", self.width)?;
        writeln!(self.out, "PlayResY: {}", self.height)?;
        writeln!(self.out)?;
        writeln!(self.out, "Timer: 100.0000")?;
        writeln!(self.out)?;
        writeln!(self.out, "[V4+ Styles]")?;
        writeln!(
            self.out,
            "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, \
             OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, \
             ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, \
             Alignment, MarginL, MarginR, MarginV, Encoding"
        )?;
        writeln!(
            self.out,
            "Style: Pixel,Arial,{},&H00FFFFFF,&H00000000,&H00000000,&H00000000,\
             0,0,0,0,100,100,0,0,1,0,0,7,0,0,0,1",
            self.block_size
        )?;
        writeln!(self.out)?;
        writeln!(self.out, "[Events]")?;
        writeln!(
            self.out,
            "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text"
        )
    }

    /// Write one Dialogue line. The record's grid position is mapped to
    /// the pixel offset of its source cell's top-left corner.
    pub fn write_record(&mut self, record: &OverlayRecord) -> io::Result<()> {
        let x = record.col * self.horizontal_stride;
        let y = record.row * self.block_size;
        writeln!(
            self.out,
            "Dialogue: 0,{},{},Pixel,,0,0,0,,{{\\pos({},{})\\1c{}}}{}",
            format_timecode(record.start_seconds),
            format_timecode(record.end_seconds),
            x,
            y,
            ass_color(record.color),
            BLOCK_GLYPH,
        )
    }

    /// Flush the underlying sink so write failures surface here instead of
    /// being lost when the sink is dropped.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
