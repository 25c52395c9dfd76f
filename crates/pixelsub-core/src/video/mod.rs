pub mod cursor;
pub mod decoder;
pub mod frame;

use anyhow::Result;
use thiserror::Error;

/// Failures while opening a video source. All of these are fatal and
/// reported once, before any output is produced.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("failed to launch {tool} — is ffmpeg installed?")]
    Launch {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to probe video: {stderr}")]
    Probe { stderr: String },

    #[error("no video stream found in input")]
    NoVideoStream,

    #[error("unexpected probe output: {output}")]
    MalformedProbe { output: String },

    #[error("invalid video dimensions: {width}x{height}")]
    BadDimensions { width: u32, height: u32 },
}

/// A forward-only decoded-frame producer.
///
/// This is the whole contract the rest of the crate relies on: advance one
/// decoded frame at a time, or rewind to the very beginning. Nothing about
/// the producer's internal state (demuxing, codec buffers, color
/// conversion) leaks past this seam, so any conforming decoder can stand in
/// for the real one.
pub trait FrameSource {
    /// Canvas width in pixels. Fixed for the lifetime of the source.
    fn width(&self) -> u32;

    /// Canvas height in pixels. Fixed for the lifetime of the source.
    fn height(&self) -> u32;

    /// The container's declared average frame rate, or `None` when it
    /// carries no usable rate.
    fn fps(&self) -> Option<f64>;

    /// Decode the next frame into `buf` as tightly packed RGB24 rows.
    /// `buf` must hold exactly `width * height * 3` bytes.
    ///
    /// Returns `Ok(false)` when the stream is exhausted. Exhaustion is the
    /// normal termination signal, not an error.
    fn read_frame(&mut self, buf: &mut [u8]) -> Result<bool>;

    /// Rewind to the start of the stream, discarding all decoder state.
    /// The next `read_frame` call produces frame 0 again.
    fn reset(&mut self) -> Result<()>;
}
