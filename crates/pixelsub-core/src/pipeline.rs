use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::debug;
use crate::overlay::writer::AssWriter;
use crate::overlay::OverlayRecord;
use crate::video::cursor::DecodeCursor;
use crate::video::frame::Frame;
use crate::video::FrameSource;

/// Substitute frame rate when the container declares none. Only timestamp
/// accuracy degrades; the conversion still completes.
const DEFAULT_FPS: f64 = 25.0;

/// Parameters for the overlay compilation pipeline.
pub struct PipelineConfig {
    /// Edge length in pixels of each rendered block.
    pub block_size: u32,
    /// Compile every Nth decoded frame (1 = every frame).
    pub frame_interval: u32,
    /// Horizontal overlap in pixels between adjacent block columns, so the
    /// rendered glyphs tile despite font proportions. Tuned for the default
    /// block size; re-tune when changing it.
    pub block_overlap: u32,
    /// Directory to write preview images of compiled frames, or None to skip.
    pub debug_frames_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            block_size: 40,
            frame_interval: 20,
            block_overlap: 25,
            debug_frames_dir: None,
        }
    }
}

impl PipelineConfig {
    /// Pixel distance between adjacent block columns.
    pub fn horizontal_stride(&self) -> u32 {
        self.block_size - self.block_overlap
    }

    fn validate(&self) -> Result<()> {
        if self.block_size < 1 {
            bail!("block_size must be >= 1, got {}", self.block_size);
        }
        if self.frame_interval < 1 {
            bail!("frame_interval must be >= 1, got {}", self.frame_interval);
        }
        if self.block_overlap >= self.block_size {
            bail!(
                "block_overlap ({}) must be smaller than block_size ({})",
                self.block_overlap,
                self.block_size
            );
        }
        Ok(())
    }
}

/// Counters reported after a completed run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineStats {
    /// Frames pulled through the decoder, compiled or not.
    pub frames_decoded: u32,
    /// Frames actually compiled into overlay records.
    pub frames_compiled: u32,
    /// Dialogue lines written.
    pub records_written: u64,
}

/// Convert a video source into pixel-block subtitles on `out`.
///
/// Walks the decode cursor strictly forward, compiles every
/// `frame_interval`-th frame into one batch of overlay records, and streams
/// them to the writer. Stops at end-of-stream; a frame that fails to decode
/// never produces a partial batch.
pub fn run_pipeline<S: FrameSource>(
    source: S,
    config: &PipelineConfig,
    out: impl Write,
) -> Result<PipelineStats> {
    config.validate()?;

    let (width, height) = (source.width(), source.height());
    let fps = resolve_fps(&source);

    info!(
        width,
        height,
        fps,
        block_size = config.block_size,
        frame_interval = config.frame_interval,
        "pipeline starting"
    );

    if let Some(dir) = &config.debug_frames_dir {
        std::fs::create_dir_all(dir).context("failed to create debug frames directory")?;
        info!(?dir, "debug frames directory ready");
    }

    let mut writer = AssWriter::new(
        out,
        width,
        height,
        config.block_size,
        config.horizontal_stride(),
    );
    writer
        .write_header()
        .context("failed to write subtitle header")?;

    let mut cursor = DecodeCursor::new(source);
    let mut stats = PipelineStats::default();
    let mut output_frame: u32 = 0;

    loop {
        // Every frame goes through the cursor even when it will not be
        // compiled; the source cannot skip ahead without decoding.
        let Some(frame) = cursor
            .frame(output_frame)
            .with_context(|| format!("failed to decode frame {output_frame}"))?
        else {
            break;
        };
        stats.frames_decoded += 1;

        if output_frame % config.frame_interval == 0 {
            info!(frame_number = output_frame, "compiling frame");

            let start_seconds = output_frame as f64 / fps;
            let end_seconds = (output_frame + config.frame_interval) as f64 / fps;
            let records = compile_frame(frame, config, start_seconds, end_seconds);

            if let Some(dir) = &config.debug_frames_dir {
                debug::save_preview(&records, output_frame, width, height, config, dir)
                    .context("failed to save debug frame")?;
            }

            for record in &records {
                writer
                    .write_record(record)
                    .context("failed to write overlay record")?;
            }

            stats.records_written += records.len() as u64;
            stats.frames_compiled += 1;
        }

        output_frame += 1;
    }

    writer.flush().context("failed to flush subtitle output")?;

    info!(
        frames_decoded = stats.frames_decoded,
        frames_compiled = stats.frames_compiled,
        records_written = stats.records_written,
        "pipeline complete"
    );

    Ok(stats)
}

/// The declared average rate, or the default with a warning.
fn resolve_fps(source: &impl FrameSource) -> f64 {
    match source.fps() {
        Some(fps) if fps > 0.0 => fps,
        _ => {
            warn!(
                default_fps = DEFAULT_FPS,
                "could not determine frame rate, falling back to default"
            );
            DEFAULT_FPS
        }
    }
}

/// Sample one frame into a batch of overlay records sharing one time window.
///
/// Rows step by the block size, columns by the horizontal stride. Each
/// cell contributes the single pixel at its top-left corner, not an area
/// average.
fn compile_frame(
    frame: &Frame,
    config: &PipelineConfig,
    start_seconds: f64,
    end_seconds: f64,
) -> Vec<OverlayRecord> {
    let stride = config.horizontal_stride();
    let mut records = Vec::new();

    for (row, y) in (0..frame.height())
        .step_by(config.block_size as usize)
        .enumerate()
    {
        for (col, x) in (0..frame.width()).step_by(stride as usize).enumerate() {
            records.push(OverlayRecord {
                start_seconds,
                end_seconds,
                col: col as u32,
                row: row as u32,
                color: frame.sample(x, y),
            });
        }
    }

    records
}
