mod cli;

use std::fs::File;
use std::io::BufWriter;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use pixelsub_core::pipeline::{self, PipelineConfig};
use pixelsub_core::video::decoder::VideoDecoder;
use pixelsub_core::video::FrameSource;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();

    info!(
        input = ?cli.input,
        output = ?cli.output,
        block_size = cli.block_size,
        frame_interval = cli.frame_interval,
        "starting conversion"
    );

    let decoder = VideoDecoder::open(&cli.input).context("failed to open video")?;
    info!(
        width = decoder.width(),
        height = decoder.height(),
        fps = ?decoder.fps(),
        "video opened"
    );

    let config = PipelineConfig {
        block_size: cli.block_size,
        frame_interval: cli.frame_interval,
        block_overlap: cli.block_overlap,
        debug_frames_dir: cli.debug_frames,
    };

    let file = File::create(&cli.output)
        .with_context(|| format!("failed to create {}", cli.output.display()))?;
    let stats = pipeline::run_pipeline(decoder, &config, BufWriter::new(file))
        .context("conversion failed")?;

    info!(
        frames_decoded = stats.frames_decoded,
        frames_compiled = stats.frames_compiled,
        records_written = stats.records_written,
        output = ?cli.output,
        "conversion complete"
    );

    Ok(())
}
