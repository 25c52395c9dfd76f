use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "pixelsub", about = "Video to pixel-block ASS subtitle converter")]
pub struct Cli {
    /// Path to the input video file (MP4, etc.).
    pub input: PathBuf,

    /// Path to write the generated subtitle file.
    #[arg(short, long, default_value = "output.ass")]
    pub output: PathBuf,

    /// Edge length in pixels of each rendered block.
    #[arg(short, long, default_value_t = 40)]
    pub block_size: u32,

    /// Compile every Nth decoded frame (1 = every frame).
    #[arg(short = 'n', long, default_value_t = 20)]
    pub frame_interval: u32,

    /// Horizontal overlap in pixels between adjacent block columns.
    /// Tuned for the default block size; re-tune when changing it.
    #[arg(long, default_value_t = 25)]
    pub block_overlap: u32,

    /// Directory to save preview images of compiled frames.
    #[arg(long)]
    pub debug_frames: Option<PathBuf>,
}
