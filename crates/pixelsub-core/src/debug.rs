use std::path::Path;

use anyhow::{Context, Result};
use image::RgbImage;
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use tracing::debug;

use crate::overlay::OverlayRecord;
use crate::pipeline::PipelineConfig;

/// Render one compiled batch as a block mosaic PNG.
///
/// Blocks are drawn in record order at the same pixel offsets the subtitle
/// output uses, so the image previews what a subtitle renderer will show
/// without needing one installed.
pub fn save_preview(
    records: &[OverlayRecord],
    frame_number: u32,
    width: u32,
    height: u32,
    config: &PipelineConfig,
    dir: &Path,
) -> Result<()> {
    let mut img = RgbImage::new(width, height);
    let stride = config.horizontal_stride();

    for record in records {
        let x = record.col * stride;
        let y = record.row * config.block_size;
        let rect =
            Rect::at(x as i32, y as i32).of_size(config.block_size, config.block_size);
        draw_filled_rect_mut(&mut img, rect, record.color);
    }

    let path = dir.join(format!("frame_{frame_number:08}.png"));
    img.save(&path)
        .with_context(|| format!("failed to save debug frame to {}", path.display()))?;

    debug!(?path, blocks = records.len(), "saved debug frame");
    Ok(())
}
