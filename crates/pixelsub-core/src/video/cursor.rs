use anyhow::Result;
use image::RgbImage;
use tracing::{debug, info};

use super::frame::Frame;
use super::FrameSource;

/// Random-access-by-index facade over a forward-only frame source.
///
/// The underlying source only supports "decode the next frame" and "rewind
/// to the start", so any backward request costs a full rewind and replay,
/// and skipping forward still decodes every intermediate frame. Callers
/// should request indices in non-decreasing order.
///
/// The cursor owns a single pixel buffer that is overwritten in place on
/// every decode; the `&Frame` returned by [`DecodeCursor::frame`] is valid
/// only until the next call, which the borrow on `self` enforces.
pub struct DecodeCursor<S> {
    source: S,
    frame: Frame,
    /// Index the next successful decode will produce.
    next_index: u32,
    exhausted: bool,
}

impl<S: FrameSource> DecodeCursor<S> {
    pub fn new(source: S) -> Self {
        let (width, height) = (source.width(), source.height());
        assert!(
            width > 0 && height > 0,
            "frame source reported empty dimensions: {width}x{height}"
        );
        Self {
            frame: Frame {
                image: RgbImage::new(width, height),
                frame_number: 0,
            },
            source,
            next_index: 0,
            exhausted: false,
        }
    }

    /// Decode until frame `target` is in the buffer and return it.
    ///
    /// Returns `Ok(None)` once the source runs out of frames before
    /// reaching `target`; the cursor is terminal from then on and every
    /// later call returns `Ok(None)` as well.
    pub fn frame(&mut self, target: u32) -> Result<Option<&Frame>> {
        if self.exhausted {
            return Ok(None);
        }

        if target < self.next_index {
            info!(
                target,
                next_index = self.next_index,
                "backward request, rewinding to stream start"
            );
            self.source.reset()?;
            self.next_index = 0;
        }

        while self.next_index <= target {
            if !self.source.read_frame(&mut self.frame.image)? {
                info!(target, decoded = self.next_index, "stream exhausted");
                self.exhausted = true;
                return Ok(None);
            }
            self.frame.frame_number = self.next_index;
            self.next_index += 1;
            debug!(frame_number = self.frame.frame_number, "cursor advanced");
        }

        Ok(Some(&self.frame))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    /// In-memory source yielding solid-color frames: frame i is `[i, 0, 0]`.
    struct SolidSource {
        frame_count: u32,
        pos: u32,
        resets: Rc<Cell<u32>>,
    }

    impl SolidSource {
        fn new(frame_count: u32) -> (Self, Rc<Cell<u32>>) {
            let resets = Rc::new(Cell::new(0));
            (
                Self {
                    frame_count,
                    pos: 0,
                    resets: resets.clone(),
                },
                resets,
            )
        }
    }

    impl FrameSource for SolidSource {
        fn width(&self) -> u32 {
            2
        }

        fn height(&self) -> u32 {
            2
        }

        fn fps(&self) -> Option<f64> {
            Some(25.0)
        }

        fn read_frame(&mut self, buf: &mut [u8]) -> Result<bool> {
            if self.pos >= self.frame_count {
                return Ok(false);
            }
            for px in buf.chunks_exact_mut(3) {
                px.copy_from_slice(&[self.pos as u8, 0, 0]);
            }
            self.pos += 1;
            Ok(true)
        }

        fn reset(&mut self) -> Result<()> {
            self.pos = 0;
            self.resets.set(self.resets.get() + 1);
            Ok(())
        }
    }

    fn red_at_origin(frame: &Frame) -> u8 {
        frame.sample(0, 0)[0]
    }

    #[test]
    fn non_decreasing_requests_hit_exact_indices_without_reset() {
        let (source, resets) = SolidSource::new(5);
        let mut cursor = DecodeCursor::new(source);

        for target in 0..5 {
            let frame = cursor.frame(target).unwrap().unwrap();
            assert_eq!(frame.frame_number, target);
            assert_eq!(red_at_origin(frame), target as u8);
        }

        assert_eq!(resets.get(), 0, "forward walk must never rewind");
    }

    #[test]
    fn skip_forward_decodes_through_intermediate_frames() {
        let (source, resets) = SolidSource::new(10);
        let mut cursor = DecodeCursor::new(source);

        let frame = cursor.frame(7).unwrap().unwrap();
        assert_eq!(frame.frame_number, 7);
        assert_eq!(red_at_origin(frame), 7);
        assert_eq!(resets.get(), 0);
    }

    #[test]
    fn backward_request_resets_and_replays_deterministically() {
        let (source, resets) = SolidSource::new(5);
        let mut cursor = DecodeCursor::new(source);

        cursor.frame(3).unwrap().unwrap();
        let replayed = cursor.frame(1).unwrap().unwrap();
        assert_eq!(replayed.frame_number, 1);
        let replayed_color = red_at_origin(replayed);
        assert_eq!(resets.get(), 1);

        // A fresh cursor asked for the same index sees the same content.
        let (source, _) = SolidSource::new(5);
        let mut fresh = DecodeCursor::new(source);
        let first_pass = fresh.frame(1).unwrap().unwrap();
        assert_eq!(red_at_origin(first_pass), replayed_color);
    }

    #[test]
    fn repeating_an_index_counts_as_backward() {
        let (source, resets) = SolidSource::new(5);
        let mut cursor = DecodeCursor::new(source);

        cursor.frame(2).unwrap().unwrap();
        let again = cursor.frame(2).unwrap().unwrap();
        assert_eq!(again.frame_number, 2);
        assert_eq!(resets.get(), 1);
    }

    #[test]
    fn exhaustion_is_terminal() {
        let (source, _) = SolidSource::new(2);
        let mut cursor = DecodeCursor::new(source);

        assert!(cursor.frame(5).unwrap().is_none());
        // Terminal: even a previously-decodable index stays unavailable.
        assert!(cursor.frame(0).unwrap().is_none());
    }
}
