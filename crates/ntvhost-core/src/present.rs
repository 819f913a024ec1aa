use thiserror::Error;

use crate::framebuffer::FrameBuffer;

/// Renderer collaborator: shows a frame on screen.
///
/// Presentation never fails from the loop's point of view; implementations absorb
/// their own errors (typically through an [`EncoderChain`]).
pub trait Presenter {
    fn present(&mut self, frame: &FrameBuffer);

    /// Make the last presented frame visible now instead of at the next idle point.
    fn flush(&mut self) {}
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("target is {target_w}x{target_h}, frame is {frame_w}x{frame_h}")]
    SizeMismatch {
        frame_w: u32,
        frame_h: u32,
        target_w: u32,
        target_h: u32,
    },

    #[error("target buffer holds {len} pixels, expected {expected}")]
    BadTarget { len: usize, expected: usize },

    #[error("no usable frame encoder left")]
    Exhausted,
}

/// Destination pixels in `0x00RRGGBB` layout, row-major.
pub struct Target<'a> {
    pub pixels: &'a mut [u32],
    pub width: u32,
    pub height: u32,
}

impl Target<'_> {
    #[inline]
    fn check(&self) -> Result<(), EncodeError> {
        let expected = self.width as usize * self.height as usize;
        if expected == 0 || self.pixels.len() != expected {
            return Err(EncodeError::BadTarget {
                len: self.pixels.len(),
                expected,
            });
        }
        Ok(())
    }
}

/// One pixel conversion strategy.
pub trait FrameEncoder {
    fn name(&self) -> &'static str;

    fn encode(&self, frame: &FrameBuffer, target: &mut Target<'_>) -> Result<(), EncodeError>;
}

#[inline]
fn xrgb(rgb: &[u8]) -> u32 {
    (u32::from(rgb[0]) << 16) | (u32::from(rgb[1]) << 8) | u32::from(rgb[2])
}

/// Straight RGB to XRGB copy. Target must have the frame's exact size.
pub struct Xrgb8888;

impl FrameEncoder for Xrgb8888 {
    fn name(&self) -> &'static str {
        "xrgb8888"
    }

    fn encode(&self, frame: &FrameBuffer, target: &mut Target<'_>) -> Result<(), EncodeError> {
        target.check()?;
        if !frame.matches(target.width, target.height) {
            return Err(EncodeError::SizeMismatch {
                frame_w: frame.width(),
                frame_h: frame.height(),
                target_w: target.width,
                target_h: target.height,
            });
        }

        for (dst, src) in target
            .pixels
            .iter_mut()
            .zip(frame.pixel_region().chunks_exact(3))
        {
            *dst = xrgb(src);
        }
        Ok(())
    }
}

/// Nearest-neighbour resample onto any non-empty target.
pub struct NearestScale;

impl FrameEncoder for NearestScale {
    fn name(&self) -> &'static str {
        "nearest-scale"
    }

    fn encode(&self, frame: &FrameBuffer, target: &mut Target<'_>) -> Result<(), EncodeError> {
        target.check()?;

        let fw = frame.width() as usize;
        let fh = frame.height() as usize;
        let tw = target.width as usize;
        let th = target.height as usize;
        let src = frame.pixel_region();

        for (ty, row) in target.pixels.chunks_exact_mut(tw).enumerate() {
            let sy = ty * fh / th;
            for (tx, dst) in row.iter_mut().enumerate() {
                let sx = tx * fw / tw;
                let at = 3 * (sy * fw + sx);
                *dst = xrgb(&src[at..at + 3]);
            }
        }
        Ok(())
    }
}

/// Ordered fallback chain of encoders.
///
/// Encoding starts at the first encoder still usable. An encoder that fails is dropped
/// for the rest of the process and the next one is tried; the first success stays
/// selected. A size mismatch only concerns the current frame: the encoder is passed
/// over for that frame and tried again on the next one.
pub struct EncoderChain {
    encoders: Vec<Box<dyn FrameEncoder>>,
    usable: Vec<bool>,
}

impl EncoderChain {
    #[inline]
    pub fn new(encoders: Vec<Box<dyn FrameEncoder>>) -> Self {
        let usable = vec![true; encoders.len()];
        Self { encoders, usable }
    }

    pub fn with_defaults() -> Self {
        Self::new(vec![Box::new(Xrgb8888), Box::new(NearestScale)])
    }

    #[inline]
    pub fn selected(&self) -> Option<&'static str> {
        self.encoders
            .iter()
            .zip(&self.usable)
            .find(|(_, usable)| **usable)
            .map(|(e, _)| e.name())
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        !self.usable.contains(&true)
    }

    /// Returns the name of the encoder that produced the pixels.
    pub fn encode(
        &mut self,
        frame: &FrameBuffer,
        target: &mut Target<'_>,
    ) -> Result<&'static str, EncodeError> {
        let mut skipped = None;

        for (encoder, usable) in self.encoders.iter().zip(self.usable.iter_mut()) {
            if !*usable {
                continue;
            }
            match encoder.encode(frame, target) {
                Ok(()) => return Ok(encoder.name()),
                Err(e @ EncodeError::SizeMismatch { .. }) => {
                    log::debug!("present: encoder '{}' skipped: {}", encoder.name(), e);
                    skipped = Some(e);
                }
                Err(e) => {
                    log::warn!("present: encoder '{}' unusable: {}", encoder.name(), e);
                    *usable = false;
                }
            }
        }
        Err(skipped.unwrap_or(EncodeError::Exhausted))
    }
}
