/// Pixel region start addresses are multiples of this (one cache line).
pub const PIXEL_ALIGNMENT: usize = 64;

const PPM_MAGIC: &[u8] = b"P6\n";

/// Bytes per pixel in the pixel region (interleaved R, G, B).
pub const BYTES_PER_PIXEL: usize = 3;

/// PPM image container whose raw pixel region is cache-line aligned.
///
/// Layout: `"P6\n"`, `padding()` spaces, `"<width> <height>\n255\n"`, then
/// `3 * width * height` pixel bytes. The padding is the smallest count that puts the
/// pixel region on a [`PIXEL_ALIGNMENT`] boundary. The backing allocation never moves
/// after construction; a new size means a new `FrameBuffer`.
pub struct FrameBuffer {
    width: u32,
    height: u32,
    bytes: Box<[u8]>,
    padding: usize,
    pixel_offset: usize,
    pixel_len: usize,
}

impl FrameBuffer {
    /// Allocates a black frame. Dimensions below 1 are raised to 1.
    pub fn allocate(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);

        let dims = format!("{width} {height}\n255\n");
        let header_len = PPM_MAGIC.len() + dims.len();
        let pixel_len = BYTES_PER_PIXEL * width as usize * height as usize;

        let mut bytes = vec![0u8; header_len + PIXEL_ALIGNMENT + pixel_len].into_boxed_slice();

        let addr = bytes.as_ptr() as usize + header_len;
        let padding = (PIXEL_ALIGNMENT - addr % PIXEL_ALIGNMENT) % PIXEL_ALIGNMENT;
        let pixel_offset = header_len + padding;

        let mut at = 0usize;
        bytes[at..at + PPM_MAGIC.len()].copy_from_slice(PPM_MAGIC);
        at += PPM_MAGIC.len();
        bytes[at..at + padding].fill(b' ');
        at += padding;
        bytes[at..at + dims.len()].copy_from_slice(dims.as_bytes());

        Self {
            width,
            height,
            bytes,
            padding,
            pixel_offset,
            pixel_len,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn matches(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }

    /// Spaces inserted between the magic token and the dimensions line.
    #[inline]
    pub fn padding(&self) -> usize {
        self.padding
    }

    /// Length of the full header, padding included.
    #[inline]
    pub fn header_len(&self) -> usize {
        self.pixel_offset
    }

    #[inline]
    pub fn pixel_region(&self) -> &[u8] {
        &self.bytes[self.pixel_offset..self.pixel_offset + self.pixel_len]
    }

    /// The span handed to the native module. Exactly `3 * width * height` bytes.
    #[inline]
    pub fn pixel_region_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[self.pixel_offset..self.pixel_offset + self.pixel_len]
    }

    /// Header plus pixels: a complete binary PPM image.
    #[inline]
    pub fn container(&self) -> &[u8] {
        &self.bytes[..self.pixel_offset + self.pixel_len]
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("padding", &self.padding)
            .field("pixel_len", &self.pixel_len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_region_is_aligned_and_exact() {
        for (w, h) in [(1, 1), (2, 3), (7, 5), (640, 480), (800, 600), (1, 1000), (333, 1)] {
            let mut fb = FrameBuffer::allocate(w, h);
            let region = fb.pixel_region_mut();
            assert_eq!(region.as_ptr() as usize % PIXEL_ALIGNMENT, 0, "{w}x{h}");
            assert_eq!(region.len(), 3 * w as usize * h as usize, "{w}x{h}");
        }
    }

    #[test]
    fn padding_is_minimal() {
        let fb = FrameBuffer::allocate(640, 480);
        assert!(fb.padding() < PIXEL_ALIGNMENT);
    }

    #[test]
    fn header_is_ppm_with_spaces_before_dimensions() {
        let fb = FrameBuffer::allocate(12, 34);
        let header = &fb.container()[..fb.header_len()];

        assert!(header.starts_with(b"P6\n"));
        assert!(header.ends_with(b"12 34\n255\n"));
        assert!(header[3..3 + fb.padding()].iter().all(|&b| b == b' '));
        assert_eq!(fb.header_len(), 3 + fb.padding() + "12 34\n255\n".len());
    }

    #[test]
    fn container_ends_with_pixels() {
        let mut fb = FrameBuffer::allocate(2, 2);
        fb.pixel_region_mut().fill(0xAB);

        let c = fb.container();
        assert_eq!(c.len(), fb.header_len() + 12);
        assert!(c[fb.header_len()..].iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn zero_dimensions_are_raised_to_one() {
        let fb = FrameBuffer::allocate(0, 0);
        assert!(fb.matches(1, 1));
        assert_eq!(fb.pixel_region().len(), 3);
    }
}
