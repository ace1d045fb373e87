use crate::foundation::error::{DeltaError, DeltaResult};

/// Interleaved channels per pixel (RGB8).
pub const CHANNELS: usize = 3;

/// Fill color for freshly allocated frames.
pub const BACKGROUND_RGB: [u8; 3] = [0, 0, 0];

/// Fill color for the padding of a bleeded copy.
pub const BLEED_SENTINEL_RGB: [u8; 3] = [0, 0, 0];

/// A rectangular RGB8 pixel buffer, tightly packed, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Frame {
    /// Allocate a `width × height` frame filled with [`BACKGROUND_RGB`].
    pub fn allocate(width: u32, height: u32) -> Self {
        Self::filled(width, height, BACKGROUND_RGB)
    }

    /// Allocate a frame where every pixel is `rgb`.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let px = width as usize * height as usize;
        let mut data = Vec::with_capacity(px * CHANNELS);
        for _ in 0..px {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Wrap raw RGB8 bytes.
    pub fn from_rgb8(width: u32, height: u32, data: Vec<u8>) -> DeltaResult<Self> {
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(DeltaError::validation(format!(
                "rgb8 buffer has {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Raw RGB8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the frame and return its bytes.
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    fn offset(&self, x: usize, y: usize) -> usize {
        y * self.stride() + x * CHANNELS
    }

    /// Read one pixel. Panics when out of range.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        assert!(x < self.width && y < self.height, "pixel ({x},{y}) out of range");
        let o = self.offset(x as usize, y as usize);
        [self.data[o], self.data[o + 1], self.data[o + 2]]
    }

    /// Write one pixel. Panics when out of range.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        assert!(x < self.width && y < self.height, "pixel ({x},{y}) out of range");
        let o = self.offset(x as usize, y as usize);
        self.data[o..o + CHANNELS].copy_from_slice(&rgb);
    }

    /// `true` when a `block_len × block_len` window at `(x, y)` lies inside this frame.
    pub fn fits_block(&self, block_len: usize, x: usize, y: usize) -> bool {
        x.checked_add(block_len)
            .is_some_and(|r| r <= self.width as usize)
            && y.checked_add(block_len)
                .is_some_and(|b| b <= self.height as usize)
    }

    /// Raster-copy all of `src` into the top-left corner of `self`.
    ///
    /// Panics when `self` is smaller than `src` in either dimension.
    pub fn copy_whole(&mut self, src: &Frame) {
        assert!(
            self.width >= src.width && self.height >= src.height,
            "copy_whole: destination {}x{} is smaller than source {}x{}",
            self.width,
            self.height,
            src.width,
            src.height
        );
        if self.width == src.width {
            let n = src.data.len();
            self.data[..n].copy_from_slice(&src.data);
            return;
        }
        let row = src.stride();
        for y in 0..src.height as usize {
            let d = self.offset(0, y);
            let s = src.offset(0, y);
            self.data[d..d + row].copy_from_slice(&src.data[s..s + row]);
        }
    }

    /// Copy a `block_len × block_len` window from `src` at `(src_x, src_y)` to `(dst_x, dst_y)`.
    ///
    /// Both windows must fit; canvas sizes are derived so they always do. Panics otherwise.
    pub fn copy_block(
        &mut self,
        src: &Frame,
        block_len: usize,
        src_x: usize,
        src_y: usize,
        dst_x: usize,
        dst_y: usize,
    ) {
        assert!(
            self.try_copy_block(src, block_len, src_x, src_y, dst_x, dst_y),
            "copy_block: {block_len}px block ({src_x},{src_y}) -> ({dst_x},{dst_y}) does not fit \
             source {}x{} / destination {}x{}",
            src.width,
            src.height,
            self.width,
            self.height
        );
    }

    /// Like [`Frame::copy_block`], but returns `false` and copies nothing when a window does not fit.
    pub fn try_copy_block(
        &mut self,
        src: &Frame,
        block_len: usize,
        src_x: usize,
        src_y: usize,
        dst_x: usize,
        dst_y: usize,
    ) -> bool {
        if !src.fits_block(block_len, src_x, src_y) || !self.fits_block(block_len, dst_x, dst_y) {
            return false;
        }
        let row = block_len * CHANNELS;
        for dy in 0..block_len {
            let s = src.offset(src_x, src_y + dy);
            let d = self.offset(dst_x, dst_y + dy);
            self.data[d..d + row].copy_from_slice(&src.data[s..s + row]);
        }
        true
    }

    /// Fill a `block_len × block_len` window with `rgb`. Returns `false` when it does not fit.
    pub fn fill_block(&mut self, block_len: usize, x: usize, y: usize, rgb: [u8; 3]) -> bool {
        if !self.fits_block(block_len, x, y) {
            return false;
        }
        for dy in 0..block_len {
            let d = self.offset(x, y + dy);
            for px in self.data[d..d + block_len * CHANNELS].chunks_exact_mut(CHANNELS) {
                px.copy_from_slice(&rgb);
            }
        }
        true
    }

    /// Apply `f` to every channel byte of a `block_len × block_len` window.
    ///
    /// Returns `false` when the window does not fit.
    pub fn map_block(
        &mut self,
        block_len: usize,
        x: usize,
        y: usize,
        mut f: impl FnMut(u8) -> u8,
    ) -> bool {
        if !self.fits_block(block_len, x, y) {
            return false;
        }
        for dy in 0..block_len {
            let d = self.offset(x, y + dy);
            for c in &mut self.data[d..d + block_len * CHANNELS] {
                *c = f(*c);
            }
        }
        true
    }

    /// Return a copy padded by `buffer_px` on every side, with the original centered.
    ///
    /// Padding is filled with [`BLEED_SENTINEL_RGB`]; border pixels are never wrapped or clamped.
    pub fn bleeded_copy(&self, buffer_px: u32) -> Frame {
        let mut out = Frame::filled(
            self.width + 2 * buffer_px,
            self.height + 2 * buffer_px,
            BLEED_SENTINEL_RGB,
        );
        let row = self.stride();
        let b = buffer_px as usize;
        for y in 0..self.height as usize {
            let s = self.offset(0, y);
            let d = out.offset(b, y + b);
            out.data[d..d + row].copy_from_slice(&self.data[s..s + row]);
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/buffer.rs"]
mod tests;
