//! 1-bit framebuffer for monochrome OLED panels.
//!
//! The status view is drawn into this RAM buffer, then the whole buffer is
//! handed to the display driver in one push. Pixels are packed eight per
//! byte, row-major, most significant bit first, which is the layout most
//! monochrome panel drivers accept for a full-frame transfer.

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// Packed monochrome framebuffer implementing `DrawTarget<Color = BinaryColor>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    size: Size,
    stride: usize,
    bits: Vec<u8>,
}

impl FrameBuffer {
    /// Allocate a framebuffer with every pixel off.
    pub fn new(size: Size) -> Self {
        let stride = (size.width as usize).div_ceil(8);
        Self {
            size,
            stride,
            bits: vec![0; stride * size.height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Packed pixel data, `stride * height` bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    /// Whether the pixel at (`x`, `y`) is lit. Out-of-bounds pixels are off.
    pub fn is_on(&self, x: u32, y: u32) -> bool {
        if x >= self.size.width || y >= self.size.height {
            return false;
        }
        let (idx, mask) = self.locate(x as usize, y as usize);
        self.bits[idx] & mask != 0
    }

    pub fn is_blank(&self) -> bool {
        self.bits.iter().all(|&byte| byte == 0)
    }

    /// Number of lit pixels
    pub fn lit_pixels(&self) -> u32 {
        self.bits.iter().map(|byte| byte.count_ones()).sum()
    }

    #[inline]
    fn locate(&self, x: usize, y: usize) -> (usize, u8) {
        (y * self.stride + x / 8, 0x80 >> (x % 8))
    }

    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, color: BinaryColor) {
        let (idx, mask) = self.locate(x, y);
        if color.is_on() {
            self.bits[idx] |= mask;
        } else {
            self.bits[idx] &= !mask;
        }
    }

    /// Clip `area` to the buffer, returning `(x_start, y_start, x_end, y_end)`.
    fn clip(&self, area: &Rectangle) -> (usize, usize, usize, usize) {
        let w = i64::from(self.size.width);
        let h = i64::from(self.size.height);
        let x = i64::from(area.top_left.x);
        let y = i64::from(area.top_left.y);

        let x_start = x.clamp(0, w) as usize;
        let y_start = y.clamp(0, h) as usize;
        let x_end = (x + i64::from(area.size.width)).clamp(0, w) as usize;
        let y_end = (y + i64::from(area.size.height)).clamp(0, h) as usize;
        (x_start, y_start, x_end, y_end)
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        self.size
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let w = self.size.width as usize;
        let h = self.size.height as usize;

        for Pixel(coord, color) in pixels {
            let x = coord.x;
            let y = coord.y;
            if x >= 0 && y >= 0 && (x as usize) < w && (y as usize) < h {
                self.set_pixel(x as usize, y as usize, color);
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let (x_start, y_start, x_end, y_end) = self.clip(area);

        for y in y_start..y_end {
            for x in x_start..x_end {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let fill = if color.is_on() { 0xFF } else { 0x00 };
        self.bits.fill(fill);

        // Keep the unused bits of a partial last byte dark.
        let used = self.size.width as usize % 8;
        if color.is_on() && used != 0 {
            let mask = !(0xFFu8 >> used);
            for row in self.bits.chunks_mut(self.stride) {
                if let Some(last) = row.last_mut() {
                    *last &= mask;
                }
            }
        }
        Ok(())
    }
}
