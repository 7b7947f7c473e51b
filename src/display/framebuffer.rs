/*
 *  display/framebuffer.rs
 *
 *  KoMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  The single shared frame every render pass draws into
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use core::convert::Infallible;
use embedded_graphics::pixelcolor::{IntoStorage, Rgb565, Rgb888};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use crate::vframebuf::VarFrameBuf;

/// Full colour frame, allocated once per session and cleared between passes
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pixels: VarFrameBuf<Rgb888>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { pixels: VarFrameBuf::new(width, height, Rgb888::BLACK) }
    }

    /// Get dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.pixels.width() as u32, self.pixels.height() as u32)
    }

    /// Blank slate, black
    pub fn clear_frame(&mut self) {
        self.pixels.fill(Rgb888::BLACK);
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb888> {
        self.pixels.pixel(Point::new(x, y))
    }

    pub fn count(&self, color: Rgb888) -> usize {
        self.pixels.count(color)
    }

    pub fn as_slice(&self) -> &[Rgb888] {
        self.pixels.as_slice()
    }

    /// Pack to RGB565, little endian, two bytes per pixel
    ///
    /// This is the native layout of fbtft panels (ILI9341, ST7789 ...).
    pub fn to_rgb565_le(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.as_slice().len() * 2);
        for &px in self.pixels.as_slice() {
            let packed: Rgb565 = px.into();
            bytes.extend_from_slice(&packed.into_storage().to_le_bytes());
        }
        bytes
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        self.pixels.size()
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.pixels.draw_iter(pixels)
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        self.pixels.fill_solid(area, color)
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.pixels.clear(color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb565_packing() {
        let mut fb = FrameBuffer::new(2, 1);
        fb.draw_iter([Pixel(Point::new(0, 0), Rgb888::WHITE), Pixel(Point::new(1, 0), Rgb888::RED)])
            .unwrap();
        let bytes = fb.to_rgb565_le();
        assert_eq!(bytes.len(), 4);
        assert_eq!(&bytes[0..2], &[0xFF, 0xFF]);
        // red = 0b11111_000000_00000
        assert_eq!(&bytes[2..4], &[0x00, 0xF8]);
    }

    #[test]
    fn test_clear_frame() {
        let mut fb = FrameBuffer::new(8, 8);
        fb.fill_solid(&Rectangle::new(Point::zero(), Size::new(8, 8)), Rgb888::GREEN).unwrap();
        assert_eq!(fb.count(Rgb888::GREEN), 64);
        fb.clear_frame();
        assert_eq!(fb.count(Rgb888::BLACK), 64);
    }
}
