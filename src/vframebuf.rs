/*
 *  vframebuf.rs
 *
 *  forecast-widget - precipitation at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Runtime-sized framebuffer the graph is painted into
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
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::{PixelColor, Rgb888};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use std::path::Path;

use crate::error::RenderError;

/// A runtime-sized framebuffer for embedded-graphics.
#[derive(Debug, Clone, PartialEq)]
pub struct VarFrameBuf<C: PixelColor> {
    buf: Vec<C>,
    w: usize,
    h: usize,
}

impl<C: PixelColor> VarFrameBuf<C> {
    pub fn new(width: u32, height: u32, fill: C) -> Self {
        let (w, h) = (width as usize, height as usize);
        Self { buf: vec![fill; w * h], w, h }
    }

    pub fn width(&self) -> usize { self.w }
    pub fn height(&self) -> usize { self.h }

    /// Immutable raw access, row major
    pub fn as_slice(&self) -> &[C] { &self.buf }

    /// Clear to a color
    pub fn clear_color(&mut self, color: C) {
        self.buf.fill(color);
    }

    /// Pixel at (x,y); None if out of bounds
    pub fn pixel(&self, x: i32, y: i32) -> Option<C> {
        self.idx(Point::new(x, y)).map(|i| self.buf[i])
    }

    /// Map (x,y) to linear index; returns None if out of bounds
    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if p.x >= 0 && p.y >= 0 {
            let (x, y) = (p.x as usize, p.y as usize);
            if x < self.w && y < self.h {
                return Some(y * self.w + x);
            }
        }
        None
    }
}

impl VarFrameBuf<Rgb888> {
    /// Encode the frame as an opaque RGBA PNG.
    pub fn to_png(&self) -> Result<Vec<u8>, RenderError> {
        let mut pixmap = tiny_skia::Pixmap::new(self.w as u32, self.h as u32)
            .ok_or(RenderError::EmptyFrame(self.w as u32, self.h as u32))?;
        for (dst, src) in pixmap.pixels_mut().iter_mut().zip(self.buf.iter()) {
            // alpha is 255 so premultiplication is a no-op
            if let Some(px) = tiny_skia::PremultipliedColorU8::from_rgba(src.r(), src.g(), src.b(), 255) {
                *dst = px;
            }
        }
        pixmap.encode_png().map_err(|e| RenderError::Png(e.to_string()))
    }

    pub fn save_png(&self, path: &Path) -> Result<(), RenderError> {
        let bytes = self.to_png()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

impl<C: PixelColor> OriginDimensions for VarFrameBuf<C> {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl<C: PixelColor> DrawTarget for VarFrameBuf<C> {
    type Color = C;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if let Some(i) = self.idx(p) {
                self.buf[i] = c;
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.clear_color(color);
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        // rectangles routinely hang off the graph edges, clip before the row fill
        let area = area.intersection(&self.bounding_box());
        let Size { width, height } = area.size;
        if width == 0 || height == 0 { return Ok(()); }
        let (x0, y0) = (area.top_left.x as usize, area.top_left.y as usize);
        for row in y0..y0 + height as usize {
            let base = row * self.w + x0;
            self.buf[base..base + width as usize].fill(color);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    #[test]
    fn test_out_of_bounds_pixels_are_dropped() {
        let mut fb = VarFrameBuf::new(4, 3, Rgb888::BLACK);
        fb.draw_iter([Pixel(Point::new(-1, 0), Rgb888::RED), Pixel(Point::new(4, 2), Rgb888::RED)])
            .unwrap();
        assert!(fb.as_slice().iter().all(|c| *c == Rgb888::BLACK));
    }

    #[test]
    fn test_fill_solid_clips_to_frame() {
        let mut fb = VarFrameBuf::new(10, 4, Rgb888::BLACK);
        Rectangle::new(Point::new(8, -2), Size::new(6, 4))
            .into_styled(PrimitiveStyle::with_fill(Rgb888::WHITE))
            .draw(&mut fb)
            .unwrap();
        assert_eq!(fb.pixel(8, 0), Some(Rgb888::WHITE));
        assert_eq!(fb.pixel(9, 1), Some(Rgb888::WHITE));
        assert_eq!(fb.pixel(9, 2), Some(Rgb888::BLACK));
        // nothing wrapped onto the next row
        assert_eq!(fb.pixel(0, 1), Some(Rgb888::BLACK));
        assert_eq!(fb.pixel(0, 2), Some(Rgb888::BLACK));
    }

    #[test]
    fn test_png_export() {
        let fb = VarFrameBuf::new(8, 8, Rgb888::BLUE);
        let png = fb.to_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }

    #[test]
    fn test_empty_frame_is_not_exported() {
        let fb = VarFrameBuf::new(0, 8, Rgb888::BLUE);
        assert!(matches!(fb.to_png(), Err(RenderError::EmptyFrame(0, 8))));
    }
}
