//! In-memory RGB565 bitmap the renderer draws into and display sinks present.

use std::convert::Infallible;

use embedded_graphics::pixelcolor::raw::{RawData, RawU16};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PointsIter, Rectangle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<Rgb565>,
}

impl Frame {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb565::BLACK; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb565> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    pub fn pixels(&self) -> &[Rgb565] {
        &self.pixels
    }

    /// Row-major little-endian RGB565, the layout of a 16bpp Linux framebuffer.
    pub fn to_rgb565_le(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|c| RawU16::from(*c).into_inner().to_le_bytes())
            .collect()
    }

    /// True when every pixel inside `area` has `color`.
    pub fn is_filled(&self, area: Rectangle, color: Rgb565) -> bool {
        area.intersection(&self.bounding_box())
            .points()
            .all(|p| self.pixel(p.x as u32, p.y as u32) == Some(color))
    }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Frame {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Ok((x, y)) = <(u32, u32)>::try_from(point) {
                if x < self.width && y < self.height {
                    self.pixels[(y * self.width + x) as usize] = color;
                }
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        if area.is_zero_sized() {
            return Ok(());
        }
        let x0 = area.top_left.x as usize;
        let w = area.size.width as usize;
        for y in area.rows() {
            let start = y as usize * self.width as usize + x0;
            self.pixels[start..start + w].fill(color);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_frame_is_black() {
        let frame = Frame::new(4, 3);
        assert_eq!(frame.pixels().len(), 12);
        assert!(frame.is_filled(frame.bounding_box(), Rgb565::BLACK));
        assert_eq!(frame.pixel(4, 0), None);
    }

    #[test]
    fn test_fill_solid_is_clipped() {
        let mut frame = Frame::new(10, 10);
        let area = Rectangle::new(Point::new(8, 8), Size::new(5, 5));
        frame.fill_solid(&area, Rgb565::WHITE).unwrap();
        assert_eq!(frame.pixel(9, 9), Some(Rgb565::WHITE));
        assert_eq!(frame.pixel(7, 9), Some(Rgb565::BLACK));
        assert!(frame.is_filled(area, Rgb565::WHITE));
    }

    #[test]
    fn test_out_of_bounds_pixels_are_dropped() {
        let mut frame = Frame::new(2, 2);
        frame
            .draw_iter([
                Pixel(Point::new(-1, 0), Rgb565::RED),
                Pixel(Point::new(1, 1), Rgb565::RED),
                Pixel(Point::new(2, 0), Rgb565::RED),
            ])
            .unwrap();
        assert_eq!(frame.pixel(1, 1), Some(Rgb565::RED));
        assert_eq!(frame.pixel(0, 0), Some(Rgb565::BLACK));
    }

    #[test]
    fn test_rgb565_le_layout() {
        let mut frame = Frame::new(2, 1);
        frame
            .draw_iter([Pixel(Point::new(1, 0), Rgb565::WHITE)])
            .unwrap();
        assert_eq!(frame.to_rgb565_le(), vec![0x00, 0x00, 0xFF, 0xFF]);
    }
}
