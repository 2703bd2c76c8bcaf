// Decoded image: RGB565 plane plus an 8-bit alpha plane, row-major.
// With the `embedded-graphics` feature it draws straight onto any
// Rgb565 DrawTarget; fully transparent pixels are left untouched.

use alloc::vec::Vec;

use crate::error::{Buffer, Error};
use crate::pixel::Rgba5658;

/// Largest width or height this decoder will produce.
pub const MAX_DIMENSION: u32 = 255;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u8,
    height: u8,
    pixels: Vec<u16>,
    alpha: Vec<u8>,
}

impl Image {
    // both planes zeroed: transparent black until written
    pub(crate) fn alloc(width: u8, height: u8) -> Result<Self, Error> {
        let n = width as usize * height as usize;

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(n)
            .map_err(|_| Error::OutOfMemory(Buffer::Image))?;
        pixels.resize(n, 0);

        let mut alpha = Vec::new();
        alpha
            .try_reserve_exact(n)
            .map_err(|_| Error::OutOfMemory(Buffer::Alpha))?;
        alpha.resize(n, 0);

        Ok(Self {
            width,
            height,
            pixels,
            alpha,
        })
    }

    #[inline]
    pub(crate) fn put(&mut self, x: usize, y: usize, px: Rgba5658) {
        let i = y * self.width as usize + x;
        self.pixels[i] = px.rgb565;
        self.alpha[i] = px.alpha;
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// RGB565 values, `width * height`, row-major.
    pub fn pixels(&self) -> &[u16] {
        &self.pixels
    }

    /// Opacity per pixel (0 transparent, 255 opaque).
    pub fn alpha(&self) -> &[u8] {
        &self.alpha
    }

    pub fn pixel(&self, x: u8, y: u8) -> Option<Rgba5658> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = y as usize * self.width as usize + x as usize;
        Some(Rgba5658 {
            rgb565: self.pixels[i],
            alpha: self.alpha[i],
        })
    }

    pub fn into_parts(self) -> (Vec<u16>, Vec<u8>) {
        (self.pixels, self.alpha)
    }
}

#[cfg(feature = "embedded-graphics")]
mod draw {
    use embedded_graphics_core::{
        Pixel,
        draw_target::DrawTarget,
        geometry::{Dimensions, OriginDimensions, Point, Size},
        image::ImageDrawable,
        pixelcolor::{Rgb565, raw::RawU16},
        primitives::Rectangle,
    };

    use super::Image;

    impl OriginDimensions for Image {
        fn size(&self) -> Size {
            Size::new(self.width as u32, self.height as u32)
        }
    }

    impl Image {
        // pixels of `area` (clipped to the image) shifted by -`origin`,
        // transparent ones skipped
        fn visible(&self, area: Rectangle, origin: Point) -> impl Iterator<Item = Pixel<Rgb565>> + '_ {
            let area = area.intersection(&Rectangle::new(Point::zero(), self.size()));
            let w = self.width as usize;
            let (x0, y0) = (area.top_left.x, area.top_left.y);
            let (x1, y1) = (x0 + area.size.width as i32, y0 + area.size.height as i32);
            (y0..y1).flat_map(move |y| {
                (x0..x1).filter_map(move |x| {
                    let i = y as usize * w + x as usize;
                    if self.alpha[i] == 0 {
                        return None;
                    }
                    let colour = Rgb565::from(RawU16::new(self.pixels[i]));
                    Some(Pixel(Point::new(x, y) - origin, colour))
                })
            })
        }
    }

    impl ImageDrawable for Image {
        type Color = Rgb565;

        fn draw<D>(&self, target: &mut D) -> Result<(), D::Error>
        where
            D: DrawTarget<Color = Self::Color>,
        {
            target.draw_iter(self.visible(self.bounding_box(), Point::zero()))
        }

        fn draw_sub_image<D>(&self, target: &mut D, area: &Rectangle) -> Result<(), D::Error>
        where
            D: DrawTarget<Color = Self::Color>,
        {
            target.draw_iter(self.visible(*area, area.top_left))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> Image {
        let mut img = Image::alloc(3, 2).unwrap();
        for y in 0..2 {
            for x in 0..3 {
                let v = (y * 3 + x) as u16;
                // odd pixels fully transparent
                let alpha = if v % 2 == 0 { 0xff } else { 0 };
                img.put(x, y, Rgba5658 { rgb565: v, alpha });
            }
        }
        img
    }

    #[test]
    fn alloc_zeroed() {
        let img = Image::alloc(4, 3).unwrap();
        assert_eq!(img.pixels().len(), 12);
        assert!(img.alpha().iter().all(|&a| a == 0));
    }

    #[test]
    fn put_and_get() {
        let img = checker();
        assert_eq!(img.pixel(2, 1), Some(Rgba5658 { rgb565: 5, alpha: 0 }));
        assert_eq!(img.pixel(0, 1), Some(Rgba5658 { rgb565: 3, alpha: 0 }));
        assert_eq!(img.pixel(1, 1), Some(Rgba5658::opaque(4)));
        assert_eq!(img.pixel(3, 0), None);
        let (pixels, alpha) = img.into_parts();
        assert_eq!(pixels, [0, 1, 2, 3, 4, 5]);
        assert_eq!(alpha, [0xff, 0, 0xff, 0, 0xff, 0]);
    }

    #[cfg(feature = "embedded-graphics")]
    mod draw {
        use alloc::vec::Vec;

        use embedded_graphics_core::{
            Pixel,
            draw_target::DrawTarget,
            geometry::{OriginDimensions, Point, Size},
            image::ImageDrawable,
            pixelcolor::{IntoStorage, Rgb565},
            primitives::Rectangle,
        };

        use super::checker;

        #[derive(Default)]
        struct Recorder {
            drawn: Vec<(i32, i32, u16)>,
        }

        impl OriginDimensions for Recorder {
            fn size(&self) -> Size {
                Size::new(16, 16)
            }
        }

        impl DrawTarget for Recorder {
            type Color = Rgb565;
            type Error = core::convert::Infallible;

            fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
            where
                I: IntoIterator<Item = Pixel<Self::Color>>,
            {
                for Pixel(p, c) in pixels {
                    self.drawn.push((p.x, p.y, c.into_storage()));
                }
                Ok(())
            }
        }

        #[test]
        fn draw_skips_transparent() {
            let img = checker();
            assert_eq!(img.size(), Size::new(3, 2));
            let mut target = Recorder::default();
            img.draw(&mut target).unwrap();
            assert_eq!(target.drawn, [(0, 0, 0), (2, 0, 2), (1, 1, 4)]);
        }

        #[test]
        fn sub_image_is_relative_and_clipped() {
            let img = checker();
            let mut target = Recorder::default();
            let area = Rectangle::new(Point::new(1, 0), Size::new(5, 5));
            img.draw_sub_image(&mut target, &area).unwrap();
            assert_eq!(target.drawn, [(1, 0, 2), (0, 1, 4)]);
        }
    }
}
