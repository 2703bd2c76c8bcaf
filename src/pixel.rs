// Sample extraction and RGB565 + alpha quantisation.
// One PixelFormat is chosen from (colour type, bit depth) when the header
// is parsed and used unchanged for every scanline of the image.

use alloc::vec::Vec;

use crate::error::{Buffer, Error};

pub const COLOR_GREYSCALE: u8 = 0;
pub const COLOR_RGB: u8 = 2;
pub const COLOR_PALETTE: u8 = 3;
pub const COLOR_GREY_ALPHA: u8 = 4;
pub const COLOR_RGBA: u8 = 6;

/// Decoded pixel: RGB565 colour plus 8-bit opacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba5658 {
    pub rgb565: u16,
    pub alpha: u8,
}

impl Rgba5658 {
    pub const TRANSPARENT: Self = Self { rgb565: 0, alpha: 0 };

    #[inline]
    pub const fn opaque(rgb565: u16) -> Self {
        Self {
            rgb565,
            alpha: 0xff,
        }
    }
}

/// Quantise 8-bit channels to RGB565.
#[inline]
pub const fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3)
}

#[inline]
const fn grey565(v: u8) -> u16 {
    rgb565(v, v, v)
}

/// Every valid PNG (colour type, bit depth) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Grey1,
    Grey2,
    Grey4,
    Grey8,
    Grey16,
    Indexed1,
    Indexed2,
    Indexed4,
    Indexed8,
    Rgb8,
    Rgb16,
    GreyAlpha8,
    GreyAlpha16,
    Rgba8,
    Rgba16,
}

impl PixelFormat {
    pub fn from_header(colour_type: u8, bit_depth: u8) -> Result<Self, Error> {
        use PixelFormat::*;
        let format = match (colour_type, bit_depth) {
            (COLOR_GREYSCALE, 1) => Grey1,
            (COLOR_GREYSCALE, 2) => Grey2,
            (COLOR_GREYSCALE, 4) => Grey4,
            (COLOR_GREYSCALE, 8) => Grey8,
            (COLOR_GREYSCALE, 16) => Grey16,
            (COLOR_PALETTE, 1) => Indexed1,
            (COLOR_PALETTE, 2) => Indexed2,
            (COLOR_PALETTE, 4) => Indexed4,
            (COLOR_PALETTE, 8) => Indexed8,
            (COLOR_RGB, 8) => Rgb8,
            (COLOR_RGB, 16) => Rgb16,
            (COLOR_GREY_ALPHA, 8) => GreyAlpha8,
            (COLOR_GREY_ALPHA, 16) => GreyAlpha16,
            (COLOR_RGBA, 8) => Rgba8,
            (COLOR_RGBA, 16) => Rgba16,
            (COLOR_GREYSCALE | COLOR_RGB | COLOR_PALETTE | COLOR_GREY_ALPHA | COLOR_RGBA, _) => {
                return Err(Error::BitDepth);
            }
            _ => return Err(Error::ColourType),
        };
        Ok(format)
    }

    pub const fn bit_depth(self) -> u8 {
        use PixelFormat::*;
        match self {
            Grey1 | Indexed1 => 1,
            Grey2 | Indexed2 => 2,
            Grey4 | Indexed4 => 4,
            Grey8 | Indexed8 | Rgb8 | GreyAlpha8 | Rgba8 => 8,
            Grey16 | Rgb16 | GreyAlpha16 | Rgba16 => 16,
        }
    }

    pub const fn samples(self) -> u8 {
        use PixelFormat::*;
        match self {
            Grey1 | Grey2 | Grey4 | Grey8 | Grey16 => 1,
            Indexed1 | Indexed2 | Indexed4 | Indexed8 => 1,
            GreyAlpha8 | GreyAlpha16 => 2,
            Rgb8 | Rgb16 => 3,
            Rgba8 | Rgba16 => 4,
        }
    }

    pub const fn is_indexed(self) -> bool {
        matches!(
            self,
            PixelFormat::Indexed1 | PixelFormat::Indexed2 | PixelFormat::Indexed4 | PixelFormat::Indexed8
        )
    }

    pub const fn bits_per_pixel(self) -> usize {
        self.samples() as usize * self.bit_depth() as usize
    }

    /// Filter stride: bytes per complete pixel, 1 for sub-byte formats.
    pub const fn stride(self) -> usize {
        let bytes = self.bits_per_pixel() / 8;
        if bytes == 0 { 1 } else { bytes }
    }

    /// Unfiltered row length in bytes for `width` pixels, without the
    /// filter-type byte.
    pub const fn row_bytes(self, width: usize) -> usize {
        (width * self.bits_per_pixel()).div_ceil(8)
    }

    /// Convert pixel `x` of an unfiltered row.
    pub fn pixel(self, row: &[u8], x: usize, palette: &Palette) -> Rgba5658 {
        use PixelFormat::*;
        match self {
            Grey1 => Rgba5658::opaque(grey565(sub_byte(row, x, 1) * 0xff)),
            Grey2 => Rgba5658::opaque(grey565(sub_byte(row, x, 2) * 0x55)),
            Grey4 => Rgba5658::opaque(grey565(sub_byte(row, x, 4) * 0x11)),
            Grey8 => Rgba5658::opaque(grey565(row[x])),
            Grey16 => Rgba5658::opaque(grey565(row[x * 2])),

            Indexed1 => palette.get(sub_byte(row, x, 1)),
            Indexed2 => palette.get(sub_byte(row, x, 2)),
            Indexed4 => palette.get(sub_byte(row, x, 4)),
            Indexed8 => palette.get(row[x]),

            Rgb8 => {
                let p = &row[x * 3..x * 3 + 3];
                Rgba5658::opaque(rgb565(p[0], p[1], p[2]))
            }
            // high byte of each big-endian sample
            Rgb16 => {
                let p = &row[x * 6..x * 6 + 6];
                Rgba5658::opaque(rgb565(p[0], p[2], p[4]))
            }

            GreyAlpha8 => Rgba5658 {
                rgb565: grey565(row[x * 2]),
                alpha: row[x * 2 + 1],
            },
            GreyAlpha16 => Rgba5658 {
                rgb565: grey565(row[x * 4]),
                alpha: row[x * 4 + 2],
            },

            Rgba8 => {
                let p = &row[x * 4..x * 4 + 4];
                Rgba5658 {
                    rgb565: rgb565(p[0], p[1], p[2]),
                    alpha: p[3],
                }
            }
            Rgba16 => {
                let p = &row[x * 8..x * 8 + 8];
                Rgba5658 {
                    rgb565: rgb565(p[0], p[2], p[4]),
                    alpha: p[6],
                }
            }
        }
    }
}

// packed sample, leftmost pixel in the most significant bits
#[inline]
fn sub_byte(row: &[u8], x: usize, depth: u8) -> u8 {
    let per_byte = 8 / depth as usize;
    let shift = (per_byte - 1 - x % per_byte) * depth as usize;
    let mask = (1u8 << depth) - 1;
    (row[x / per_byte] >> shift) & mask
}

/// PLTE entries, pre-quantised to RGB565.
#[derive(Default)]
pub struct Palette {
    entries: Vec<u16>,
}

impl Palette {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build from raw RGB triples (length already validated as 3..=768,
    /// divisible by 3).
    pub fn from_rgb(rgb: &[u8]) -> Result<Self, Error> {
        let mut entries = Vec::new();
        entries
            .try_reserve_exact(rgb.len() / 3)
            .map_err(|_| Error::OutOfMemory(Buffer::Palette))?;
        entries.extend(rgb.chunks_exact(3).map(|c| rgb565(c[0], c[1], c[2])));
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Opaque palette colour; indices past the end give transparent black.
    #[inline]
    pub fn get(&self, index: u8) -> Rgba5658 {
        match self.entries.get(index as usize) {
            Some(&c) => Rgba5658::opaque(c),
            None => Rgba5658::TRANSPARENT,
        }
    }
}
