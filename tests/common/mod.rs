#![allow(dead_code)]

use smol_png::pixel::{PixelFormat, Rgba5658, rgb565};

pub const SIG: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

pub fn chunk(out: &mut Vec<u8>, tag: &[u8; 4], payload: &[u8]) {
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(tag);
    out.extend_from_slice(payload);
    out.extend_from_slice(&[0; 4]);
}

pub fn ihdr(width: u32, height: u32, depth: u8, colour: u8, interlace: u8) -> Vec<u8> {
    let mut h = Vec::with_capacity(13);
    h.extend_from_slice(&width.to_be_bytes());
    h.extend_from_slice(&height.to_be_bytes());
    h.extend_from_slice(&[depth, colour, 0, 0, interlace]);
    h
}

/// (tag, payload) pairs of a PNG file.
pub fn chunks(png: &[u8]) -> Vec<([u8; 4], Vec<u8>)> {
    assert_eq!(png[..8], SIG);
    let mut out = Vec::new();
    let mut pos = 8;
    while pos < png.len() {
        let len = u32::from_be_bytes(png[pos..pos + 4].try_into().unwrap()) as usize;
        let tag: [u8; 4] = png[pos + 4..pos + 8].try_into().unwrap();
        out.push((tag, png[pos + 8..pos + 8 + len].to_vec()));
        pos += 12 + len;
    }
    out
}

/// Rebuild a PNG with its zlib stream re-split into IDAT chunks of
/// `size` bytes, passing `extra` chunks through in front of the first one.
pub fn resplit(png: &[u8], size: usize, extra: &[([u8; 4], &[u8])]) -> Vec<u8> {
    let parts = chunks(png);
    let zlib: Vec<u8> = parts
        .iter()
        .filter(|(t, _)| t == b"IDAT")
        .flat_map(|(_, d)| d.iter().copied())
        .collect();

    let mut out = SIG.to_vec();
    for (tag, data) in &parts {
        match tag {
            b"IDAT" | b"IEND" => {}
            _ => chunk(&mut out, tag, data),
        }
    }
    for (tag, data) in extra {
        chunk(&mut out, tag, data);
    }
    for piece in zlib.chunks(size) {
        chunk(&mut out, b"IDAT", piece);
    }
    chunk(&mut out, b"IEND", &[]);
    out
}

/// Complete PNG from raw (already filtered) scanline data.
pub fn assemble(header: &[u8], palette: Option<&[u8]>, raw: &[u8]) -> Vec<u8> {
    let mut out = SIG.to_vec();
    chunk(&mut out, b"IHDR", header);
    if let Some(p) = palette {
        chunk(&mut out, b"PLTE", p);
    }
    chunk(&mut out, b"IDAT", &miniz_oxide::deflate::compress_to_vec_zlib(raw, 6));
    chunk(&mut out, b"IEND", &[]);
    out
}

pub struct Format {
    pub format: PixelFormat,
    pub colour: png::ColorType,
    pub depth: png::BitDepth,
}

pub fn all_formats() -> Vec<Format> {
    use PixelFormat::*;
    use png::BitDepth::*;
    use png::ColorType::*;
    [
        (Grey1, Grayscale, One),
        (Grey2, Grayscale, Two),
        (Grey4, Grayscale, Four),
        (Grey8, Grayscale, Eight),
        (Grey16, Grayscale, Sixteen),
        (Indexed1, Indexed, One),
        (Indexed2, Indexed, Two),
        (Indexed4, Indexed, Four),
        (Indexed8, Indexed, Eight),
        (Rgb8, Rgb, Eight),
        (Rgb16, Rgb, Sixteen),
        (GreyAlpha8, GrayscaleAlpha, Eight),
        (GreyAlpha16, GrayscaleAlpha, Sixteen),
        (Rgba8, Rgba, Eight),
        (Rgba16, Rgba, Sixteen),
    ]
    .into_iter()
    .map(|(format, colour, depth)| Format {
        format,
        colour,
        depth,
    })
    .collect()
}

/// Deterministic test picture: sample values per pixel plus the packed
/// unfiltered scanlines and the pixels the decoder should produce.
pub struct Picture {
    pub width: usize,
    pub height: usize,
    pub rows: Vec<Vec<u8>>,
    pub expected: Vec<Rgba5658>,
    pub palette: Vec<u8>,
}

fn sample(x: usize, y: usize, c: usize, depth: u8) -> u16 {
    let v = (x * 37 + y * 101 + c * 59) ^ (x * y * 3);
    let max = if depth == 16 { 0xffff } else { (1u32 << depth) - 1 };
    ((v as u32 * 2654) % (max + 1)) as u16
}

fn to8(v: u16, depth: u8) -> u8 {
    match depth {
        16 => (v >> 8) as u8,
        8 => v as u8,
        d => (v as u32 * 255 / ((1 << d) - 1)) as u8,
    }
}

pub fn palette_rgb(entries: usize) -> Vec<u8> {
    (0..entries)
        .flat_map(|i| [(i * 53) as u8, (i * 151 + 7) as u8, (255 - i) as u8])
        .collect()
}

pub fn picture(format: PixelFormat, width: usize, height: usize) -> Picture {
    let depth = format.bit_depth();
    let samples = format.samples() as usize;
    let palette = if format.is_indexed() {
        palette_rgb(1 << depth.min(8))
    } else {
        Vec::new()
    };

    let mut rows = Vec::new();
    let mut expected = Vec::new();
    for y in 0..height {
        let mut bits = BitPacker::default();
        for x in 0..width {
            let s: Vec<u16> = (0..samples).map(|c| sample(x, y, c, depth)).collect();
            for &v in &s {
                bits.push(v, depth);
            }
            let c: Vec<u8> = s.iter().map(|&v| to8(v, depth)).collect();
            let px = match samples {
                _ if format.is_indexed() => {
                    let p = &palette[s[0] as usize * 3..s[0] as usize * 3 + 3];
                    Rgba5658::opaque(rgb565(p[0], p[1], p[2]))
                }
                1 => Rgba5658::opaque(rgb565(c[0], c[0], c[0])),
                2 => Rgba5658 {
                    rgb565: rgb565(c[0], c[0], c[0]),
                    alpha: c[1],
                },
                3 => Rgba5658::opaque(rgb565(c[0], c[1], c[2])),
                _ => Rgba5658 {
                    rgb565: rgb565(c[0], c[1], c[2]),
                    alpha: c[3],
                },
            };
            expected.push(px);
        }
        rows.push(bits.finish());
    }
    Picture {
        width,
        height,
        rows,
        expected,
        palette,
    }
}

impl Picture {
    pub fn data(&self) -> Vec<u8> {
        self.rows.concat()
    }

    /// Encode with the reference encoder.
    pub fn encode(&self, f: &Format, filter: Option<png::FilterType>) -> Vec<u8> {
        let mut out = Vec::new();
        let mut enc = png::Encoder::new(&mut out, self.width as u32, self.height as u32);
        enc.set_color(f.colour);
        enc.set_depth(f.depth);
        if !self.palette.is_empty() {
            enc.set_palette(self.palette.clone());
        }
        match filter {
            Some(filter) => enc.set_filter(filter),
            None => enc.set_adaptive_filter(png::AdaptiveFilterType::Adaptive),
        }
        let mut writer = enc.write_header().unwrap();
        writer.write_image_data(&self.data()).unwrap();
        writer.finish().unwrap();
        out
    }
}

#[derive(Default)]
struct BitPacker {
    out: Vec<u8>,
    acc: u8,
    n: u8,
}

impl BitPacker {
    fn push(&mut self, v: u16, depth: u8) {
        match depth {
            16 => self.out.extend_from_slice(&v.to_be_bytes()),
            8 => self.out.push(v as u8),
            d => {
                self.acc |= (v as u8) << (8 - d - self.n);
                self.n += d;
                if self.n == 8 {
                    self.out.push(self.acc);
                    self.acc = 0;
                    self.n = 0;
                }
            }
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.n > 0 {
            self.out.push(self.acc);
        }
        self.out
    }
}

pub fn assert_pixels(img: &smol_png::Image, expected: &[Rgba5658], what: &str) {
    assert_eq!(img.pixels().len(), expected.len(), "{}", what);
    for (i, want) in expected.iter().enumerate() {
        let x = (i % img.width() as usize) as u8;
        let y = (i / img.width() as usize) as u8;
        assert_eq!(img.pixel(x, y), Some(*want), "{} at ({}, {})", what, x, y);
    }
}
