// Decode orchestration: signature, IHDR, PLTE, then image data pulled one
// scanline at a time through the inflater, unfiltered, converted and
// scattered into the target image.
//
// Peak RAM beyond the image itself: two scanlines (<= 2041 bytes each),
// the inflate window and the Huffman tables.

use alloc::vec::Vec;

use crate::bits::BitReader;
use crate::chunk::{ChunkKind, ChunkReader, IHDR_LEN, PLTE_MAX_LEN};
use crate::error::{Buffer, Error};
use crate::filter::{FilterType, unfilter};
use crate::image::{Image, MAX_DIMENSION};
use crate::inflate::Inflater;
use crate::interlace::Interlace;
use crate::pixel::{Palette, PixelFormat};
use crate::source::{ByteSource, SliceSource};

/// Decoder limits and checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Widest image accepted; never more than 255.
    pub max_width: u32,
    pub max_height: u32,
    /// Treat a zlib Adler-32 mismatch as an error instead of a warning.
    pub strict_checksum: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_width: MAX_DIMENSION,
            max_height: MAX_DIMENSION,
            strict_checksum: false,
        }
    }
}

impl Config {
    fn clamped(self) -> Self {
        Self {
            max_width: self.max_width.min(MAX_DIMENSION),
            max_height: self.max_height.min(MAX_DIMENSION),
            ..self
        }
    }
}

/// Validated IHDR contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub width: u8,
    pub height: u8,
    pub bit_depth: u8,
    pub colour_type: u8,
    pub format: PixelFormat,
    pub interlace: Interlace,
}

impl Header {
    fn parse(raw: &[u8; IHDR_LEN as usize], config: &Config) -> Result<Self, Error> {
        let width = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]);
        let height = u32::from_be_bytes([raw[4], raw[5], raw[6], raw[7]]);
        let (bit_depth, colour_type) = (raw[8], raw[9]);

        if width == 0 || height == 0 || width > config.max_width || height > config.max_height {
            log::warn!("png: unsupported size {}x{}", width, height);
            return Err(Error::Dimensions);
        }
        if raw[10] != 0 {
            return Err(Error::CompressionMethod);
        }
        if raw[11] != 0 {
            return Err(Error::FilterMethod);
        }
        let interlace = Interlace::try_from(raw[12])?;
        let format = PixelFormat::from_header(colour_type, bit_depth)?;

        Ok(Self {
            width: width as u8,
            height: height as u8,
            bit_depth,
            colour_type,
            format,
            interlace,
        })
    }
}

/// One decode session over a PNG byte stream.
pub struct Decoder<S> {
    bits: BitReader<ChunkReader<S>>,
    inflater: Inflater,
    config: Config,
    header: Option<Header>,
}

impl<S: ByteSource> Decoder<S> {
    pub fn new(src: S) -> Self {
        Self::with_config(src, Config::default())
    }

    pub fn with_config(src: S, config: Config) -> Self {
        let config = config.clamped();
        let mut inflater = Inflater::new();
        inflater.set_strict_checksum(config.strict_checksum);
        Self {
            bits: BitReader::new(ChunkReader::new(src)),
            inflater,
            config,
            header: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read and validate the signature and IHDR. Later calls return the
    /// cached header without touching the source.
    pub fn read_header(&mut self) -> Result<Header, Error> {
        if let Some(header) = self.header {
            return Ok(header);
        }
        let chunks = self.bits.get_mut();
        chunks.read_signature()?;
        if chunks.read_header()? != ChunkKind::Header {
            return Err(Error::MissingChunk(ChunkKind::Header));
        }
        let mut raw = [0u8; IHDR_LEN as usize];
        chunks.read_payload(&mut raw)?;
        let header = Header::parse(&raw, &self.config)?;

        log::info!(
            "png: {}x{} {:?} {:?}",
            header.width,
            header.height,
            header.format,
            header.interlace
        );
        self.header = Some(header);
        Ok(header)
    }

    fn read_palette(&mut self) -> Result<Palette, Error> {
        let chunks = self.bits.get_mut();
        chunks.seek(ChunkKind::Palette)?;
        let len = chunks.remaining() as usize;
        let mut rgb = [0u8; PLTE_MAX_LEN as usize];
        chunks.read_payload(&mut rgb[..len])?;
        log::debug!("png: palette with {} entries", len / 3);
        Palette::from_rgb(&rgb[..len])
    }

    /// Decode the whole image. Nothing is returned on failure.
    pub fn decode(mut self) -> Result<Image, Error> {
        let header = self.read_header()?;
        let format = header.format;
        let (width, height) = (header.width as usize, header.height as usize);

        let palette = if format.is_indexed() {
            self.read_palette()?
        } else {
            Palette::new()
        };
        self.bits.get_mut().seek(ChunkKind::ImageData)?;

        let mut image = Image::alloc(header.width, header.height)?;
        // filter-type byte + widest row of any pass
        let row_len = format.row_bytes(width) + 1;
        let mut cur = scanline(row_len)?;
        let mut prev = scanline(row_len)?;
        let stride = format.stride();

        for (n, pass) in header.interlace.passes().iter().enumerate() {
            let (pw, ph) = (pass.width(width), pass.height(height));
            if pw == 0 || ph == 0 {
                log::debug!("png: pass {} empty", n + 1);
                continue;
            }
            log::debug!("png: pass {} is {}x{}", n + 1, pw, ph);

            let len = format.row_bytes(pw) + 1;
            prev[..len].fill(0);
            for j in 0..ph {
                let row = &mut cur[..len];
                self.inflater.read(&mut self.bits, row)?;
                let filter = FilterType::try_from(row[0])?;
                unfilter(filter, &mut row[1..], &prev[1..len], stride);
                for i in 0..pw {
                    let (x, y) = pass.position(i, j);
                    image.put(x, y, format.pixel(&row[1..], i, &palette));
                }
                core::mem::swap(&mut cur, &mut prev);
            }
        }

        self.inflater.finish(&mut self.bits)?;
        Ok(image)
    }
}

fn scanline(len: usize) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::OutOfMemory(Buffer::Scanline))?;
    buf.resize(len, 0);
    Ok(buf)
}

/// Decode a PNG from any byte source with the default configuration.
pub fn decode<S: ByteSource>(src: S) -> Result<Image, Error> {
    Decoder::new(src).decode()
}

/// Decode a PNG held in memory.
pub fn decode_slice(data: &[u8]) -> Result<Image, Error> {
    decode(SliceSource::new(data))
}

/// Open and decode a PNG file.
#[cfg(feature = "std")]
pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Image, Error> {
    let file = std::fs::File::open(path).map_err(|_| Error::Open)?;
    decode(crate::source::IoSource::new(std::io::BufReader::new(file)))
}
