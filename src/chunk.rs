// PNG container layer: signature, chunk headers, chunk seeking.
// Chunk CRCs are skipped, never checked.
// Once positioned inside image data the reader is itself a ByteSource
// whose reads run across consecutive IDAT chunks.

use core::fmt;

use crate::error::Error;
use crate::source::ByteSource;

pub const PNG_SIG: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

pub const IHDR_LEN: u32 = 13;
pub const PLTE_MAX_LEN: u32 = 256 * 3;

const CRC_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    Header,
    Palette,
    ImageData,
    End,
    Other,
}

impl ChunkKind {
    // prefix match on the 4-byte tag
    pub fn classify(tag: [u8; 4]) -> Self {
        match tag {
            [b'I', b'H', b'D', b'R'] => ChunkKind::Header,
            [b'I', b'D', b'A', b'T'] => ChunkKind::ImageData,
            [b'I', b'E', b'N', b'D'] => ChunkKind::End,
            [b'P', b'L', b'T', b'E'] => ChunkKind::Palette,
            _ => ChunkKind::Other,
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkKind::Header => write!(f, "IHDR"),
            ChunkKind::Palette => write!(f, "PLTE"),
            ChunkKind::ImageData => write!(f, "IDAT"),
            ChunkKind::End => write!(f, "IEND"),
            ChunkKind::Other => write!(f, "ancillary"),
        }
    }
}

/// Chunk-aware reader over a raw PNG byte source.
pub struct ChunkReader<S> {
    src: S,
    // payload bytes of the current chunk not consumed yet
    remaining: u32,
    // None until the first header has been read
    kind: Option<ChunkKind>,
}

impl<S: ByteSource> ChunkReader<S> {
    pub fn new(src: S) -> Self {
        Self {
            src,
            remaining: 0,
            kind: None,
        }
    }

    /// Kind of the chunk the reader is positioned in.
    pub fn kind(&self) -> Option<ChunkKind> {
        self.kind
    }

    /// Payload bytes left in the current chunk.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn into_inner(self) -> S {
        self.src
    }

    /// Consume and verify the 8-byte PNG signature.
    pub fn read_signature(&mut self) -> Result<(), Error> {
        let mut sig = [0u8; 8];
        self.src.read_exact(&mut sig)?;
        if sig != PNG_SIG {
            return Err(Error::Signature);
        }
        Ok(())
    }

    /// Read the next 8-byte chunk header and enforce the length rules for
    /// IHDR and PLTE. The previous chunk must have been fully consumed.
    pub fn read_header(&mut self) -> Result<ChunkKind, Error> {
        let mut hdr = [0u8; 8];
        self.src.read_exact(&mut hdr)?;
        let len = u32::from_be_bytes([hdr[0], hdr[1], hdr[2], hdr[3]]);
        let kind = ChunkKind::classify([hdr[4], hdr[5], hdr[6], hdr[7]]);

        self.remaining = len;
        self.kind = Some(kind);

        match kind {
            ChunkKind::Header if len != IHDR_LEN => Err(Error::Header),
            ChunkKind::Palette if len < 3 || len > PLTE_MAX_LEN || len % 3 != 0 => {
                Err(Error::Palette)
            }
            _ => Ok(kind),
        }
    }

    /// Skip the rest of the current chunk (payload and CRC) and the
    /// chunks that follow until one of `wanted` kind starts.
    pub fn seek(&mut self, wanted: ChunkKind) -> Result<(), Error> {
        loop {
            if self.kind.is_some() {
                let n = (self.remaining as usize)
                    .checked_add(CRC_LEN)
                    .ok_or(Error::Seek)?;
                self.src.skip(n)?;
                self.remaining = 0;
            }
            let kind = self.read_header()?;
            if kind == wanted {
                return Ok(());
            }
            if kind == ChunkKind::End {
                return Err(Error::MissingChunk(wanted));
            }
            log::debug!("png: skipping {} chunk ({} bytes)", kind, self.remaining);
        }
    }

    /// Read from the current chunk's payload only; never crosses into the
    /// next chunk.
    pub fn read_payload(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        if buf.len() > self.remaining as usize {
            return Err(Error::Read);
        }
        self.src.read_exact(buf)?;
        self.remaining -= buf.len() as u32;
        Ok(())
    }
}

impl<S: ByteSource> ByteSource for ChunkReader<S> {
    // image data view: hop to the next IDAT whenever the current one runs dry;
    // running into IEND here means the compressed stream was cut short
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        let mut done = 0usize;
        while done < buf.len() {
            if self.remaining == 0 {
                self.seek(ChunkKind::ImageData).map_err(|e| match e {
                    Error::MissingChunk(ChunkKind::ImageData) => Error::UnexpectedEndOfStream,
                    other => other,
                })?;
                continue;
            }
            let n = (buf.len() - done).min(self.remaining as usize);
            self.src.read_exact(&mut buf[done..done + n])?;
            self.remaining -= n as u32;
            done += n;
        }
        Ok(())
    }
}
