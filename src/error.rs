// Decoder error taxonomy.
// Every failure is fatal for the image being decoded; kind() separates
// bad data from I/O trouble and from heap exhaustion.

use core::fmt;

use crate::chunk::ChunkKind;

/// Working buffer whose allocation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Buffer {
    Image,
    Alpha,
    Palette,
    Scanline,
    Codes,
    Window,
}

impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Buffer::Image => write!(f, "image"),
            Buffer::Alpha => write!(f, "alpha channel"),
            Buffer::Palette => write!(f, "palette"),
            Buffer::Scanline => write!(f, "scanline"),
            Buffer::Codes => write!(f, "huffman codes"),
            Buffer::Window => write!(f, "inflate window"),
        }
    }
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The byte source could not be opened, read or seeked.
    Io,
    /// The container is malformed or describes an unsupported image.
    Format,
    /// The compressed stream or the filtered scanlines are corrupt.
    Corrupt,
    /// A working buffer could not be allocated.
    OutOfMemory,
}

/// Everything that can stop a decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    OutOfMemory(Buffer),

    Open,
    Read,
    Seek,

    Signature,
    Header,
    Dimensions,
    BitDepth,
    ColourType,
    CompressionMethod,
    FilterMethod,
    InterlaceMethod,
    Palette,
    MissingChunk(ChunkKind),

    FilterType(u8),
    ZlibMethod,
    WindowSize,
    PresetDictionary,
    ZlibHeaderCheck,
    BlockType,
    StoredLength,
    RepeatWithoutPrevious,
    LengthCode,
    DistanceCode,
    DistanceTooFar,
    LengthsOverflow,
    CodeNotFound,
    UnexpectedEndOfStream,
    Checksum,
}

impl Error {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::OutOfMemory(_) => ErrorKind::OutOfMemory,
            Error::Open | Error::Read | Error::Seek => ErrorKind::Io,
            Error::Signature
            | Error::Header
            | Error::Dimensions
            | Error::BitDepth
            | Error::ColourType
            | Error::CompressionMethod
            | Error::FilterMethod
            | Error::InterlaceMethod
            | Error::Palette
            | Error::MissingChunk(_) => ErrorKind::Format,
            Error::FilterType(_)
            | Error::ZlibMethod
            | Error::WindowSize
            | Error::PresetDictionary
            | Error::ZlibHeaderCheck
            | Error::BlockType
            | Error::StoredLength
            | Error::RepeatWithoutPrevious
            | Error::LengthCode
            | Error::DistanceCode
            | Error::DistanceTooFar
            | Error::LengthsOverflow
            | Error::CodeNotFound
            | Error::UnexpectedEndOfStream
            | Error::Checksum => ErrorKind::Corrupt,
        }
    }

    /// Small negative result code for hosts that pass plain integers
    /// across an FFI or syscall boundary. Success is 0 and never produced
    /// here.
    pub const fn code(&self) -> i8 {
        match self {
            Error::OutOfMemory(Buffer::Image) => -1,
            Error::OutOfMemory(Buffer::Alpha) => -2,
            Error::OutOfMemory(Buffer::Palette) => -3,
            Error::OutOfMemory(Buffer::Scanline) => -4,
            Error::OutOfMemory(Buffer::Codes) => -5,
            Error::OutOfMemory(Buffer::Window) => -6,
            Error::Open => -7,
            Error::Read => -8,
            Error::Seek => -9,
            Error::Signature => -10,
            Error::Header => -11,
            Error::Dimensions => -12,
            Error::BitDepth => -13,
            Error::ColourType => -14,
            Error::CompressionMethod => -15,
            Error::FilterMethod => -16,
            Error::FilterType(_) => -17,
            Error::InterlaceMethod => -18,
            Error::Palette => -19,
            Error::BlockType => -20,
            Error::PresetDictionary => -21,
            Error::ZlibMethod => -22,
            Error::WindowSize => -23,
            Error::StoredLength => -24,
            Error::RepeatWithoutPrevious => -25,
            Error::LengthCode => -26,
            Error::DistanceCode => -27,
            Error::LengthsOverflow => -28,
            Error::CodeNotFound => -29,
            Error::MissingChunk(_) => -30,
            Error::DistanceTooFar => -31,
            Error::ZlibHeaderCheck => -32,
            Error::UnexpectedEndOfStream => -33,
            Error::Checksum => -34,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OutOfMemory(buf) => write!(f, "png: out of memory for {}", buf),
            Error::Open => write!(f, "png: cannot open source"),
            Error::Read => write!(f, "png: read failed"),
            Error::Seek => write!(f, "png: seek failed"),
            Error::Signature => write!(f, "png: invalid signature"),
            Error::Header => write!(f, "png: missing or invalid IHDR"),
            Error::Dimensions => write!(f, "png: width or height out of range"),
            Error::BitDepth => write!(f, "png: unsupported bit depth"),
            Error::ColourType => write!(f, "png: unsupported colour type"),
            Error::CompressionMethod => write!(f, "png: unknown compression method"),
            Error::FilterMethod => write!(f, "png: unknown filter method"),
            Error::InterlaceMethod => write!(f, "png: unknown interlace method"),
            Error::Palette => write!(f, "png: invalid PLTE"),
            Error::MissingChunk(kind) => write!(f, "png: no {} chunk before IEND", kind),
            Error::FilterType(t) => write!(f, "png: invalid filter type {}", t),
            Error::ZlibMethod => write!(f, "zlib: compression method is not DEFLATE"),
            Error::WindowSize => write!(f, "zlib: window size too large"),
            Error::PresetDictionary => write!(f, "zlib: preset dictionary not allowed"),
            Error::ZlibHeaderCheck => write!(f, "zlib: header check bits wrong"),
            Error::BlockType => write!(f, "inflate: invalid block type"),
            Error::StoredLength => write!(f, "inflate: stored block LEN/NLEN mismatch"),
            Error::RepeatWithoutPrevious => write!(f, "inflate: repeat code with no previous length"),
            Error::LengthCode => write!(f, "inflate: invalid length symbol"),
            Error::DistanceCode => write!(f, "inflate: invalid distance symbol"),
            Error::DistanceTooFar => write!(f, "inflate: distance reaches before stream start"),
            Error::LengthsOverflow => write!(f, "inflate: too many code lengths"),
            Error::CodeNotFound => write!(f, "inflate: no huffman code matches input"),
            Error::UnexpectedEndOfStream => write!(f, "inflate: stream ended before image data"),
            Error::Checksum => write!(f, "zlib: Adler-32 mismatch"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
