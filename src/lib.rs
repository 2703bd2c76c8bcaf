// Streaming PNG decoder for small devices: RGB565 + 8-bit alpha output,
// images up to 255x255, heap use bounded by the image plus a few KB.
//
// source     byte sources (slice, read callback, std::io)
// chunk      signature, chunk headers, IDAT continuation
// bits       LSB-first bit reader
// huffman    canonical Huffman alphabets
// inflate    zlib/DEFLATE state machine, Adler-32
// filter     scanline unfiltering
// pixel      pixel formats and RGB565 conversion
// interlace  Adam7 pass geometry
// image      decoded image, embedded-graphics drawing
// decoder    orchestration and configuration

#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod bits;
pub mod chunk;
pub mod decoder;
pub mod error;
pub mod filter;
pub mod huffman;
pub mod image;
pub mod inflate;
pub mod interlace;
pub mod pixel;
pub mod source;

pub use decoder::{Config, Decoder, Header, decode, decode_slice};
#[cfg(feature = "std")]
pub use decoder::load;
pub use error::{Error, ErrorKind};
pub use image::Image;
pub use pixel::Rgba5658;
#[cfg(feature = "std")]
pub use source::IoSource;
pub use source::{ByteSource, FnSource, SliceSource};
