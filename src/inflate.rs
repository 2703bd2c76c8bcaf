// zlib/DEFLATE decompressor (RFC 1950, RFC 1951), pull-based.
// The caller asks for exactly N bytes (one filtered scanline); the
// state machine decodes just enough symbols to satisfy it. A match may
// produce more than was asked for; the surplus waits in the window and is
// handed out first on the next request.
// Peak RAM: window (<= 32KB, sized from the zlib header) + two alphabets
// (<= 4 bytes per used symbol) + 320 bytes of code lengths on the stack.

use alloc::vec::Vec;

use crate::bits::BitReader;
use crate::error::{Buffer, Error};
use crate::huffman::Alphabet;
use crate::source::ByteSource;

// smallest window we allocate; one maximal match (258 bytes) must fit
// unread in the ring next to the history it was copied from
pub const MIN_WINDOW: usize = 512;

const MAX_LIT_CODES: usize = 288;
const MAX_DIST_CODES: usize = 32;

const END_OF_BLOCK: u16 = 256;

// length symbols 257..=285
const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258,
];
const LENGTH_EXTRA: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

// distance symbols 0..=29
const DIST_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];
const DIST_EXTRA: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

// order in which code-length code lengths are transmitted
const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

const FIXED_LIT_LENGTHS: [u8; MAX_LIT_CODES] = fixed_lit_lengths();
const FIXED_DIST_LENGTHS: [u8; MAX_DIST_CODES] = [5; MAX_DIST_CODES];

const fn fixed_lit_lengths() -> [u8; MAX_LIT_CODES] {
    let mut l = [0u8; MAX_LIT_CODES];
    let mut i = 0;
    while i < MAX_LIT_CODES {
        l[i] = match i {
            0..=143 => 8,
            144..=255 => 9,
            256..=279 => 7,
            _ => 8,
        };
        i += 1;
    }
    l
}

const ADLER_MOD: u32 = 65_521;

/// Running Adler-32 (RFC 1950 §8).
#[derive(Debug, Clone, Copy)]
pub struct Adler32 {
    a: u32,
    b: u32,
}

impl Default for Adler32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Adler32 {
    pub const fn new() -> Self {
        Self { a: 1, b: 0 }
    }

    #[inline]
    pub fn update(&mut self, byte: u8) {
        self.a += byte as u32;
        if self.a >= ADLER_MOD {
            self.a -= ADLER_MOD;
        }
        self.b += self.a;
        if self.b >= ADLER_MOD {
            self.b -= ADLER_MOD;
        }
    }

    pub fn update_slice(&mut self, data: &[u8]) {
        for &b in data {
            self.update(b);
        }
    }

    pub const fn value(&self) -> u32 {
        (self.b << 16) | self.a
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    // zlib CMF/FLG
    Header,
    // BFINAL + BTYPE
    BlockHeader,
    Stored { remaining: u16 },
    Codes,
    BlockEnd,
    // Adler-32 after the final block
    Trailer,
    Done,
}

/// Inflate session state: window, cursors, alphabets and block state.
pub struct Inflater {
    state: State,
    last_block: bool,
    window: Vec<u8>,
    // next write position in `window`
    write: usize,
    // decoded bytes not handed out yet; they end at `write`
    pending: usize,
    // bytes produced since the start of the stream (saturating)
    produced: usize,
    lit: Alphabet,
    dist: Alphabet,
    adler: Adler32,
    strict_checksum: bool,
}

impl Default for Inflater {
    fn default() -> Self {
        Self::new()
    }
}

impl Inflater {
    pub const fn new() -> Self {
        Self {
            state: State::Header,
            last_block: false,
            window: Vec::new(),
            write: 0,
            pending: 0,
            produced: 0,
            lit: Alphabet::new(),
            dist: Alphabet::new(),
            adler: Adler32::new(),
            strict_checksum: false,
        }
    }

    /// Fail on an Adler-32 mismatch instead of logging it.
    pub fn set_strict_checksum(&mut self, strict: bool) {
        self.strict_checksum = strict;
    }

    /// Window size in bytes, 0 before the zlib header has been read.
    pub fn window_size(&self) -> usize {
        self.window.len()
    }

    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// Fill `out` completely with decompressed bytes.
    pub fn read<R: ByteSource>(
        &mut self,
        bits: &mut BitReader<R>,
        out: &mut [u8],
    ) -> Result<(), Error> {
        let mut filled = self.drain(out);
        while filled < out.len() {
            if matches!(self.state, State::Trailer | State::Done) {
                return Err(Error::UnexpectedEndOfStream);
            }
            self.step(bits)?;
            filled += self.drain(&mut out[filled..]);
        }
        Ok(())
    }

    /// Run the stream to its end and check the trailer. Output nobody
    /// asked for is dropped.
    pub fn finish<R: ByteSource>(&mut self, bits: &mut BitReader<R>) -> Result<(), Error> {
        let mut surplus = self.pending;
        self.pending = 0;
        while self.state != State::Done {
            self.step(bits)?;
            surplus += self.pending;
            self.pending = 0;
        }
        if surplus > 0 {
            log::warn!("png: {} bytes of surplus image data ignored", surplus);
        }
        Ok(())
    }

    // hand out pending bytes in stream order
    fn drain(&mut self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.pending);
        if n == 0 {
            return 0;
        }
        let mask = self.window.len() - 1;
        let mut rd = (self.write + self.window.len() - self.pending) & mask;
        for b in &mut out[..n] {
            *b = self.window[rd];
            rd = (rd + 1) & mask;
        }
        self.pending -= n;
        n
    }

    #[inline]
    fn push(&mut self, byte: u8) {
        self.window[self.write] = byte;
        self.write = (self.write + 1) & (self.window.len() - 1);
        self.pending += 1;
        self.produced = self.produced.saturating_add(1);
        self.adler.update(byte);
    }

    // advance the state machine by one unit of work; only called with
    // nothing pending, so a single match always fits in the window
    fn step<R: ByteSource>(&mut self, bits: &mut BitReader<R>) -> Result<(), Error> {
        match self.state {
            State::Header => self.zlib_header(bits),
            State::BlockHeader => self.block_header(bits),
            State::Stored { remaining } => self.stored(bits, remaining),
            State::Codes => self.symbol(bits),
            State::BlockEnd => {
                self.state = if self.last_block {
                    State::Trailer
                } else {
                    State::BlockHeader
                };
                Ok(())
            }
            State::Trailer => self.trailer(bits),
            State::Done => Err(Error::UnexpectedEndOfStream),
        }
    }

    fn zlib_header<R: ByteSource>(&mut self, bits: &mut BitReader<R>) -> Result<(), Error> {
        let mut hdr = [0u8; 2];
        bits.read_bytes(&mut hdr)?;
        let (cmf, flg) = (hdr[0], hdr[1]);

        if cmf & 0x0f != 8 {
            return Err(Error::ZlibMethod);
        }
        let cinfo = cmf >> 4;
        if cinfo > 7 {
            return Err(Error::WindowSize);
        }
        if flg & 0x20 != 0 {
            return Err(Error::PresetDictionary);
        }
        if (u16::from(cmf) << 8 | u16::from(flg)) % 31 != 0 {
            return Err(Error::ZlibHeaderCheck);
        }

        let declared = 1usize << (cinfo + 8);
        let size = declared.max(MIN_WINDOW);
        self.window.clear();
        self.window
            .try_reserve_exact(size)
            .map_err(|_| Error::OutOfMemory(Buffer::Window))?;
        self.window.resize(size, 0);
        self.write = 0;
        self.pending = 0;

        log::debug!("png: zlib window {} bytes (declared {})", size, declared);
        self.state = State::BlockHeader;
        Ok(())
    }

    fn block_header<R: ByteSource>(&mut self, bits: &mut BitReader<R>) -> Result<(), Error> {
        let hdr = bits.read_bits(3)?;
        self.last_block = hdr & 1 == 1;
        match hdr >> 1 {
            0 => {
                bits.align();
                let mut len = [0u8; 4];
                bits.read_bytes(&mut len)?;
                let n = u16::from_le_bytes([len[0], len[1]]);
                let nn = u16::from_le_bytes([len[2], len[3]]);
                if n != !nn {
                    return Err(Error::StoredLength);
                }
                log::debug!("png: stored block, {} bytes", n);
                self.state = State::Stored { remaining: n };
            }
            1 => {
                self.lit.build(&FIXED_LIT_LENGTHS)?;
                self.dist.build(&FIXED_DIST_LENGTHS)?;
                self.state = State::Codes;
            }
            2 => {
                self.dynamic_tables(bits)?;
                self.state = State::Codes;
            }
            _ => return Err(Error::BlockType),
        }
        Ok(())
    }

    fn stored<R: ByteSource>(&mut self, bits: &mut BitReader<R>, remaining: u16) -> Result<(), Error> {
        if remaining == 0 {
            self.state = State::BlockEnd;
            return Ok(());
        }
        // straight into the window, up to the wrap point
        let n = (remaining as usize).min(self.window.len() - self.write);
        let start = self.write;
        bits.read_bytes(&mut self.window[start..start + n])?;
        self.adler.update_slice(&self.window[start..start + n]);
        self.write = (start + n) & (self.window.len() - 1);
        self.pending += n;
        self.produced = self.produced.saturating_add(n);
        self.state = State::Stored {
            remaining: remaining - n as u16,
        };
        Ok(())
    }

    fn dynamic_tables<R: ByteSource>(&mut self, bits: &mut BitReader<R>) -> Result<(), Error> {
        let hlit = bits.read_bits(5)? as usize + 257;
        let hdist = bits.read_bits(5)? as usize + 1;
        let hclen = bits.read_bits(4)? as usize + 4;

        let mut cl_lengths = [0u8; 19];
        for &sym in &CODE_LENGTH_ORDER[..hclen] {
            cl_lengths[sym] = bits.read_bits(3)? as u8;
        }
        // the literal alphabet doubles as the code-length alphabet
        self.lit.build(&cl_lengths)?;

        let total = hlit + hdist;
        let mut lengths = [0u8; MAX_LIT_CODES + MAX_DIST_CODES];
        let mut i = 0usize;
        while i < total {
            let sym = self.lit.decode(bits)?;
            let (value, repeat) = match sym {
                0..=15 => (sym as u8, 1),
                16 => {
                    if i == 0 {
                        return Err(Error::RepeatWithoutPrevious);
                    }
                    (lengths[i - 1], 3 + bits.read_bits(2)? as usize)
                }
                17 => (0, 3 + bits.read_bits(3)? as usize),
                _ => (0, 11 + bits.read_bits(7)? as usize),
            };
            if i + repeat > total {
                return Err(Error::LengthsOverflow);
            }
            lengths[i..i + repeat].fill(value);
            i += repeat;
        }

        self.lit.build(&lengths[..hlit])?;
        self.dist.build(&lengths[hlit..total])?;
        log::debug!("png: dynamic block, {} lit / {} dist codes", hlit, hdist);
        Ok(())
    }

    // decode one literal, end-of-block, or length/distance pair
    fn symbol<R: ByteSource>(&mut self, bits: &mut BitReader<R>) -> Result<(), Error> {
        let sym = self.lit.decode(bits)?;
        if sym < END_OF_BLOCK {
            self.push(sym as u8);
            return Ok(());
        }
        if sym == END_OF_BLOCK {
            self.state = State::BlockEnd;
            return Ok(());
        }

        let idx = (sym - 257) as usize;
        if idx >= LENGTH_BASE.len() {
            return Err(Error::LengthCode);
        }
        let length = LENGTH_BASE[idx] as usize + bits.read_bits(LENGTH_EXTRA[idx])? as usize;

        let dsym = self.dist.decode(bits)? as usize;
        if dsym >= DIST_BASE.len() {
            return Err(Error::DistanceCode);
        }
        let distance = DIST_BASE[dsym] as usize + bits.read_bits(DIST_EXTRA[dsym])? as usize;
        if distance > self.window.len() || distance > self.produced {
            return Err(Error::DistanceTooFar);
        }

        // byte by byte: source and destination may overlap
        let mask = self.window.len() - 1;
        let mut src = (self.write + self.window.len() - distance) & mask;
        for _ in 0..length {
            let b = self.window[src];
            self.push(b);
            src = (src + 1) & mask;
        }
        Ok(())
    }

    fn trailer<R: ByteSource>(&mut self, bits: &mut BitReader<R>) -> Result<(), Error> {
        let mut sum = [0u8; 4];
        bits.read_bytes(&mut sum)?;
        let expected = u32::from_be_bytes(sum);
        let actual = self.adler.value();
        if expected != actual {
            if self.strict_checksum {
                return Err(Error::Checksum);
            }
            log::warn!(
                "png: Adler-32 mismatch (stored {:08x}, computed {:08x})",
                expected,
                actual
            );
        }
        self.state = State::Done;
        Ok(())
    }
}
