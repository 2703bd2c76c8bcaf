// LSB-first bit reader for DEFLATE.
// Holds one byte of lookahead; leftover bits survive IDAT chunk hops
// because the underlying source already hides chunk boundaries.

use crate::error::Error;
use crate::source::ByteSource;

pub struct BitReader<R> {
    inner: R,
    // unconsumed bits live in the low end of `buf`
    buf: u8,
    count: u8,
}

impl<R: ByteSource> BitReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: 0,
            count: 0,
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Read `n` bits (at most 32), first bit read ends up in bit 0.
    pub fn read_bits(&mut self, n: u8) -> Result<u32, Error> {
        debug_assert!(n <= 32);
        let mut value = 0u32;
        let mut got = 0u8;
        while got < n {
            if self.count == 0 {
                let mut byte = [0u8; 1];
                self.inner.read_exact(&mut byte)?;
                self.buf = byte[0];
                self.count = 8;
            }
            let take = (n - got).min(self.count);
            let mask = ((1u16 << take) - 1) as u8;
            value |= ((self.buf & mask) as u32) << got;
            // take may be 8; shift in u16 to stay in range
            self.buf = ((self.buf as u16) >> take) as u8;
            self.count -= take;
            got += take;
        }
        Ok(value)
    }

    #[inline]
    pub fn read_bit(&mut self) -> Result<bool, Error> {
        Ok(self.read_bits(1)? == 1)
    }

    /// Drop the bits left in the current byte.
    pub fn align(&mut self) {
        self.buf = 0;
        self.count = 0;
    }

    /// Read whole bytes starting at the next byte boundary.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        self.align();
        self.inner.read_exact(buf)
    }
}
