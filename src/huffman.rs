//! Canonical Huffman alphabets (RFC 1951 §3.2.2).
//!
//! An [`Alphabet`] is a flat list of `(length, code, symbol)` entries,
//! shortest codes first. Codes are stored bit-reversed so they can be
//! compared directly against the LSB-first value coming out of
//! [`BitReader`]. Matching is a linear scan; alphabets are at most 288
//! entries and the table costs 4 bytes per used symbol.

use alloc::vec::Vec;

use crate::bits::BitReader;
use crate::error::{Buffer, Error};
use crate::source::ByteSource;

/// Longest code DEFLATE can describe.
pub const MAX_CODE_LEN: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Code {
    pub len: u8,
    /// Code bits in stream order (first bit in bit 0).
    pub bits: u16,
    pub symbol: u16,
}

#[derive(Default)]
pub struct Alphabet {
    codes: Vec<Code>,
}

impl Alphabet {
    pub const fn new() -> Self {
        Self { codes: Vec::new() }
    }

    pub fn codes(&self) -> &[Code] {
        &self.codes
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Rebuild from per-symbol code lengths (0 = unused). The previous
    /// allocation is reused when it is large enough.
    pub fn build(&mut self, lengths: &[u8]) -> Result<(), Error> {
        let mut bl_count = [0u16; MAX_CODE_LEN + 1];
        for &len in lengths {
            bl_count[len as usize] += 1;
        }
        bl_count[0] = 0;

        let used: usize = bl_count.iter().map(|&n| n as usize).sum();

        let mut next_code = [0u16; MAX_CODE_LEN + 1];
        let mut code = 0u16;
        for bits in 1..=MAX_CODE_LEN {
            code = code.wrapping_add(bl_count[bits - 1]) << 1;
            next_code[bits] = code;
        }

        self.codes.clear();
        self.codes
            .try_reserve_exact(used)
            .map_err(|_| Error::OutOfMemory(Buffer::Codes))?;

        // walking lengths in the outer loop yields entries already sorted
        // by (length, code): canonical codes rise with the symbol index
        for len in 1..=MAX_CODE_LEN as u8 {
            if bl_count[len as usize] == 0 {
                continue;
            }
            for (symbol, _) in lengths.iter().enumerate().filter(|(_, l)| **l == len) {
                let code = next_code[len as usize];
                next_code[len as usize] = code.wrapping_add(1);
                self.codes.push(Code {
                    len,
                    bits: reverse(code, len),
                    symbol: symbol as u16,
                });
            }
        }
        Ok(())
    }

    /// Match the next symbol in the stream.
    pub fn decode<R: ByteSource>(&self, bits: &mut BitReader<R>) -> Result<u16, Error> {
        let mut value = 0u16;
        let mut have = 0u8;
        for code in &self.codes {
            if code.len > have {
                value |= (bits.read_bits(code.len - have)? as u16) << have;
                have = code.len;
            }
            if code.bits == value {
                return Ok(code.symbol);
            }
        }
        Err(Error::CodeNotFound)
    }
}

// reverse the low `len` bits of `code`
#[inline]
fn reverse(code: u16, len: u8) -> u16 {
    code.reverse_bits() >> (16 - len as u32)
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::source::SliceSource;

    // undo the bit reversal to get the conventional MSB-first code
    fn msb_code(c: &Code) -> u16 {
        reverse(c.bits, c.len)
    }

    fn is_prefix(a: &Code, b: &Code) -> bool {
        a.len <= b.len && (msb_code(b) >> (b.len - a.len)) == msb_code(a)
    }

    fn assert_prefix_free(lengths: &[u8]) {
        let mut a = Alphabet::new();
        a.build(lengths).unwrap();

        let used = lengths.iter().filter(|&&l| l != 0).count();
        assert_eq!(a.codes().len(), used);
        for (sym, &len) in lengths.iter().enumerate() {
            let hits = a.codes().iter().filter(|c| c.symbol as usize == sym).count();
            assert_eq!(hits, (len != 0) as usize, "symbol {}", sym);
        }
        for (i, x) in a.codes().iter().enumerate() {
            for (j, y) in a.codes().iter().enumerate() {
                if i != j {
                    assert!(!is_prefix(x, y), "{:?} prefixes {:?}", x, y);
                }
            }
        }
        for w in a.codes().windows(2) {
            assert!(w[0].len <= w[1].len);
        }
    }

    #[test]
    fn rfc1951_example() {
        // ABCDEFGH with lengths 3,3,3,3,3,2,4,4
        let mut a = Alphabet::new();
        a.build(&[3, 3, 3, 3, 3, 2, 4, 4]).unwrap();
        let mut by_symbol = a.codes().to_vec();
        by_symbol.sort_by_key(|c| c.symbol);
        let msb: vec::Vec<u16> = by_symbol.iter().map(msb_code).collect();
        assert_eq!(msb, [0b010, 0b011, 0b100, 0b101, 0b110, 0b00, 0b1110, 0b1111]);
        assert_eq!(a.codes()[0].symbol, 5);
    }

    #[test]
    fn prefix_free_fixed_tables() {
        let mut lit = [0u8; 288];
        lit[..144].fill(8);
        lit[144..256].fill(9);
        lit[256..280].fill(7);
        lit[280..].fill(8);
        assert_prefix_free(&lit);
        assert_prefix_free(&[5u8; 32]);
    }

    #[test]
    fn prefix_free_sparse() {
        assert_prefix_free(&[0, 1, 0, 2, 3, 0, 3]);
        assert_prefix_free(&[1]);
        assert_prefix_free(&[0, 0, 0]);
        let mut deep = [0u8; 19];
        for (i, l) in deep.iter_mut().enumerate().take(15) {
            *l = (i + 1) as u8;
        }
        deep[15] = 15;
        assert_prefix_free(&deep);
    }

    #[test]
    fn decode_from_stream() {
        // lengths 2,1,3,3: B=0, A=10, C=110, D=111 (MSB-first)
        let mut a = Alphabet::new();
        a.build(&[2, 1, 3, 3]).unwrap();
        // stream B A D C, codes sent MSB-first: 0 | 1,0 | 1,1,1 | 1,1,0
        // packed from bit 0 upwards: byte0 = 0b1111_1010, byte1 = 0
        let data = [0b1111_1010, 0b0000_0000];
        let mut br = BitReader::new(SliceSource::new(&data));
        assert_eq!(a.decode(&mut br).unwrap(), 1);
        assert_eq!(a.decode(&mut br).unwrap(), 0);
        assert_eq!(a.decode(&mut br).unwrap(), 3);
        assert_eq!(a.decode(&mut br).unwrap(), 2);
    }

    #[test]
    fn empty_alphabet_never_matches() {
        let mut a = Alphabet::new();
        a.build(&[0; 30]).unwrap();
        assert!(a.is_empty());
        let data = [0u8; 2];
        let mut br = BitReader::new(SliceSource::new(&data));
        assert_eq!(a.decode(&mut br), Err(Error::CodeNotFound));
    }
}
