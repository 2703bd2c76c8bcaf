// Scanline unfiltering for PNG filter method 0.
// Operates on the row bytes after the leading filter-type byte; the
// previous row is all zeroes for the first row of every pass.

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FilterType {
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    Paeth = 4,
}

impl TryFrom<u8> for FilterType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FilterType::None),
            1 => Ok(FilterType::Sub),
            2 => Ok(FilterType::Up),
            3 => Ok(FilterType::Average),
            4 => Ok(FilterType::Paeth),
            other => Err(Error::FilterType(other)),
        }
    }
}

/// Reverse `filter` in place. `stride` is the distance in bytes to the
/// corresponding byte of the pixel on the left (at least 1).
pub fn unfilter(filter: FilterType, row: &mut [u8], prev: &[u8], stride: usize) {
    debug_assert_eq!(row.len(), prev.len());
    let len = row.len();
    let stride = stride.max(1);
    match filter {
        FilterType::None => {}
        FilterType::Sub => {
            for i in stride..len {
                row[i] = row[i].wrapping_add(row[i - stride]);
            }
        }
        FilterType::Up => {
            for (x, &b) in row.iter_mut().zip(prev) {
                *x = x.wrapping_add(b);
            }
        }
        FilterType::Average => {
            for i in 0..len {
                let a = if i >= stride { row[i - stride] as u16 } else { 0 };
                let b = prev[i] as u16;
                row[i] = row[i].wrapping_add(((a + b) >> 1) as u8);
            }
        }
        FilterType::Paeth => {
            for i in 0..len {
                let (a, c) = if i >= stride {
                    (row[i - stride], prev[i - stride])
                } else {
                    (0, 0)
                };
                row[i] = row[i].wrapping_add(paeth(a, prev[i], c));
            }
        }
    }
}

/// Paeth predictor: whichever of left, above, upper-left is closest to
/// `left + above - upper_left`, ties resolved in that order.
#[inline]
pub fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).unsigned_abs();
    let pb = (p - b as i16).unsigned_abs();
    let pc = (p - c as i16).unsigned_abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}
