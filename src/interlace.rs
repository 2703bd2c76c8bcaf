// Interlace pass scheduling.
// Non-interlaced images are one pass covering every pixel; Adam7 is seven
// sub-images, each filtered and scanned as an independent image.

use crate::error::Error;

/// One pass: origin and step of the sub-image inside the full image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pass {
    pub x0: u8,
    pub y0: u8,
    pub dx: u8,
    pub dy: u8,
}

impl Pass {
    /// Sub-image width for an image `w` pixels wide.
    pub const fn width(&self, w: usize) -> usize {
        sub_len(w, self.x0 as usize, self.dx as usize)
    }

    pub const fn height(&self, h: usize) -> usize {
        sub_len(h, self.y0 as usize, self.dy as usize)
    }

    /// Full-image coordinates of sub-image pixel `(i, j)`.
    #[inline]
    pub const fn position(&self, i: usize, j: usize) -> (usize, usize) {
        (
            self.x0 as usize + i * self.dx as usize,
            self.y0 as usize + j * self.dy as usize,
        )
    }
}

const fn sub_len(len: usize, start: usize, step: usize) -> usize {
    if len > start {
        (len - start).div_ceil(step)
    } else {
        0
    }
}

pub const PROGRESSIVE: [Pass; 1] = [Pass { x0: 0, y0: 0, dx: 1, dy: 1 }];

pub const ADAM7: [Pass; 7] = [
    Pass { x0: 0, y0: 0, dx: 8, dy: 8 },
    Pass { x0: 4, y0: 0, dx: 8, dy: 8 },
    Pass { x0: 0, y0: 4, dx: 4, dy: 8 },
    Pass { x0: 2, y0: 0, dx: 4, dy: 4 },
    Pass { x0: 0, y0: 2, dx: 2, dy: 4 },
    Pass { x0: 1, y0: 0, dx: 2, dy: 2 },
    Pass { x0: 0, y0: 1, dx: 1, dy: 2 },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interlace {
    None,
    Adam7,
}

impl TryFrom<u8> for Interlace {
    type Error = Error;

    fn try_from(method: u8) -> Result<Self, Self::Error> {
        match method {
            0 => Ok(Interlace::None),
            1 => Ok(Interlace::Adam7),
            _ => Err(Error::InterlaceMethod),
        }
    }
}

impl Interlace {
    pub const fn passes(self) -> &'static [Pass] {
        match self {
            Interlace::None => &PROGRESSIVE,
            Interlace::Adam7 => &ADAM7,
        }
    }
}
