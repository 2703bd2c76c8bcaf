// Byte sources for the streaming decoder.
// The decoder only ever reads forward: exact reads plus relative skips
// over chunks it does not care about. Nothing is buffered here; a source
// backed by SD or flash is read straight into the decoder's buffers.

use crate::error::Error;

/// Sequential, forward-seekable byte stream.
pub trait ByteSource {
    /// Fill `buf` completely or fail with [`Error::Read`].
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Error>;

    /// Advance `n` bytes without looking at them.
    fn skip(&mut self, mut n: usize) -> Result<(), Error> {
        let mut trash = [0u8; 64];
        while n > 0 {
            let chunk = n.min(trash.len());
            self.read_exact(&mut trash[..chunk]).map_err(|_| Error::Seek)?;
            n -= chunk;
        }
        Ok(())
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        (**self).read_exact(buf)
    }

    fn skip(&mut self, n: usize) -> Result<(), Error> {
        (**self).skip(n)
    }
}

/// PNG held entirely in memory.
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl ByteSource for SliceSource<'_> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        let end = self.pos.checked_add(buf.len()).ok_or(Error::Read)?;
        let src = self.data.get(self.pos..end).ok_or(Error::Read)?;
        buf.copy_from_slice(src);
        self.pos = end;
        Ok(())
    }

    fn skip(&mut self, n: usize) -> Result<(), Error> {
        match self.pos.checked_add(n) {
            Some(end) if end <= self.data.len() => {
                self.pos = end;
                Ok(())
            }
            _ => Err(Error::Seek),
        }
    }
}

/// PNG stored at `[offset, offset + len)` of some larger medium, read
/// through a positional read callback (SD card file, flash partition,
/// stored ZIP entry). The callback may return short reads; zero means EOF.
pub struct FnSource<F> {
    read_fn: F,
    offset: u32,
    end: u32,
}

impl<F, E> FnSource<F>
where
    F: FnMut(u32, &mut [u8]) -> Result<usize, E>,
{
    pub fn new(read_fn: F, offset: u32, len: u32) -> Self {
        Self {
            read_fn,
            offset,
            end: offset.saturating_add(len),
        }
    }
}

impl<F, E> ByteSource for FnSource<F>
where
    F: FnMut(u32, &mut [u8]) -> Result<usize, E>,
{
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        let mut done = 0usize;
        while done < buf.len() {
            if self.offset >= self.end {
                return Err(Error::Read);
            }
            let remaining = (self.end - self.offset) as usize;
            let want = (buf.len() - done).min(remaining);
            let n = (self.read_fn)(self.offset, &mut buf[done..done + want])
                .map_err(|_| Error::Read)?;
            if n == 0 {
                return Err(Error::Read);
            }
            self.offset += n as u32;
            done += n;
        }
        Ok(())
    }

    fn skip(&mut self, n: usize) -> Result<(), Error> {
        let n32 = u32::try_from(n).map_err(|_| Error::Seek)?;
        match self.offset.checked_add(n32) {
            Some(next) if next <= self.end => {
                self.offset = next;
                Ok(())
            }
            _ => Err(Error::Seek),
        }
    }
}

/// Any `std::io` reader that can also seek, e.g. a `File`.
#[cfg(feature = "std")]
pub struct IoSource<R> {
    inner: R,
}

#[cfg(feature = "std")]
impl<R: std::io::Read + std::io::Seek> IoSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[cfg(feature = "std")]
impl<R: std::io::Read + std::io::Seek> ByteSource for IoSource<R> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        self.inner.read_exact(buf).map_err(|_| Error::Read)
    }

    fn skip(&mut self, n: usize) -> Result<(), Error> {
        let n = i64::try_from(n).map_err(|_| Error::Seek)?;
        self.inner
            .seek(std::io::SeekFrom::Current(n))
            .map(|_| ())
            .map_err(|_| Error::Seek)
    }
}
