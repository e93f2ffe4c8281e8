use std::io::{self, Error, ErrorKind, Read, Seek, SeekFrom};

/// A read-only view over the region `[base, base + length)` of a larger byte source.
///
/// Every extraction routine in this crate is built on windowed streams: an archive
/// hands out one window per entry, and the entry's bytes are read lazily through it
/// instead of buffering the whole container. The window seeks the underlying source
/// to `base + position` before every read, so several windows may share one source
/// (or cloned handles of one file) as long as they are used from a single thread.
pub struct WindowedStream<R> {
    /// The underlying byte source.
    source: R,
    /// The absolute offset of the window within the source.
    base: u64,
    /// The length of the window in bytes.
    length: u64,
    /// The current read position, relative to the start of the window.
    position: u64,
}

impl<R: Read + Seek> WindowedStream<R> {
    /// Creates a window over `[base, base + length)` of `source`.
    pub fn new(source: R, base: u64, length: u64) -> Self {
        WindowedStream {
            source,
            base,
            length,
            position: 0,
        }
    }

    /// Returns the length of the window in bytes.
    pub fn len(&self) -> u64 {
        self.length
    }

    /// Returns `true` if the window covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Consumes the window and returns the underlying source.
    pub fn into_inner(self) -> R {
        self.source
    }
}

impl<R: Read + Seek> Read for WindowedStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.position >= self.length {
            return Ok(0);
        }
        let remaining = self.length - self.position;
        let limit = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        self.source
            .seek(SeekFrom::Start(self.base + self.position))?;
        let consumed = self.source.read(&mut buf[..limit])?;
        self.position += consumed as u64;
        Ok(consumed)
    }
}

impl<R: Read + Seek> Seek for WindowedStream<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(offset) => i128::from(self.position) + i128::from(offset),
            SeekFrom::End(offset) => i128::from(self.length) + i128::from(offset),
        };
        if target < 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Seek before start of window",
            ));
        }
        self.position = u64::try_from(target)
            .map_err(|_| Error::new(ErrorKind::InvalidInput, "Seek out of range"))?;
        Ok(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_are_clamped_to_the_window() {
        let source = Cursor::new(b"0123456789".to_vec());
        let mut window = WindowedStream::new(source, 2, 5);

        let mut content = Vec::new();
        window.read_to_end(&mut content).unwrap();
        assert_eq!(content, b"23456");
    }

    #[test]
    fn windows_reseek_the_shared_source() {
        let source = Cursor::new(b"0123456789".to_vec());
        let mut window = WindowedStream::new(source, 4, 4);

        let mut buf = [0u8; 2];
        window.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"45");

        // Disturb the underlying cursor between reads.
        window.source.seek(SeekFrom::Start(0)).unwrap();
        window.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"67");
    }

    #[test]
    fn seek_is_bounds_checked() {
        let source = Cursor::new(b"0123456789".to_vec());
        let mut window = WindowedStream::new(source, 2, 5);

        assert!(window.seek(SeekFrom::Current(-1)).is_err());
        assert_eq!(window.seek(SeekFrom::End(-2)).unwrap(), 3);

        let mut content = Vec::new();
        window.read_to_end(&mut content).unwrap();
        assert_eq!(content, b"56");

        // Past-the-end positions are allowed and read nothing.
        window.seek(SeekFrom::Start(100)).unwrap();
        let mut buf = [0u8; 1];
        assert_eq!(window.read(&mut buf).unwrap(), 0);
    }
}
