use std::io;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;

pub trait ReadSeekExt: Read + Seek {
    fn peek_bytes<const N: usize>(&mut self) -> io::Result<([u8; N], usize)>;

    fn stream_len(&mut self) -> io::Result<u64>;
}

impl<T> ReadSeekExt for T
where
    T: Read + Seek,
{
    /// Reads up to `N` bytes from the reader without advancing its position.
    ///
    /// Returns the buffer together with the number of bytes actually available,
    /// which is smaller than `N` when the source ends early.
    fn peek_bytes<const N: usize>(&mut self) -> io::Result<([u8; N], usize)> {
        let pos = self.stream_position()?;
        let mut buf = [0u8; N];
        let mut filled = 0;
        while filled < N {
            let n = self.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        self.seek(SeekFrom::Start(pos))?;
        Ok((buf, filled))
    }

    /// Returns the total length of the stream, leaving its position untouched.
    fn stream_len(&mut self) -> io::Result<u64> {
        let pos = self.stream_position()?;
        let len = self.seek(SeekFrom::End(0))?;
        self.seek(SeekFrom::Start(pos))?;
        Ok(len)
    }
}
