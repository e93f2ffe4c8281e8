//! Reading and writing of NARC resource containers.
//!
//! A NARC file is an 8-byte signature and 16-byte header followed by three fixed
//! sections: FATB (allocation table of `(start, end)` pairs relative to the data
//! region), FNTB (directory table, always the minimal empty one here), and FIMG
//! (the concatenated entry data, each entry padded to a 4-byte boundary with
//! `0xFF`). Entry content is opaque bytes; decode order reproduces encode order.

use crate::error::TppkError;
use crate::ext::io_ext::ReadSeekExt;
use crate::file_type;
use crate::narc_archive_entry::NarcArchiveEntry;
use crate::windowed_stream::WindowedStream;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::{self, Cursor, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, trace};

const FATB_TAG: [u8; 4] = *b"BTAF";
const FNTB_TAG: [u8; 4] = *b"BTNF";
const FIMG_TAG: [u8; 4] = *b"GMIF";

/// Entry data is aligned to this boundary within the data region.
const DATA_ALIGNMENT: u64 = 4;

/// The header length and section count are fixed for every container we write.
const HEADER_LENGTH: u16 = 16;
const SECTION_COUNT: u16 = 3;

/// An opaque byte source of known length queued for packing into a NARC container.
pub struct NarcSource<'a> {
    length: u64,
    reader: Box<dyn Read + 'a>,
}

impl<'a> NarcSource<'a> {
    /// Creates a source from a reader of known length.
    pub fn new(length: u64, reader: impl Read + 'a) -> Self {
        NarcSource {
            length,
            reader: Box::new(reader),
        }
    }

    /// Creates a source over an in-memory buffer.
    pub fn from_bytes(bytes: Vec<u8>) -> NarcSource<'static> {
        NarcSource {
            length: bytes.len() as u64,
            reader: Box::new(Cursor::new(bytes)),
        }
    }

    /// Returns the declared length of the source in bytes.
    pub fn length(&self) -> u64 {
        self.length
    }
}

/// A decoded NARC container: an ordered entry table over an open byte source.
pub struct NarcArchive<R> {
    source: R,
    entries: Vec<NarcArchiveEntry>,
    /// Absolute offset of the data region, 8 bytes past the FIMG tag.
    data_offset: u64,
}

impl<R: Read + Seek> NarcArchive<R> {
    /// Parses the container tables from a source positioned at the container start.
    ///
    /// The stored total length must match the actual source length, and all three
    /// section tags must be present in order.
    pub fn read_from(mut source: R) -> Result<Self, TppkError> {
        let mut signature = [0u8; 8];
        source.read_exact(&mut signature)?;
        if signature != file_type::NARC_SIGNATURE {
            return Err(TppkError::InvalidFileType("not a NARC container".into()));
        }
        let total_length = source.read_u32::<LittleEndian>()?;
        if u64::from(total_length) != source.stream_len()? {
            return Err(TppkError::InvalidFileType(
                "NARC length field does not match the file size".into(),
            ));
        }
        let header_length = source.read_u16::<LittleEndian>()?;
        let _section_count = source.read_u16::<LittleEndian>()?;

        let fatb_position = u64::from(header_length);
        source.seek(SeekFrom::Start(fatb_position))?;
        let mut tag = [0u8; 4];
        source.read_exact(&mut tag)?;
        if tag != FATB_TAG {
            return Err(TppkError::InvalidFileType("missing FATB section".into()));
        }
        let fatb_length = source.read_u32::<LittleEndian>()?;
        let entry_count = source.read_u32::<LittleEndian>()?;

        let mut entries = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            let start = source.read_u32::<LittleEndian>()?;
            let end = source.read_u32::<LittleEndian>()?;
            let length = end.checked_sub(start).ok_or_else(|| {
                TppkError::InvalidFileType("FATB entry ends before it starts".into())
            })?;
            entries.push(NarcArchiveEntry::new(u64::from(start), u64::from(length)));
        }

        let fntb_position = fatb_position + u64::from(fatb_length);
        source.seek(SeekFrom::Start(fntb_position))?;
        source.read_exact(&mut tag)?;
        if tag != FNTB_TAG {
            return Err(TppkError::InvalidFileType("missing FNTB section".into()));
        }
        let fntb_length = source.read_u32::<LittleEndian>()?;

        let fimg_position = fntb_position + u64::from(fntb_length);
        source.seek(SeekFrom::Start(fimg_position))?;
        source.read_exact(&mut tag)?;
        if tag != FIMG_TAG {
            return Err(TppkError::InvalidFileType("missing FIMG section".into()));
        }
        let _fimg_length = source.read_u32::<LittleEndian>()?;
        trace!("parsed NARC container with {} entries", entries.len());

        Ok(NarcArchive {
            source,
            entries,
            data_offset: fimg_position + 8,
        })
    }

    /// Returns the number of entries in the container.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns the entries in table order.
    pub fn entries(&self) -> &[NarcArchiveEntry] {
        &self.entries
    }

    /// Returns a windowed stream over one entry's data.
    pub fn entry_stream(&mut self, index: usize) -> io::Result<WindowedStream<&mut R>> {
        let entry = *self
            .entries
            .get(index)
            .ok_or_else(|| io::Error::new(ErrorKind::NotFound, "Invalid entry index"))?;
        Ok(WindowedStream::new(
            &mut self.source,
            self.data_offset + entry.offset(),
            entry.length(),
        ))
    }
}

impl NarcArchive<File> {
    /// Opens and parses a NARC container from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TppkError> {
        let file = File::open(path)?;
        Self::read_from(file)
    }

    /// Returns an independent window over one entry, backed by a cloned file handle.
    ///
    /// Unlike [`Self::entry_stream`], several of these may be alive at once, which
    /// lets a container be re-encoded from its own entries.
    pub fn entry_reader(&self, index: usize) -> io::Result<WindowedStream<File>> {
        let entry = *self
            .entries
            .get(index)
            .ok_or_else(|| io::Error::new(ErrorKind::NotFound, "Invalid entry index"))?;
        let handle = self.source.try_clone()?;
        Ok(WindowedStream::new(
            handle,
            self.data_offset + entry.offset(),
            entry.length(),
        ))
    }
}

/// Writes a NARC container over `sources` to `output`.
///
/// FATB `(start, end)` pairs are relative to the data region; `end - start` is the
/// unpadded source length while the running offset advances in 4-byte-padded steps.
/// The total-length field is patched once every section has been written.
pub fn write_archive<W>(sources: &mut [NarcSource<'_>], mut output: W) -> Result<(), TppkError>
where
    W: Write + Seek,
{
    let entry_count = u32::try_from(sources.len())
        .map_err(|_| io::Error::new(ErrorKind::InvalidData, "Too many entries for a FATB table"))?;

    output.write_all(&file_type::NARC_SIGNATURE)?;
    output.write_u32::<LittleEndian>(0)?; // total length, patched below
    output.write_u16::<LittleEndian>(HEADER_LENGTH)?;
    output.write_u16::<LittleEndian>(SECTION_COUNT)?;

    output.write_all(&FATB_TAG)?;
    let fatb_length = u32::try_from(12 + 8 * u64::from(entry_count)).map_err(|_| {
        io::Error::new(ErrorKind::InvalidData, "Too many entries for a FATB table")
    })?;
    output.write_u32::<LittleEndian>(fatb_length)?;
    output.write_u32::<LittleEndian>(entry_count)?;

    let mut position: u64 = 0;
    for source in sources.iter() {
        let start = u32::try_from(position).map_err(|_| {
            io::Error::new(ErrorKind::InvalidData, "Archive exceeds the 32-bit offset limit")
        })?;
        let end = u32::try_from(position + source.length).map_err(|_| {
            io::Error::new(ErrorKind::InvalidData, "Archive exceeds the 32-bit offset limit")
        })?;
        output.write_u32::<LittleEndian>(start)?;
        output.write_u32::<LittleEndian>(end)?;
        position += align_up(source.length, DATA_ALIGNMENT);
    }
    let data_length = position;

    // A container without filenames always carries this 16-byte directory table.
    output.write_all(&FNTB_TAG)?;
    output.write_u32::<LittleEndian>(16)?;
    output.write_u32::<LittleEndian>(4)?;
    output.write_u16::<LittleEndian>(0)?;
    output.write_u16::<LittleEndian>(1)?;

    output.write_all(&FIMG_TAG)?;
    output.write_u32::<LittleEndian>(u32::try_from(data_length + 8).map_err(|_| {
        io::Error::new(ErrorKind::InvalidData, "Archive exceeds the 32-bit offset limit")
    })?)?;

    let mut written: u64 = 0;
    for source in sources.iter_mut() {
        let copied = io::copy(&mut source.reader, &mut output)?;
        if copied != source.length {
            return Err(TppkError::Io(io::Error::new(
                ErrorKind::InvalidData,
                "Source length changed while writing",
            )));
        }
        written += copied;

        let padding = align_up(written, DATA_ALIGNMENT) - written;
        output.write_all(&[0xFF, 0xFF, 0xFF][..padding as usize])?;
        written += padding;
    }

    let end_position = output.stream_position()?;
    output.seek(SeekFrom::Start(8))?;
    output.write_u32::<LittleEndian>(u32::try_from(end_position).map_err(|_| {
        io::Error::new(ErrorKind::InvalidData, "Archive exceeds the 32-bit length limit")
    })?)?;
    output.seek(SeekFrom::Start(end_position))?;
    Ok(())
}

/// Packs the given sources into a NARC container at `output_path`.
///
/// A failure after the destination is created truncates it to zero length rather
/// than leaving a half-written container.
pub fn create<P: AsRef<Path>>(
    sources: &mut [NarcSource<'_>],
    output_path: P,
) -> Result<(), TppkError> {
    debug!(
        "creating NARC container {} with {} entries",
        output_path.as_ref().display(),
        sources.len()
    );
    let mut output = File::create(output_path.as_ref())?;
    match write_archive(sources, &mut output) {
        Ok(()) => Ok(()),
        Err(err) => {
            let _ = output.set_len(0);
            Err(err)
        }
    }
}

fn align_up(value: u64, alignment: u64) -> u64 {
    ((value + alignment - 1) / alignment) * alignment
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(buffers: &[&[u8]]) -> Vec<u8> {
        let mut sources = buffers
            .iter()
            .map(|bytes| NarcSource::from_bytes(bytes.to_vec()))
            .collect::<Vec<_>>();
        let mut output = Cursor::new(Vec::new());
        write_archive(&mut sources, &mut output).unwrap();
        output.into_inner()
    }

    #[test]
    fn round_trips_arbitrary_buffers() {
        let encoded = encode(&[b"first", b"second entry", b"", b"x"]);
        let mut archive = NarcArchive::read_from(Cursor::new(encoded)).unwrap();

        assert_eq!(archive.entry_count(), 4);
        let expected: [&[u8]; 4] = [b"first", b"second entry", b"", b"x"];
        for (index, want) in expected.iter().enumerate() {
            let mut got = Vec::new();
            archive
                .entry_stream(index)
                .unwrap()
                .read_to_end(&mut got)
                .unwrap();
            assert_eq!(&got, want, "entry {index}");
        }
    }

    #[test]
    fn data_region_advances_in_aligned_steps() {
        let encoded = encode(&[b"abc", b"defgh"]);
        let archive = NarcArchive::read_from(Cursor::new(encoded)).unwrap();

        let entries = archive.entries();
        assert_eq!(entries[0].offset(), 0);
        assert_eq!(entries[0].length(), 3);
        // 3 bytes pad to 4 before the next entry starts.
        assert_eq!(entries[1].offset(), 4);
        assert_eq!(entries[1].length(), 5);
    }

    #[test]
    fn length_field_matches_the_file_size() {
        let encoded = encode(&[b"abc"]);
        let stored = u32::from_le_bytes(encoded[8..12].try_into().unwrap());
        assert_eq!(u64::from(stored), encoded.len() as u64);

        // Sibling padding bytes are 0xFF.
        assert_eq!(encoded[encoded.len() - 1], 0xFF);
    }

    #[test]
    fn rejects_a_mismatched_length_field() {
        let mut encoded = encode(&[b"abc"]);
        encoded.push(0);
        assert!(matches!(
            NarcArchive::read_from(Cursor::new(encoded)),
            Err(TppkError::InvalidFileType(_))
        ));
    }
}
