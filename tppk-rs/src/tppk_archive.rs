//! Reading and writing of TPPK texture packages.
//!
//! A TPPK archive is a flat container of DDS textures: a 12-byte header, a table of
//! 12-byte index records, then each texture's bytes aligned to a 64-byte boundary.
//! Index records store their data offset biased by the position of the record
//! itself; [`TppkArchive::read_from`] adds `(index + 1) * 12` back to recover the
//! absolute offset. The bias is part of the wire format and is written exactly.

use crate::error::TppkError;
use crate::file_type;
use crate::tppk_archive_entry::TppkArchiveEntry;
use crate::windowed_stream::WindowedStream;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::{self, File};
use std::io::{self, ErrorKind, Read, Seek, Write};
use std::path::Path;
use tracing::{debug, trace};

/// Size in bytes of one index record: texture ID, biased offset, length.
const INDEX_RECORD_SIZE: u64 = 12;

/// Entry data is aligned to this boundary within the archive.
const DATA_ALIGNMENT: u64 = 64;

/// A named byte source queued for packing into a TPPK archive.
pub struct TppkSource<R> {
    texture_id: u32,
    length: u64,
    reader: R,
}

impl TppkSource<File> {
    /// Opens a DDS file as an archive source.
    ///
    /// The file must start with the `"DDS "` magic and its filename must end in
    /// `_<hex>` immediately before the extension; the suffix becomes the texture ID.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TppkError> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        if !file_type::is_dds(&mut file)? {
            return Err(TppkError::invalid_file_type(path));
        }
        let texture_id = texture_id_from_path(path)?;
        let length = file.metadata()?.len();
        Ok(TppkSource {
            texture_id,
            length,
            reader: file,
        })
    }
}

impl<R: Read> TppkSource<R> {
    /// Creates a source from an already validated reader of known length.
    pub fn new(texture_id: u32, length: u64, reader: R) -> Self {
        TppkSource {
            texture_id,
            length,
            reader,
        }
    }

    /// Returns the texture ID of the source.
    pub fn texture_id(&self) -> u32 {
        self.texture_id
    }

    /// Returns the declared length of the source in bytes.
    pub fn length(&self) -> u64 {
        self.length
    }
}

/// A decoded TPPK archive: an ordered entry table over an open byte source.
///
/// Entry order matches input order at pack time; the position of a record in the
/// index determines its offset encoding, so the order is meaningful and preserved.
pub struct TppkArchive<R> {
    source: R,
    entries: Vec<TppkArchiveEntry>,
}

impl<R: Read + Seek> TppkArchive<R> {
    /// Parses the archive index from a source positioned at the container start.
    ///
    /// Entry data is not read; it is fetched lazily through [`Self::entry_stream`].
    pub fn read_from(mut source: R) -> Result<Self, TppkError> {
        let mut magic = [0u8; 4];
        source.read_exact(&mut magic)?;
        if magic != file_type::TPPK_MAGIC {
            return Err(TppkError::InvalidFileType("not a TPPK archive".into()));
        }
        let _reserved = source.read_u32::<LittleEndian>()?;
        let entry_count = source.read_u32::<LittleEndian>()?;

        let mut entries = Vec::with_capacity(entry_count as usize);
        for index in 0..u64::from(entry_count) {
            let texture_id = source.read_u32::<LittleEndian>()?;
            let stored_offset = source.read_u32::<LittleEndian>()?;
            let length = source.read_u32::<LittleEndian>()?;
            let offset = u64::from(stored_offset) + (index + 1) * INDEX_RECORD_SIZE;
            entries.push(TppkArchiveEntry::new(texture_id, offset, u64::from(length)));
        }
        trace!("parsed TPPK index with {} entries", entries.len());

        Ok(TppkArchive { source, entries })
    }

    /// Returns the number of entries in the archive.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns the entries in index order.
    pub fn entries(&self) -> &[TppkArchiveEntry] {
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
            entry.offset(),
            entry.length(),
        ))
    }

    /// Extracts every entry to `output_dir`, creating the directory if needed.
    ///
    /// Filenames are `{prefix}{index}_{texture_id}.dds` with the index zero-padded
    /// to the decimal width of the entry count and the texture ID in lowercase hex.
    pub fn extract_to<P: AsRef<Path>>(&mut self, output_dir: P, prefix: &str) -> Result<(), TppkError> {
        let output_dir = output_dir.as_ref();
        if !output_dir.exists() {
            fs::create_dir_all(output_dir)?;
        }

        let width = decimal_width(self.entries.len());
        debug!("extracting {} textures to {}", self.entries.len(), output_dir.display());
        for index in 0..self.entries.len() {
            let texture_id = self.entries[index].texture_id();
            let filename = format!("{prefix}{index:0width$}_{texture_id:x}.dds");
            let mut output = File::create(output_dir.join(filename))?;
            let mut window = self.entry_stream(index)?;
            io::copy(&mut window, &mut output)?;
        }
        Ok(())
    }
}

/// Writes a TPPK archive over `sources` to `output`.
///
/// Offsets are computed up front from the declared source lengths, since the index
/// is written before any data. Each entry's data is preceded by zero padding up to
/// the next 64-byte boundary; lengths in the index stay unpadded.
pub fn write_archive<W, R>(sources: &mut [TppkSource<R>], mut output: W) -> Result<(), TppkError>
where
    W: Write,
    R: Read,
{
    let entry_count = u32::try_from(sources.len())
        .map_err(|_| io::Error::new(ErrorKind::InvalidData, "Too many entries for a TPPK index"))?;

    output.write_all(&file_type::TPPK_MAGIC)?;
    output.write_u32::<LittleEndian>(0)?;
    output.write_u32::<LittleEndian>(entry_count)?;

    // The index region reserves one extra record slot before data begins.
    let index_end = INDEX_RECORD_SIZE * (sources.len() as u64 + 1);
    let mut position = align_up(index_end, DATA_ALIGNMENT);
    for (index, source) in sources.iter().enumerate() {
        let length = u32::try_from(source.length)
            .map_err(|_| io::Error::new(ErrorKind::InvalidData, "Entry too large for a TPPK index"))?;
        let biased_offset = position - (index as u64 + 1) * INDEX_RECORD_SIZE;
        output.write_u32::<LittleEndian>(source.texture_id)?;
        output.write_u32::<LittleEndian>(u32::try_from(biased_offset).map_err(|_| {
            io::Error::new(ErrorKind::InvalidData, "Archive exceeds the 32-bit offset limit")
        })?)?;
        output.write_u32::<LittleEndian>(length)?;
        position += align_up(source.length, DATA_ALIGNMENT);
    }

    let zeroes = [0u8; DATA_ALIGNMENT as usize];
    let mut written = index_end;
    for source in sources.iter_mut() {
        let padding = align_up(written, DATA_ALIGNMENT) - written;
        output.write_all(&zeroes[..padding as usize])?;
        written += padding;

        let copied = io::copy(&mut source.reader, &mut output)?;
        if copied != source.length {
            return Err(TppkError::Io(io::Error::new(
                ErrorKind::InvalidData,
                "Source length changed while writing",
            )));
        }
        written += copied;
    }
    Ok(())
}

/// Packs the given DDS files into a TPPK archive at `output_path`.
///
/// Every input is validated and opened before the destination is created, so a bad
/// input never clobbers an existing archive. A failure after creation truncates the
/// destination to zero length rather than leaving a half-written archive.
pub fn create<P, Q>(input_paths: &[P], output_path: Q) -> Result<(), TppkError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut sources = input_paths
        .iter()
        .map(TppkSource::open)
        .collect::<Result<Vec<_>, _>>()?;
    debug!(
        "creating TPPK archive {} from {} textures",
        output_path.as_ref().display(),
        sources.len()
    );
    let output = File::create(output_path.as_ref())?;
    write_truncating_on_failure(&mut sources, output)
}

fn write_truncating_on_failure<R: Read>(
    sources: &mut [TppkSource<R>],
    mut output: File,
) -> Result<(), TppkError> {
    match write_archive(sources, &mut output) {
        Ok(()) => Ok(()),
        Err(err) => {
            let _ = output.set_len(0);
            Err(err)
        }
    }
}

/// Parses the texture ID from a DDS filename's trailing `_<hex>` suffix.
///
/// The suffix after the last underscore of the file stem must consist solely of
/// case-insensitive hex digits and fit an unsigned 32-bit integer.
pub fn texture_id_from_path(path: &Path) -> Result<u32, TppkError> {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| TppkError::no_texture_id(path))?;
    let (_, suffix) = stem
        .rsplit_once('_')
        .ok_or_else(|| TppkError::no_texture_id(path))?;
    if suffix.is_empty() || !suffix.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return Err(TppkError::no_texture_id(path));
    }
    u32::from_str_radix(suffix, 16).map_err(|_| TppkError::no_texture_id(path))
}

fn decimal_width(count: usize) -> usize {
    (count.max(1).ilog10() + 1) as usize
}

fn align_up(value: u64, alignment: u64) -> u64 {
    ((value + alignment - 1) / alignment) * alignment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TppkError;
    use std::io::Cursor;

    #[test]
    fn texture_id_parses_trailing_hex() {
        assert_eq!(texture_id_from_path(Path::new("tex_1F.dds")).unwrap(), 0x1F);
        assert_eq!(texture_id_from_path(Path::new("a_b_00ff.dds")).unwrap(), 0xFF);
        assert_eq!(
            texture_id_from_path(Path::new("dir/tex_deadbeef.dds")).unwrap(),
            0xDEADBEEF
        );
    }

    #[test]
    fn texture_id_rejects_unsuffixed_names() {
        assert!(matches!(
            texture_id_from_path(Path::new("tex.dds")),
            Err(TppkError::NoTextureId(_))
        ));
        assert!(matches!(
            texture_id_from_path(Path::new("tex_ZZ.dds")),
            Err(TppkError::NoTextureId(_))
        ));
        assert!(matches!(
            texture_id_from_path(Path::new("tex_.dds")),
            Err(TppkError::NoTextureId(_))
        ));
        // Nine hex digits cannot fit an unsigned 32-bit ID.
        assert!(matches!(
            texture_id_from_path(Path::new("tex_100000000.dds")),
            Err(TppkError::NoTextureId(_))
        ));
    }

    #[test]
    fn decimal_width_matches_entry_count() {
        assert_eq!(decimal_width(0), 1);
        assert_eq!(decimal_width(9), 1);
        assert_eq!(decimal_width(10), 2);
        assert_eq!(decimal_width(100), 3);
    }

    #[test]
    fn offsets_are_biased_by_record_position() {
        let mut sources = vec![
            TppkSource::new(0xA, 8, Cursor::new(b"DDS 1234".to_vec())),
            TppkSource::new(0xB, 8, Cursor::new(b"DDS 5678".to_vec())),
        ];
        let mut buffer = Vec::new();
        write_archive(&mut sources, &mut buffer).unwrap();

        let mut archive = TppkArchive::read_from(Cursor::new(buffer.clone())).unwrap();
        for (index, entry) in archive.entries().iter().enumerate() {
            assert_eq!(entry.offset() % 64, 0);
            let record = 12 + 12 * index;
            let stored =
                u32::from_le_bytes(buffer[record + 4..record + 8].try_into().unwrap());
            assert_eq!(
                u64::from(stored) + 12 * (index as u64 + 1),
                entry.offset()
            );
        }

        let mut first = Vec::new();
        archive.entry_stream(0).unwrap().read_to_end(&mut first).unwrap();
        assert_eq!(first, b"DDS 1234");
    }

    #[test]
    fn failed_writes_truncate_the_destination() {
        let dir = tempfile::tempdir().unwrap();
        let output_path = dir.path().join("broken.tppk");

        // Declared length disagrees with the actual content, failing mid-write.
        let mut sources = vec![TppkSource::new(0x1, 100, Cursor::new(b"DDS ".to_vec()))];
        let output = File::create(&output_path).unwrap();
        let result = write_truncating_on_failure(&mut sources, output);

        assert!(result.is_err());
        assert_eq!(fs::metadata(&output_path).unwrap().len(), 0);
    }
}
