//! Stateless classification of byte sources by their leading magic bytes.
//!
//! Sniffing never moves the caller's cursor: the source is peeked, classified, and
//! left at its original position so the same source can be handed straight to a
//! decoder afterwards.

use crate::ext::io_ext::ReadSeekExt;
use std::io::{self, Read, Seek};

/// Magic bytes of a DirectDraw Surface texture.
pub const DDS_MAGIC: [u8; 4] = *b"DDS ";

/// Magic bytes of a TPPK texture package.
pub const TPPK_MAGIC: [u8; 4] = *b"tppk";

/// Signature of a NARC container: magic, byte-order mark `FE FF`, version `00 01`.
pub const NARC_SIGNATURE: [u8; 8] = [0x4E, 0x41, 0x52, 0x43, 0xFE, 0xFF, 0x00, 0x01];

/// The classification of a byte source by its leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// A DirectDraw Surface texture.
    Dds,
    /// A TPPK texture package.
    Tppk,
    /// A NARC resource container.
    Narc,
    /// None of the known signatures matched.
    Unknown,
}

/// Classifies a byte source by its leading bytes, restoring the cursor afterwards.
///
/// DDS and TPPK are recognized by their 4-byte magic alone. NARC requires the full
/// 8-byte signature and additionally that the stored total length at offset 8
/// matches the actual length of the source; a signature with a wrong length field
/// classifies as [`FileType::Unknown`].
pub fn sniff<R: Read + Seek>(source: &mut R) -> io::Result<FileType> {
    let (prefix, available) = source.peek_bytes::<12>()?;
    if available >= 4 && prefix[..4] == DDS_MAGIC {
        return Ok(FileType::Dds);
    }
    if available >= 4 && prefix[..4] == TPPK_MAGIC {
        return Ok(FileType::Tppk);
    }
    if available >= 12 && prefix[..8] == NARC_SIGNATURE {
        let stored_length = u32::from_le_bytes([prefix[8], prefix[9], prefix[10], prefix[11]]);
        if u64::from(stored_length) == source.stream_len()? {
            return Ok(FileType::Narc);
        }
    }
    Ok(FileType::Unknown)
}

/// Returns `true` if the source starts with the DDS magic.
pub fn is_dds<R: Read + Seek>(source: &mut R) -> io::Result<bool> {
    Ok(sniff(source)? == FileType::Dds)
}

/// Returns `true` if the source starts with the TPPK magic.
pub fn is_tppk<R: Read + Seek>(source: &mut R) -> io::Result<bool> {
    Ok(sniff(source)? == FileType::Tppk)
}

/// Returns `true` if the source carries the NARC signature and a matching length field.
pub fn is_narc<R: Read + Seek>(source: &mut R) -> io::Result<bool> {
    Ok(sniff(source)? == FileType::Narc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, SeekFrom};

    #[test]
    fn classifies_known_magics() {
        let mut dds = Cursor::new(b"DDS payload".to_vec());
        assert_eq!(sniff(&mut dds).unwrap(), FileType::Dds);

        let mut tppk = Cursor::new(b"tppk\0\0\0\0".to_vec());
        assert_eq!(sniff(&mut tppk).unwrap(), FileType::Tppk);

        let mut other = Cursor::new(b"RIFF....".to_vec());
        assert_eq!(sniff(&mut other).unwrap(), FileType::Unknown);

        let mut short = Cursor::new(b"DD".to_vec());
        assert_eq!(sniff(&mut short).unwrap(), FileType::Unknown);
    }

    #[test]
    fn narc_requires_a_matching_length_field() {
        let mut bytes = NARC_SIGNATURE.to_vec();
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 4]);
        let mut narc = Cursor::new(bytes.clone());
        assert_eq!(sniff(&mut narc).unwrap(), FileType::Narc);

        bytes[8] = 0xFF;
        let mut mismatched = Cursor::new(bytes);
        assert_eq!(sniff(&mut mismatched).unwrap(), FileType::Unknown);
    }

    #[test]
    fn sniffing_restores_the_cursor() {
        let mut source = Cursor::new(b"tppk trailing".to_vec());
        source.seek(SeekFrom::Start(5)).unwrap();
        sniff(&mut source).unwrap();
        assert_eq!(source.stream_position().unwrap(), 5);
    }
}
