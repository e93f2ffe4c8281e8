/// Represents one stored resource in a NARC container.
///
/// Offsets are relative to the start of the FIMG data region. No filename is
/// modeled; the directory table of the containers this crate handles is the
/// minimal empty one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NarcArchiveEntry {
    /// The offset of the entry's data within the data region.
    offset: u64,
    /// The unpadded length of the entry's data.
    length: u64,
}

impl NarcArchiveEntry {
    pub(crate) fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// Returns the offset of the entry's data, relative to the data region.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the unpadded length of the entry's data.
    pub fn length(&self) -> u64 {
        self.length
    }
}
