/// Represents one packed texture in a TPPK archive.
///
/// An entry is a coordinate pair into the container stream; it owns no data itself.
/// Entry bytes are fetched lazily through a windowed stream over
/// `[offset, offset + length)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TppkArchiveEntry {
    /// The texture ID, parsed from the source filename's trailing hex suffix at pack time.
    texture_id: u32,
    /// The absolute byte position of the entry's data within the container.
    offset: u64,
    /// The exact, unpadded byte length of the entry's data.
    length: u64,
}

impl TppkArchiveEntry {
    pub(crate) fn new(texture_id: u32, offset: u64, length: u64) -> Self {
        Self {
            texture_id,
            offset,
            length,
        }
    }

    /// Returns the texture ID.
    pub fn texture_id(&self) -> u32 {
        self.texture_id
    }

    /// Returns the absolute offset of the entry's data within the container.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the unpadded length of the entry's data.
    pub fn length(&self) -> u64 {
        self.length
    }
}
