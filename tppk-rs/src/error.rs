/// Represents all possible errors that can occur in the TPPK library.
///
/// This enum is used throughout the crate to provide detailed error information for
/// operations that may fail, such as archive validation, texture naming, and I/O operations.
#[derive(Debug)]
pub enum TppkError {
    /// Represents an error that occurs when a file's magic bytes do not match the
    /// expected DDS, TPPK, or NARC signature, or a NARC fails its length check.
    InvalidFileType(String),
    /// Represents an error that occurs when a DDS filename lacks a parsable trailing
    /// hexadecimal texture ID.
    NoTextureId(String),
    /// Represents an error that occurs when no entry of a NARC container holds a
    /// TPPK archive.
    NoTppkArchive(String),
    /// Represents an error that occurs during I/O operations.
    Io(std::io::Error),
}

impl TppkError {
    pub(crate) fn invalid_file_type(path: &std::path::Path) -> Self {
        TppkError::InvalidFileType(display_name(path))
    }

    pub(crate) fn no_texture_id(path: &std::path::Path) -> Self {
        TppkError::NoTextureId(display_name(path))
    }

    pub(crate) fn no_tppk_archive(path: &std::path::Path) -> Self {
        TppkError::NoTppkArchive(display_name(path))
    }
}

/// Error messages carry the offending file's name, not its full path.
fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Provides a user-friendly string representation for each error variant in `TppkError`.
impl std::fmt::Display for TppkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TppkError::InvalidFileType(name) => write!(f, "Invalid file type: {name}"),
            TppkError::NoTextureId(name) => write!(f, "No texture ID in filename: {name}"),
            TppkError::NoTppkArchive(name) => write!(f, "No TPPK archive found in: {name}"),
            TppkError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

/// Implements the standard error trait for `TppkError`, allowing it to be used with
/// error chaining and other error handling utilities.
impl std::error::Error for TppkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TppkError::Io(err) => Some(err),
            _ => None,
        }
    }
}

/// Allows automatic conversion from `std::io::Error` to `TppkError`.
impl From<std::io::Error> for TppkError {
    fn from(error: std::io::Error) -> Self {
        TppkError::Io(error)
    }
}
