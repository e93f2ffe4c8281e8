//! Path-level archive operations consumed by external front ends.
//!
//! Callers hand these functions concrete path lists; wildcard expansion, console
//! reporting, and exit-code mapping stay outside the crate. Every operation either
//! completes or fails without leaving a corrupt archive behind: create paths
//! truncate their destination on failure, and the nested update never touches the
//! original container until its replacement is fully written next to it.

use crate::error::TppkError;
use crate::file_type::{self, FileType};
use crate::narc_archive::{self, NarcArchive, NarcSource};
use crate::tppk_archive::{self, TppkArchive, TppkSource};
use std::fs::{self, File};
use std::io::{self, Cursor, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Packs the given DDS files into a new TPPK archive at `output_path`.
pub fn create_archive<P, Q>(input_paths: &[P], output_path: Q) -> Result<(), TppkError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    tppk_archive::create(input_paths, output_path)
}

/// Packs the given DDS files, updating in place when the target is a NARC container.
///
/// When `output_path` already exists and carries the NARC signature, the container's
/// nested TPPK entry is replaced; otherwise a plain TPPK archive is created.
pub fn create_or_update_archive<P, Q>(input_paths: &[P], output_path: Q) -> Result<(), TppkError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let output_path = output_path.as_ref();
    if output_path.exists() {
        let mut file = File::open(output_path)?;
        if file_type::sniff(&mut file)? == FileType::Narc {
            drop(file);
            return update_nested_tppk(input_paths, output_path);
        }
    }
    tppk_archive::create(input_paths, output_path)
}

/// Extracts the textures of a TPPK archive, or of the TPPK nested in a NARC
/// container, to `output_dir`.
pub fn extract_archive<P, Q>(input_path: P, output_dir: Q) -> Result<(), TppkError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let input_path = input_path.as_ref();
    let mut file = File::open(input_path)?;
    match file_type::sniff(&mut file)? {
        FileType::Tppk => {
            let mut archive = TppkArchive::read_from(file)?;
            archive.extract_to(output_dir, &extraction_prefix(input_path))
        }
        FileType::Narc => {
            drop(file);
            extract_nested_tppk(input_path, output_dir)
        }
        _ => Err(TppkError::invalid_file_type(input_path)),
    }
}

/// Extracts the first TPPK entry of a NARC container to `output_dir`.
///
/// Entries are scanned in table order; extracted filenames are prefixed with the
/// container's base name. A container without a TPPK entry is an error.
pub fn extract_nested_tppk<P, Q>(narc_path: P, output_dir: Q) -> Result<(), TppkError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let narc_path = narc_path.as_ref();
    let narc = NarcArchive::open(narc_path)?;
    for index in 0..narc.entry_count() {
        let mut window = narc.entry_reader(index)?;
        if file_type::is_tppk(&mut window)? {
            debug!("extracting TPPK archive found at NARC entry {index}");
            let mut archive = TppkArchive::read_from(window)?;
            return archive.extract_to(output_dir, &extraction_prefix(narc_path));
        }
    }
    Err(TppkError::no_tppk_archive(narc_path))
}

/// Rebuilds the TPPK entry of a NARC container from a new set of DDS files.
///
/// The first entry that carries the TPPK magic is replaced; every other entry is
/// copied verbatim. The new container is written to a sibling temporary file and
/// only renamed over the original once fully written, so a failure at any point
/// leaves the original byte-identical. The temporary file must stay on the same
/// volume as the target for the final rename to be atomic.
pub fn update_nested_tppk<P, Q>(input_paths: &[P], narc_path: Q) -> Result<(), TppkError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let narc_path = narc_path.as_ref();

    // Validate every replacement texture before any destructive step.
    let mut tppk_sources = input_paths
        .iter()
        .map(TppkSource::open)
        .collect::<Result<Vec<_>, _>>()?;

    let narc = NarcArchive::open(narc_path)?;
    let mut tppk_index = None;
    for index in 0..narc.entry_count() {
        let mut window = narc.entry_reader(index)?;
        if file_type::is_tppk(&mut window)? {
            tppk_index = Some(index);
            break;
        }
    }
    let Some(tppk_index) = tppk_index else {
        return Err(TppkError::no_tppk_archive(narc_path));
    };
    debug!(
        "replacing TPPK archive at NARC entry {tppk_index} of {}",
        narc.entry_count()
    );

    let mut replacement = Cursor::new(Vec::new());
    tppk_archive::write_archive(&mut tppk_sources, &mut replacement)?;
    let mut replacement_bytes = replacement.into_inner();

    let mut sources = Vec::with_capacity(narc.entry_count());
    for (index, entry) in narc.entries().iter().enumerate() {
        if index == tppk_index {
            sources.push(NarcSource::from_bytes(std::mem::take(&mut replacement_bytes)));
        } else {
            let window = narc.entry_reader(index)?;
            sources.push(NarcSource::new(entry.length(), window));
        }
    }

    let temp_path = temp_sibling_path(narc_path)?;
    let result = narc_archive::create(&mut sources, &temp_path);
    drop(sources);
    drop(narc);
    match result {
        Ok(()) => {
            fs::remove_file(narc_path)?;
            fs::rename(&temp_path, narc_path)?;
            Ok(())
        }
        Err(err) => {
            let _ = fs::remove_file(&temp_path);
            Err(err)
        }
    }
}

/// Extracted filenames are prefixed with the source archive's base name.
fn extraction_prefix(path: &Path) -> String {
    path.file_stem()
        .map(|stem| format!("{}_", stem.to_string_lossy()))
        .unwrap_or_default()
}

fn temp_sibling_path(path: &Path) -> Result<PathBuf, TppkError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(ErrorKind::InvalidInput, "Path has no file name"))?;
    Ok(path.with_file_name(format!("{}.tmp", file_name.to_string_lossy())))
}
