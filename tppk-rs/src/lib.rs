//! # tppk-rs
//!
//! `tppk-rs` is a pure Rust library for packing and unpacking TPPK texture archives
//! and the NARC containers that nest them, as used to distribute game texture assets.
//!
//! ## Features
//! - Pack DDS textures into TPPK archives, with texture IDs taken from filenames
//! - Extract TPPK archives, including one nested inside a NARC container
//! - Replace the TPPK entry of an existing NARC in place, atomically, leaving every
//!   other entry byte-identical
//! - Entry data is read lazily through windowed streams, so peak memory stays
//!   bounded by the largest single entry
//!
//! ## Usage
//! Add to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! tppk-rs = "0.1"
//! ```
//!
//! ### Example: Creating and Extracting Archives
//! ```no_run
//! use tppk_rs::ops;
//!
//! // Pack a set of DDS textures into a TPPK archive. Each filename carries the
//! // texture ID as a trailing hex suffix.
//! ops::create_archive(&["textures/ui_1f.dds", "textures/ui_20.dds"], "ui.tppk").unwrap();
//!
//! // Update the TPPK nested inside an existing NARC container.
//! ops::create_or_update_archive(&["textures/ui_1f.dds"], "assets.narc").unwrap();
//!
//! // Extract either kind of archive; the input type is sniffed from its magic.
//! ops::extract_archive("assets.narc", "extracted/").unwrap();
//! ```

pub mod error;
mod ext;
pub mod file_type;
pub mod narc_archive;
pub mod narc_archive_entry;
pub mod ops;
pub mod tppk_archive;
pub mod tppk_archive_entry;
pub mod windowed_stream;
