//! High-level [`Archive`] API: one opened container.
//!
//! ```no_run
//! use bbfs::{Archive, FormatProfile};
//!
//! let profile = FormatProfile::load("profile.json")?;
//! let archive = Archive::open("00__ridge_racer__", &profile)?;
//! let entry = archive.resolve("data/foo.bin")?;
//! let bytes = archive.extract(&entry)?;
//! # Ok::<(), bbfs::BbfsError>(())
//! ```
//!
//! Opening decodes the header region once. The handle is immutable after
//! that and can be shared across threads; every extraction opens its own
//! read handle on the container file.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::block::{FileRecord, BLOCK_SIZE};
use crate::crypto::{decrypt_archive_blocks, decrypt_toc, FileKey};
use crate::error::{BbfsError, Result};
use crate::events::{ArchiveEvent, EventSink, TracingSink};
use crate::extract::extract_entry;
use crate::header::{ContainerHeader, HEADER_SIZE};
use crate::index::{self, BucketDirectory, ResolvedEntry};
use crate::profile::FormatProfile;

/// Bytes loaded from the front of a container on open.
pub const LOAD_WINDOW: usize = 0x20_0000;
/// Blocks of the loaded prefix that get the archive layer removed. The
/// header and the whole TOC must fit in these.
pub const TOC_BLOCKS: usize = 8;

pub struct Archive {
    path:      PathBuf,
    header:    ContainerHeader,
    toc:       Vec<u8>,
    directory: BucketDirectory,
    profile:   FormatProfile,
    sink:      Arc<dyn EventSink>,
}

impl Archive {
    // ── Constructors ─────────────────────────────────────────────────────────

    pub fn open<P: AsRef<Path>>(path: P, profile: &FormatProfile) -> Result<Self> {
        Self::open_with_sink(path, profile, Arc::new(TracingSink))
    }

    pub fn open_with_sink<P: AsRef<Path>>(
        path:    P,
        profile: &FormatProfile,
        sink:    Arc<dyn EventSink>,
    ) -> Result<Self> {
        let path = path.as_ref().to_owned();
        let mut prefix = Vec::new();
        File::open(&path)?
            .take(LOAD_WINDOW as u64)
            .read_to_end(&mut prefix)?;
        Self::decode(path, prefix, profile, sink)
    }

    /// Decode an already loaded container prefix. `path` is where later
    /// extractions read payload blocks from.
    pub fn decode(
        path:       PathBuf,
        mut prefix: Vec<u8>,
        profile:    &FormatProfile,
        sink:       Arc<dyn EventSink>,
    ) -> Result<Self> {
        let blocks = decrypt_archive_blocks(&mut prefix, &profile.archive_key, TOC_BLOCKS);
        let window = prefix.len().min(TOC_BLOCKS * BLOCK_SIZE);
        tracing::trace!(blocks, window, "removed archive layer from prefix");

        let header = ContainerHeader::read(Cursor::new(&prefix))?;
        if header.toc_length > window {
            return Err(BbfsError::TocTruncated { toc_length: header.toc_length, window });
        }
        if header.toc_length > HEADER_SIZE {
            decrypt_toc(&mut prefix[HEADER_SIZE..header.toc_length], &profile.toc_key);
        }

        let directory = BucketDirectory::read(&prefix)?;

        let archive = Self {
            path,
            header,
            toc: prefix,
            directory,
            profile: profile.clone(),
            sink,
        };
        archive.sink.emit(&ArchiveEvent::Opened {
            path:        &archive.path,
            version:     header.version,
            toc_length:  header.toc_length,
            entry_count: header.entry_count,
            hash_size:   archive.directory.len(),
        });
        Ok(archive)
    }

    // ── Lookup ───────────────────────────────────────────────────────────────

    /// Resolve `name` (case-insensitive) to its leaf entry.
    pub fn resolve(&self, name: &str) -> Result<ResolvedEntry> {
        match index::find(&self.toc, &self.directory, &self.profile, name)? {
            Some(entry) => {
                self.sink.emit(&ArchiveEvent::Resolved {
                    name,
                    archive:      &self.path,
                    entry_offset: entry.entry_offset,
                    checksum:     entry.checksum,
                });
                Ok(entry)
            }
            None => {
                self.sink.emit(&ArchiveEvent::NotFound { name, archive: Some(&self.path) });
                Err(BbfsError::NotFound(name.to_owned()))
            }
        }
    }

    /// Unmasked file record of a resolved entry.
    pub fn record(&self, entry: &ResolvedEntry) -> Result<FileRecord> {
        let key = FileKey::new(&entry.name);
        let bytes = self.toc.get(entry.entry_offset..).unwrap_or_default();
        Ok(FileRecord::read(bytes, &key.mask())?)
    }

    // ── Extraction ───────────────────────────────────────────────────────────

    /// Read, decrypt and decode the payload of an entry resolved by this
    /// archive. An entry resolved by a different archive yields garbage or
    /// an error.
    pub fn extract(&self, entry: &ResolvedEntry) -> Result<Vec<u8>> {
        let mut file = File::open(&self.path)?;
        let (record, data) = extract_entry(&mut file, &self.toc, entry, &self.profile)?;
        self.sink.emit(&ArchiveEvent::Extracted {
            name:       &entry.name,
            size:       data.len(),
            compressed: record.is_compressed(self.profile.compressed_flag),
        });
        Ok(data)
    }

    pub fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let entry = self.resolve(name)?;
        self.extract(&entry)
    }

    // ── Metadata ─────────────────────────────────────────────────────────────

    pub fn path(&self) -> &Path { &self.path }

    pub fn header(&self) -> &ContainerHeader { &self.header }

    pub fn version(&self) -> i32 { self.header.version }

    pub fn toc_length(&self) -> usize { self.header.toc_length }

    pub fn entry_count(&self) -> i32 { self.header.entry_count }

    pub fn hash_size(&self) -> usize { self.directory.len() }

    pub fn directory(&self) -> &BucketDirectory { &self.directory }

    pub fn profile(&self) -> &FormatProfile { &self.profile }

    /// The decoded prefix: header and TOC in plain text, followed by the
    /// rest of the loaded window.
    pub fn toc(&self) -> &[u8] { &self.toc }
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("path", &self.path)
            .field("header", &self.header)
            .field("hash_size", &self.directory.len())
            .finish_non_exhaustive()
    }
}
