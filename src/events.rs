//! Structured events reported by archives and catalogs.
//!
//! The library never prints. Each [`Archive`](crate::Archive) carries an
//! [`EventSink`]; the default [`TracingSink`] forwards events to `tracing`.
//! Any `Fn(&ArchiveEvent<'_>) + Send + Sync` closure is also a sink.

use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveEvent<'a> {
    Opened {
        path:        &'a Path,
        version:     i32,
        toc_length:  usize,
        entry_count: i32,
        hash_size:   usize,
    },
    Resolved {
        name:         &'a str,
        archive:      &'a Path,
        entry_offset: usize,
        checksum:     u64,
    },
    /// `archive` is `None` when every archive of a catalog missed.
    NotFound {
        name:    &'a str,
        archive: Option<&'a Path>,
    },
    Extracted {
        name:       &'a str,
        size:       usize,
        compressed: bool,
    },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: &ArchiveEvent<'_>);
}

impl<F> EventSink for F
where
    F: Fn(&ArchiveEvent<'_>) + Send + Sync,
{
    fn emit(&self, event: &ArchiveEvent<'_>) {
        self(event)
    }
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &ArchiveEvent<'_>) {
        match *event {
            ArchiveEvent::Opened { path, version, toc_length, entry_count, hash_size } => {
                tracing::info!(
                    path = %path.display(),
                    version,
                    toc_length,
                    entry_count,
                    hash_size,
                    "opened container"
                );
            }
            ArchiveEvent::Resolved { name, archive, entry_offset, checksum } => {
                tracing::debug!(
                    name,
                    archive = %archive.display(),
                    "resolved at 0x{entry_offset:08X} ({checksum:016X})"
                );
            }
            ArchiveEvent::NotFound { name, archive: Some(archive) } => {
                tracing::trace!(name, archive = %archive.display(), "not in container");
            }
            ArchiveEvent::NotFound { name, archive: None } => {
                tracing::warn!(name, "cannot find file in any container");
            }
            ArchiveEvent::Extracted { name, size, compressed } => {
                tracing::debug!(name, size, compressed, "extracted");
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &ArchiveEvent<'_>) {}
}
