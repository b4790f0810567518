//! An ordered set of opened containers searched as one namespace.

use std::path::Path;
use std::sync::Arc;

use crate::archive::Archive;
use crate::error::{BbfsError, Result};
use crate::events::{ArchiveEvent, EventSink, TracingSink};
use crate::index::ResolvedEntry;
use crate::profile::FormatProfile;

pub struct Catalog {
    archives: Vec<Archive>,
    sink:     Arc<dyn EventSink>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::with_sink(Arc::new(TracingSink))
    }

    pub fn with_sink(sink: Arc<dyn EventSink>) -> Self {
        Self { archives: Vec::new(), sink }
    }

    /// Open every container in `paths`, in order. The first one that fails
    /// to open aborts the whole call.
    pub fn open_all<I, P>(paths: I, profile: &FormatProfile) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self::open_all_with_sink(paths, profile, Arc::new(TracingSink))
    }

    /// Like [`open_all`](Self::open_all), sharing `sink` with every archive.
    pub fn open_all_with_sink<I, P>(
        paths:   I,
        profile: &FormatProfile,
        sink:    Arc<dyn EventSink>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut catalog = Self::with_sink(Arc::clone(&sink));
        for path in paths {
            catalog.push(Archive::open_with_sink(path, profile, Arc::clone(&sink))?);
        }
        Ok(catalog)
    }

    pub fn push(&mut self, archive: Archive) {
        self.archives.push(archive);
    }

    pub fn archives(&self) -> &[Archive] {
        &self.archives
    }

    pub fn len(&self) -> usize {
        self.archives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }

    /// First archive, in insertion order, that holds `name`.
    ///
    /// A miss in one archive moves on to the next. Any other error stops
    /// the search and is returned as is.
    pub fn resolve(&self, name: &str) -> Result<(&Archive, ResolvedEntry)> {
        for archive in &self.archives {
            match archive.resolve(name) {
                Ok(entry) => return Ok((archive, entry)),
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }
        self.sink.emit(&ArchiveEvent::NotFound { name, archive: None });
        Err(BbfsError::NotFound(name.to_owned()))
    }

    pub fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let (archive, entry) = self.resolve(name)?;
        archive.extract(&entry)
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog").field("archives", &self.archives).finish_non_exhaustive()
    }
}
