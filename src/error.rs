use std::io;
use thiserror::Error;

use crate::header::MAGIC;

/// Every failure the container reader can report.
///
/// Callers branch on the variant: `NotFound` is a per-request miss that a
/// batch can skip past, while `InvalidMagic` and `TocTruncated` only ever
/// come out of [`Archive::open`](crate::Archive::open).
#[derive(Error, Debug)]
pub enum BbfsError {
    #[error("Invalid magic 0x{found:08X} (expected 0x{:08X})", MAGIC)]
    InvalidMagic { found: u32 },
    #[error("Table of contents ({toc_length} B) does not fit in the {window} B decrypted window")]
    TocTruncated { toc_length: usize, window: usize },
    #[error("Table of contents is malformed: {0}")]
    CorruptToc(String),
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Decompression error: {0}")]
    Decompression(String),
    #[error("Invalid format profile: {0}")]
    Profile(#[from] serde_json::Error),
}

impl BbfsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BbfsError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, BbfsError>;
