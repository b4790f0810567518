//! Hash-bucket lookup over the decrypted table of contents.
//!
//! Layout, starting at byte 0x14 of the TOC buffer:
//!
//! ```text
//! hash_size: i32
//! hash_size × (offset: i32, count: i32)      bucket directory
//! ```
//!
//! Each bucket is `count` variable-length entries starting at `offset`:
//!
//! | Offset | Field                                   |
//! |--------|-----------------------------------------|
//! | 0      | flags (u8; `0x08` marks a file leaf)    |
//! | 2      | trailing word count (u16)               |
//! | 4      | masked file record fields (leaf only)   |
//! | 16     | 64-bit name checksum (leaf only)        |
//! | 24     | trailing words                          |

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::error::{BbfsError, Result};
use crate::header::HEADER_SIZE;
use crate::profile::FormatProfile;

/// Flags bit marking a terminal file entry.
pub const LEAF_FLAG: u8 = 0x08;
/// Entry bytes before the trailing words.
pub const ENTRY_HEADER_SIZE: usize = 24;
const CHECKSUM_OFFSET: usize = 16;
const TRAILING_COUNT_OFFSET: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub offset: i32,
    pub count:  i32,
}

// ── Bucket directory ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct BucketDirectory {
    buckets: Vec<Bucket>,
}

impl BucketDirectory {
    /// Read `hash_size` and the bucket pairs that follow it.
    pub fn read(toc: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(toc);
        cursor.set_position(HEADER_SIZE as u64);
        let hash_size = cursor.read_i32::<LittleEndian>()?;
        if hash_size <= 0 {
            return Err(BbfsError::CorruptToc(format!("hash size {hash_size}")));
        }

        let end = HEADER_SIZE + 4 + hash_size as usize * 8;
        if end > toc.len() {
            return Err(BbfsError::CorruptToc(format!(
                "bucket directory of {hash_size} entries ends at {end}, past the {} B buffer",
                toc.len()
            )));
        }

        let mut buckets = Vec::with_capacity(hash_size as usize);
        for _ in 0..hash_size {
            buckets.push(Bucket {
                offset: cursor.read_i32::<LittleEndian>()?,
                count:  cursor.read_i32::<LittleEndian>()?,
            });
        }
        Ok(Self { buckets })
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Bucket> {
        self.buckets.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.iter()
    }

    /// Bucket index for a 32-bit name checksum.
    pub fn index_for(&self, checksum: u32) -> usize {
        (u64::from(checksum) % self.buckets.len().max(1) as u64) as usize
    }
}

// ── Entries ──────────────────────────────────────────────────────────────────

/// Borrowed view of one bucket entry.
#[derive(Debug, Clone, Copy)]
pub struct BucketEntry<'a> {
    toc:    &'a [u8],
    offset: usize,
}

impl<'a> BucketEntry<'a> {
    /// Fails unless the fixed 24-byte part lies inside `toc`.
    pub fn at(toc: &'a [u8], offset: usize) -> Result<Self> {
        match offset.checked_add(ENTRY_HEADER_SIZE) {
            Some(end) if end <= toc.len() => Ok(Self { toc, offset }),
            _ => Err(BbfsError::CorruptToc(format!(
                "entry at 0x{offset:X} runs past the {} B buffer",
                toc.len()
            ))),
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn flags(&self) -> u8 {
        self.toc[self.offset]
    }

    pub fn is_leaf(&self) -> bool {
        self.flags() & LEAF_FLAG != 0
    }

    pub fn trailing_count(&self) -> u16 {
        let at = self.offset + TRAILING_COUNT_OFFSET;
        LittleEndian::read_u16(&self.toc[at..at + 2])
    }

    /// Name checksum; `None` for non-leaf entries.
    pub fn checksum(&self) -> Option<u64> {
        self.is_leaf().then(|| {
            let at = self.offset + CHECKSUM_OFFSET;
            LittleEndian::read_u64(&self.toc[at..at + 8])
        })
    }

    /// Total entry size, trailing words included.
    pub fn span(&self) -> usize {
        ENTRY_HEADER_SIZE + usize::from(self.trailing_count()) * 4
    }
}

// ── Resolution ───────────────────────────────────────────────────────────────

/// A name matched to a leaf entry of one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    /// The name as requested.
    pub name:         String,
    pub bucket:       usize,
    pub entry_offset: usize,
    pub checksum:     u64,
}

/// Look `name` up in its bucket.
///
/// Entries are scanned in storage order and the first leaf whose checksum
/// matches wins. Returns `Ok(None)` when the bucket holds no match.
pub fn find(
    toc:       &[u8],
    directory: &BucketDirectory,
    profile:   &FormatProfile,
    name:      &str,
) -> Result<Option<ResolvedEntry>> {
    let bucket_index = directory.index_for(profile.bucket_hash(name));
    let bucket = match directory.get(bucket_index) {
        Some(b) if b.count > 0 => b,
        _ => return Ok(None),
    };

    let checksum = profile.entry_hash(name);
    let mut offset = usize::try_from(bucket.offset).map_err(|_| {
        BbfsError::CorruptToc(format!("bucket {bucket_index} has offset {}", bucket.offset))
    })?;

    for _ in 0..bucket.count {
        let entry = BucketEntry::at(toc, offset)?;
        if entry.checksum() == Some(checksum) {
            return Ok(Some(ResolvedEntry {
                name: name.to_owned(),
                bucket: bucket_index,
                entry_offset: offset,
                checksum,
            }));
        }
        offset += entry.span();
    }
    Ok(None)
}
