use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;

use crate::error::{BbfsError, Result};

/// `"bbfs"` read as a little-endian word.
pub const MAGIC: u32 = 0x7366_6262;
/// Fixed header bytes ahead of the TOC-layer protected region.
pub const HEADER_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub version:        i32,
    /// Length field as stored, sign bit included.
    pub raw_toc_length: i32,
    /// Declared TOC length with the sign bit cleared, rounded up to a word.
    pub toc_length:     usize,
    /// Informational only; nothing in the lookup depends on it.
    pub entry_count:    i32,
}

impl ContainerHeader {
    /// Parse the fixed header from an already archive-layer-decrypted prefix.
    pub fn read<R: Read>(mut reader: R) -> Result<Self> {
        let magic = reader.read_u32::<LittleEndian>()?;
        if magic != MAGIC {
            return Err(BbfsError::InvalidMagic { found: magic });
        }
        let version        = reader.read_i32::<LittleEndian>()?;
        let raw_toc_length = reader.read_i32::<LittleEndian>()?;
        let entry_count    = reader.read_i32::<LittleEndian>()?;
        Ok(Self {
            version,
            raw_toc_length,
            toc_length: toc_length_from_raw(raw_toc_length),
            entry_count,
        })
    }
}

/// Clear the sign bit and round up to the next multiple of four.
pub fn toc_length_from_raw(raw: i32) -> usize {
    ((((raw as u32) & 0x7FFF_FFFF) + 3) & !3) as usize
}
