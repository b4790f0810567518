use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Read};

/// Unit of the archive cipher layer and of every extraction read.
pub const BLOCK_SIZE: usize = 0x8000;
/// Bytes of a leaf entry that make up its file record.
pub const FILE_RECORD_SIZE: usize = 16;

/// Unmasked extraction metadata of a leaf entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRecord {
    pub flags:             u16,
    pub file_offset:       u32,
    pub uncompressed_size: u32,
    pub compressed_size:   u32,
}

impl FileRecord {
    /// Read the 16-byte record at the start of a leaf entry and remove the
    /// per-file XOR mask from its three size/offset fields.
    pub fn read<R: Read>(mut reader: R, mask: &[u32; 3]) -> io::Result<Self> {
        let flags = reader.read_u16::<LittleEndian>()?;
        let _trailing = reader.read_u16::<LittleEndian>()?;
        Ok(Self {
            flags,
            file_offset:       reader.read_u32::<LittleEndian>()? ^ mask[0],
            uncompressed_size: reader.read_u32::<LittleEndian>()? ^ mask[1],
            compressed_size:   reader.read_u32::<LittleEndian>()? ^ mask[2],
        })
    }

    /// True when every bit of `flag_mask` is set. A zero mask never matches.
    pub fn is_compressed(&self, flag_mask: u16) -> bool {
        flag_mask != 0 && self.flags & flag_mask == flag_mask
    }

    pub fn window(&self) -> BlockWindow {
        BlockWindow::new(self.file_offset, self.compressed_size)
    }
}

/// Block-aligned span of the raw container that holds one payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockWindow {
    pub block_index:        u64,
    pub first_block_offset: usize,
    pub block_count:        usize,
}

impl BlockWindow {
    /// `block_count` is one extra block for an unaligned start plus enough
    /// whole blocks for `compressed_size`. It can exceed what the payload
    /// touches but never falls short of `first_block_offset + compressed_size`.
    pub fn new(file_offset: u32, compressed_size: u32) -> Self {
        let block_index = u64::from(file_offset) / BLOCK_SIZE as u64;
        let first_block_offset = file_offset as usize % BLOCK_SIZE;
        let block_count =
            usize::from(first_block_offset > 0) + (compressed_size as usize).div_ceil(BLOCK_SIZE);
        Self { block_index, first_block_offset, block_count }
    }

    /// Absolute byte position of the first block.
    pub fn start(&self) -> u64 {
        self.block_index * BLOCK_SIZE as u64
    }

    /// Bytes covered by all blocks of the window.
    pub fn len(&self) -> usize {
        self.block_count * BLOCK_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.block_count == 0
    }
}
