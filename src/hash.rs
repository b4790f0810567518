//! Name normalization and the two name checksums used by the lookup.
//!
//! The bucket checksum (32-bit) picks a bucket; the entry checksum (64-bit)
//! identifies the leaf inside it. Both run over [`normalize_name`].

use crc::{
    Crc, CRC_32_BZIP2, CRC_32_CKSUM, CRC_32_JAMCRC, CRC_32_MPEG_2, CRC_64_ECMA_182,
    CRC_64_GO_ISO, CRC_64_WE, CRC_64_XZ,
};
use serde::{Deserialize, Serialize};

static CRC32_BZIP2:  Crc<u32> = Crc::<u32>::new(&CRC_32_BZIP2);
static CRC32_MPEG2:  Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);
static CRC32_JAMCRC: Crc<u32> = Crc::<u32>::new(&CRC_32_JAMCRC);
static CRC32_CKSUM:  Crc<u32> = Crc::<u32>::new(&CRC_32_CKSUM);

static CRC64_ECMA:   Crc<u64> = Crc::<u64>::new(&CRC_64_ECMA_182);
static CRC64_XZ:     Crc<u64> = Crc::<u64>::new(&CRC_64_XZ);
static CRC64_GO_ISO: Crc<u64> = Crc::<u64>::new(&CRC_64_GO_ISO);
static CRC64_WE:     Crc<u64> = Crc::<u64>::new(&CRC_64_WE);

/// Lowercase `name` and encode it one byte per character.
///
/// Characters outside ASCII become `?`, matching a strict single-byte
/// encoder. Lookups and key schedules both go through this, which is what
/// makes resolution case-insensitive.
pub fn normalize_name(name: &str) -> Vec<u8> {
    name.chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .collect()
}

// ── Bucket selection ─────────────────────────────────────────────────────────

/// 32-bit checksum variant used to select a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BucketChecksum {
    #[default]
    #[serde(rename = "crc32-iso-hdlc")]
    Crc32IsoHdlc,
    #[serde(rename = "crc32-bzip2")]
    Crc32Bzip2,
    #[serde(rename = "crc32-mpeg2")]
    Crc32Mpeg2,
    #[serde(rename = "crc32-jamcrc")]
    Crc32Jamcrc,
    #[serde(rename = "crc32-cksum")]
    Crc32Cksum,
}

impl BucketChecksum {
    pub fn checksum(self, bytes: &[u8]) -> u32 {
        match self {
            BucketChecksum::Crc32IsoHdlc => crc32fast::hash(bytes),
            BucketChecksum::Crc32Bzip2   => CRC32_BZIP2.checksum(bytes),
            BucketChecksum::Crc32Mpeg2   => CRC32_MPEG2.checksum(bytes),
            BucketChecksum::Crc32Jamcrc  => CRC32_JAMCRC.checksum(bytes),
            BucketChecksum::Crc32Cksum   => CRC32_CKSUM.checksum(bytes),
        }
    }
}

// ── Exact match ──────────────────────────────────────────────────────────────

/// 64-bit checksum variant stored in leaf entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EntryChecksum {
    #[default]
    #[serde(rename = "crc64-ecma-182")]
    Crc64Ecma182,
    #[serde(rename = "crc64-xz")]
    Crc64Xz,
    #[serde(rename = "crc64-go-iso")]
    Crc64GoIso,
    #[serde(rename = "crc64-we")]
    Crc64We,
}

impl EntryChecksum {
    pub fn checksum(self, bytes: &[u8]) -> u64 {
        match self {
            EntryChecksum::Crc64Ecma182 => CRC64_ECMA.checksum(bytes),
            EntryChecksum::Crc64Xz      => CRC64_XZ.checksum(bytes),
            EntryChecksum::Crc64GoIso   => CRC64_GO_ISO.checksum(bytes),
            EntryChecksum::Crc64We      => CRC64_WE.checksum(bytes),
        }
    }
}
