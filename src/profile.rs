//! Format profile: the keys and checksum variants a container was built with.
//!
//! ```json
//! {
//!   "archive_key": ["0x1A2B3C4D", "0x5E6F7081", "0x92A3B4C5", "0xD6E7F809"],
//!   "toc_key":     [195948557, 3735928559, 3405691582, 2343432205],
//!   "bucket_checksum": "crc32-iso-hdlc",
//!   "entry_checksum":  "crc64-ecma-182",
//!   "compressed_flag": 1
//! }
//! ```
//!
//! Only the two keys are required; the remaining fields have defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::crypto::CipherKey;
use crate::error::Result;
use crate::hash::{normalize_name, BucketChecksum, EntryChecksum};

/// Default FileRecord flag bits marking a compressed, stream-encrypted payload.
pub const DEFAULT_COMPRESSED_FLAG: u16 = 0x0001;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatProfile {
    #[serde(deserialize_with = "deserialize_key")]
    pub archive_key:     CipherKey,
    #[serde(deserialize_with = "deserialize_key")]
    pub toc_key:         CipherKey,
    #[serde(default)]
    pub bucket_checksum: BucketChecksum,
    #[serde(default)]
    pub entry_checksum:  EntryChecksum,
    #[serde(default = "default_compressed_flag")]
    pub compressed_flag: u16,
}

fn default_compressed_flag() -> u16 {
    DEFAULT_COMPRESSED_FLAG
}

impl FormatProfile {
    pub fn new(archive_key: CipherKey, toc_key: CipherKey) -> Self {
        Self {
            archive_key,
            toc_key,
            bucket_checksum: BucketChecksum::default(),
            entry_checksum:  EntryChecksum::default(),
            compressed_flag: DEFAULT_COMPRESSED_FLAG,
        }
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&fs::read(path)?)
    }

    /// 32-bit bucket-selection checksum of the normalized name.
    pub fn bucket_hash(&self, name: &str) -> u32 {
        self.bucket_checksum.checksum(&normalize_name(name))
    }

    /// 64-bit exact-match checksum of the normalized name.
    pub fn entry_hash(&self, name: &str) -> u64 {
        self.entry_checksum.checksum(&normalize_name(name))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum KeyWord {
    Number(u32),
    Text(String),
}

fn deserialize_key<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<CipherKey, D::Error> {
    let words = <[KeyWord; 4]>::deserialize(deserializer)?;
    let mut key = [0u32; 4];
    for (slot, word) in key.iter_mut().zip(words) {
        *slot = match word {
            KeyWord::Number(n) => n,
            KeyWord::Text(s) => {
                let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(&s);
                u32::from_str_radix(digits, 16).map_err(|e| {
                    serde::de::Error::custom(format!("invalid key word '{s}': {e}"))
                })?
            }
        };
    }
    Ok(key)
}
