//! The three obfuscation layers of a BBFS container.
//!
//! Decryption order when reading:
//!
//! 1. **Archive layer**: one abbreviated Corrected Block TEA round over every
//!    0x8000-byte block of the raw file, keyed by the profile's archive key.
//! 2. **TOC layer**: the full multi-round Corrected Block TEA decrypt over
//!    bytes `[20, toc_length)` of the header region, keyed by the TOC key.
//! 3. **File layer**: an RC4-style stream cipher keyed by the lowercased
//!    file name, applied to compressed payloads only.
//!
//! All word access goes through explicit little-endian reads and writes on
//! byte slices; nothing here reinterprets memory.

mod file_key;
mod tea;

pub use file_key::{FileKey, MASK_LEN};
pub use tea::{decrypt_archive_block, decrypt_archive_blocks, decrypt_toc, DELTA};
#[cfg(test)]
pub(crate) use tea::encrypt_archive_block;

/// A 128-bit block-cipher key as four little-endian words.
pub type CipherKey = [u32; 4];
