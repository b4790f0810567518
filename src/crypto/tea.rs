use byteorder::{ByteOrder, LittleEndian};

use super::CipherKey;
use crate::block::BLOCK_SIZE;

/// Golden-ratio round constant.
pub const DELTA: u32 = 0x9E37_79B9;

#[inline(always)]
fn word(data: &[u8], i: usize) -> u32 {
    LittleEndian::read_u32(&data[i * 4..i * 4 + 4])
}

#[inline(always)]
fn set_word(data: &mut [u8], i: usize, value: u32) {
    LittleEndian::write_u32(&mut data[i * 4..i * 4 + 4], value);
}

/// Corrected Block TEA mixing function.
#[inline(always)]
fn mix(sum: u32, y: u32, z: u32, k: u32) -> u32 {
    ((sum ^ y).wrapping_add(z ^ k)) ^ (((y << 2) ^ (z >> 5)).wrapping_add((y >> 3) ^ (z << 4)))
}

/// Remove the archive layer from one block in place.
///
/// This is a single decrypt pass walking forward through the words with the
/// round sum pinned at [`DELTA`]. Trailing bytes that do not fill a word are
/// left untouched, and spans shorter than two words are not modified.
pub fn decrypt_archive_block(data: &mut [u8], key: &CipherKey) {
    let n = data.len() / 4;
    if n < 2 {
        return;
    }

    let mut prev = word(data, n - 1);
    for i in 0..n - 1 {
        let next = word(data, i + 1);
        let value = word(data, i).wrapping_sub(mix(DELTA, prev, next, key[(i ^ 0xFE) & 3]));
        set_word(data, i, value);
        prev = value;
    }

    let last = n - 1;
    let next = word(data, 0);
    let value = word(data, last).wrapping_sub(mix(DELTA, prev, next, key[(last ^ 0xFE) & 3]));
    set_word(data, last, value);
}

/// Remove the archive layer from at most `max_blocks` consecutive
/// [`BLOCK_SIZE`] blocks of `data`, each block independently. A short final
/// block is decrypted over its own length.
///
/// Returns the number of blocks processed.
pub fn decrypt_archive_blocks(data: &mut [u8], key: &CipherKey, max_blocks: usize) -> usize {
    let mut processed = 0;
    for block in data.chunks_mut(BLOCK_SIZE).take(max_blocks) {
        decrypt_archive_block(block, key);
        processed += 1;
    }
    processed
}

/// Remove the table-of-contents layer in place: the standard Corrected Block
/// TEA decrypt with `6 + 52 / n` rounds.
pub fn decrypt_toc(data: &mut [u8], key: &CipherKey) {
    let n = data.len() / 4;
    if n < 2 {
        return;
    }

    let rounds = 6 + 52 / n;
    let mut sum = DELTA.wrapping_mul(rounds as u32);
    let mut y = word(data, 0);

    for _ in 0..rounds {
        let e = ((sum >> 2) & 3) as usize;
        for p in (1..n).rev() {
            let z = word(data, p - 1);
            y = word(data, p).wrapping_sub(mix(sum, y, z, key[(p & 3) ^ e]));
            set_word(data, p, y);
        }
        let z = word(data, n - 1);
        y = word(data, 0).wrapping_sub(mix(sum, y, z, key[e]));
        set_word(data, 0, y);
        sum = sum.wrapping_sub(DELTA);
    }
}

/// Inverse of [`decrypt_archive_block`], for building fixtures.
#[cfg(test)]
pub(crate) fn encrypt_archive_block(data: &mut [u8], key: &CipherKey) {
    let n = data.len() / 4;
    if n < 2 {
        return;
    }

    let plain: Vec<u32> = (0..n).map(|i| word(data, i)).collect();
    let last = n - 1;
    let c_last = plain[last].wrapping_add(mix(DELTA, plain[last - 1], plain[0], key[(last ^ 0xFE) & 3]));
    set_word(data, last, c_last);
    for i in (0..last).rev() {
        let prev = if i == 0 { c_last } else { plain[i - 1] };
        let next = word(data, i + 1);
        set_word(data, i, plain[i].wrapping_add(mix(DELTA, prev, next, key[(i ^ 0xFE) & 3])));
    }
}
